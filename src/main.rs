use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};

use cricket_fantasy::config::Config;
use cricket_fantasy::error::IngestError;
use cricket_fantasy::fake_provider::FakeProvider;
use cricket_fantasy::jobs::{Action, RunReport, run_action};
use cricket_fantasy::provider::{SportmonksProvider, StatsProvider};
use cricket_fantasy::store;

struct Args {
    action: Action,
    db_path: Option<PathBuf>,
    offline: bool,
    watch: bool,
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args();
    let mut cfg = if args.offline {
        Config::offline_from_env()
    } else {
        Config::from_env()?
    };
    if let Some(path) = args.db_path.clone() {
        cfg.db_path = path;
    }

    let provider: Box<dyn StatsProvider> = if args.offline {
        info!("offline mode: using the built-in demo season");
        Box::new(FakeProvider::demo(Utc::now()))
    } else {
        Box::new(SportmonksProvider::new(&cfg)?)
    };

    let mut conn = store::open_db(&cfg.db_path)
        .with_context(|| format!("open database {}", cfg.db_path.display()))?;

    loop {
        match run_action(&mut conn, provider.as_ref(), &cfg, args.action) {
            Ok(report) => print_report(&report, &cfg, args.json)?,
            Err(IngestError::LeaseHeld { job, holder }) if args.watch => {
                warn!("{job} still held by {holder}; skipping this tick");
            }
            Err(err) if args.watch => warn!("run failed: {err}"),
            Err(err) => return Err(err.into()),
        }
        if !args.watch {
            break;
        }
        thread::sleep(cfg.poll_interval);
    }
    Ok(())
}

fn print_report(report: &RunReport, cfg: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }
    println!("DB: {}", cfg.db_path.display());
    println!("{}", report.summary_line());
    let errors = report.errors();
    if !errors.is_empty() {
        println!("errors: {}", errors.len());
        for err in errors.iter().take(6) {
            println!(" - {err}");
        }
    }
    Ok(())
}

fn parse_args() -> Args {
    let raw = std::env::args().skip(1).collect::<Vec<_>>();
    let mut args = Args {
        action: Action::CheckAndUpdate,
        db_path: None,
        offline: false,
        watch: false,
        json: false,
    };
    let mut action = None;
    let mut idx = 0;
    while idx < raw.len() {
        let arg = raw[idx].as_str();
        match arg {
            "--offline" => args.offline = true,
            "--watch" => args.watch = true,
            "--json" => args.json = true,
            "--db" => {
                if let Some(next) = raw.get(idx + 1).filter(|s| !s.trim().is_empty()) {
                    args.db_path = Some(PathBuf::from(next));
                    idx += 1;
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--db=") {
                    let trimmed = path.trim();
                    if !trimmed.is_empty() {
                        args.db_path = Some(PathBuf::from(trimmed));
                    }
                } else if !arg.starts_with("--") && action.is_none() {
                    action = Some(arg.to_string());
                }
            }
        }
        idx += 1;
    }
    args.action = Action::parse(action.as_deref());
    args
}

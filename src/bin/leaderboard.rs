use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use cricket_fantasy::config::Config;
use cricket_fantasy::leaderboard::{
    filter_by_group, import_league_file, league_leaderboard, leaderboard_groups,
};
use cricket_fantasy::store;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cfg = Config::offline_from_env();
    let db_path = arg_value("--db").map(PathBuf::from).unwrap_or(cfg.db_path);
    let league_id = match arg_value("--league-id") {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| anyhow!("invalid --league-id {raw}"))?,
        ),
        None => None,
    };
    let group = arg_value("--group").unwrap_or_else(|| "All".to_string());

    let mut conn = store::open_db(&db_path)?;
    if let Some(path) = arg_value("--import") {
        let raw = fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
        let file = import_league_file(&mut conn, &raw)?;
        println!(
            "Imported {} leagues, {} teams",
            file.leagues.len(),
            file.teams.len()
        );
    }

    let entries = league_leaderboard(&conn, league_id)?;
    if entries.is_empty() {
        println!("No fantasy teams found");
        return Ok(());
    }

    println!("Groups: {}", leaderboard_groups(&entries).join(", "));
    println!("{:>4}  {:<32} {:>8}", "Rank", "Team", "Points");
    for entry in filter_by_group(&entries, &group) {
        println!(
            "{:>4}  {:<32} {:>8}",
            entry.rank, entry.team_name, entry.total_points
        );
    }
    Ok(())
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

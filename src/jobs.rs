//! Job runner plumbing: action parsing, single-flight lease and the
//! `sync_runs` log entry around each action.

use std::process;

use chrono::Utc;
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::Config;
use crate::error::{IngestError, IngestResult};
use crate::lifecycle::{
    LifecycleSummary, RescoreSummary, SyncSummary, check_and_update, fetch_initial_data,
    rescore_all,
};
use crate::provider::StatsProvider;
use crate::store::{self, LeaseOutcome};

pub const JOB_NAME: &str = "cricket-sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    FetchInitialData,
    CheckAndUpdate,
    Rescore,
}

impl Action {
    /// Anything unrecognised (or nothing at all) runs the lifecycle scan.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("fetch-initial-data" | "fetch_initial_data" | "initial") => {
                Action::FetchInitialData
            }
            Some("rescore") => Action::Rescore,
            _ => Action::CheckAndUpdate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::FetchInitialData => "fetch-initial-data",
            Action::CheckAndUpdate => "check-and-update",
            Action::Rescore => "rescore",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum RunReport {
    FetchInitialData(SyncSummary),
    CheckAndUpdate(LifecycleSummary),
    Rescore(RescoreSummary),
}

impl RunReport {
    pub fn errors(&self) -> &[String] {
        match self {
            RunReport::FetchInitialData(s) => &s.errors,
            RunReport::CheckAndUpdate(s) => &s.errors,
            RunReport::Rescore(_) => &[],
        }
    }

    pub fn summary_line(&self) -> String {
        match self {
            RunReport::FetchInitialData(s) => format!(
                "fixtures {}/{} saved | players {}/{} saved | teams skipped {} | errors {}",
                s.fixtures_saved,
                s.fixtures_fetched,
                s.players_saved,
                s.players_fetched,
                s.teams_skipped,
                s.errors.len()
            ),
            RunReport::CheckAndUpdate(s) => format!(
                "fixtures {} | scheduled {} | live updated {} | backfilled {} | complete {} | fetch failures {} | write failures {}",
                s.total_fixtures,
                s.scheduled,
                s.live_updated,
                s.backfilled,
                s.already_complete,
                s.fetch_failures,
                s.write_failures
            ),
            RunReport::Rescore(s) => format!(
                "fixtures {} | scores written {} | write failures {}",
                s.fixtures, s.scores_written, s.write_failures
            ),
        }
    }
}

/// Identifies this process in the lease table.
pub fn lease_holder() -> String {
    format!("{}-{}", process::id(), Utc::now().timestamp_millis())
}

/// Runs `work` while holding the job lease. The lease is released whether
/// `work` succeeds or not.
pub fn run_with_lease<T>(
    conn: &mut Connection,
    cfg: &Config,
    holder: &str,
    work: impl FnOnce(&mut Connection) -> IngestResult<T>,
) -> IngestResult<T> {
    let ttl = cfg.job_lease.as_secs() as i64;
    match store::try_acquire_lease(conn, JOB_NAME, holder, Utc::now(), ttl)? {
        LeaseOutcome::Acquired => {}
        LeaseOutcome::Held { holder: other } => {
            return Err(IngestError::LeaseHeld {
                job: JOB_NAME.to_string(),
                holder: other,
            });
        }
    }

    let result = work(conn);
    if let Err(err) = store::release_lease(conn, JOB_NAME, holder) {
        warn!("failed to release lease {JOB_NAME}: {err}");
    }
    result
}

/// One full invocation: lease, run log entry, action.
pub fn run_action(
    conn: &mut Connection,
    provider: &dyn StatsProvider,
    cfg: &Config,
    action: Action,
) -> IngestResult<RunReport> {
    let holder = lease_holder();
    run_with_lease(conn, cfg, &holder, |conn| {
        let run_id = store::begin_sync_run(conn, action.as_str())?;
        info!("run {run_id}: {}", action.as_str());

        let result = match action {
            Action::FetchInitialData => {
                fetch_initial_data(conn, provider, cfg).map(RunReport::FetchInitialData)
            }
            Action::CheckAndUpdate => {
                check_and_update(conn, provider, cfg, Utc::now()).map(RunReport::CheckAndUpdate)
            }
            Action::Rescore => rescore_all(conn).map(RunReport::Rescore),
        };

        let (summary_json, errors) = match &result {
            Ok(report) => (
                serde_json::to_string(report).unwrap_or_default(),
                report.errors().to_vec(),
            ),
            Err(err) => (String::new(), vec![err.to_string()]),
        };
        if let Err(err) = store::finish_sync_run(conn, run_id, &summary_json, &errors) {
            warn!("run {run_id}: failed to record run: {err}");
        }
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unknown_action_runs_the_scan() {
        assert_eq!(Action::parse(None), Action::CheckAndUpdate);
        assert_eq!(Action::parse(Some("bogus")), Action::CheckAndUpdate);
        assert_eq!(
            Action::parse(Some("fetch-initial-data")),
            Action::FetchInitialData
        );
        assert_eq!(Action::parse(Some(" Rescore ")), Action::Rescore);
    }

    #[test]
    fn held_lease_refuses_second_run() {
        let mut conn = store::open_in_memory().unwrap();
        let mut cfg = Config::with_token("t");
        cfg.job_lease = Duration::from_secs(600);

        store::try_acquire_lease(&conn, JOB_NAME, "other", Utc::now(), 600).unwrap();
        let err = run_with_lease(&mut conn, &cfg, "me", |_| Ok(())).unwrap_err();
        assert!(matches!(err, IngestError::LeaseHeld { ref holder, .. } if holder == "other"));
    }

    #[test]
    fn lease_is_released_after_failure() {
        let mut conn = store::open_in_memory().unwrap();
        let cfg = Config::with_token("t");

        let res: IngestResult<()> = run_with_lease(&mut conn, &cfg, "me", |_| {
            Err(IngestError::Configuration("boom".to_string()))
        });
        assert!(res.is_err());
        assert_eq!(
            store::try_acquire_lease(&conn, JOB_NAME, "next", Utc::now(), 60).unwrap(),
            LeaseOutcome::Acquired
        );
    }
}

//! Per-fixture lifecycle: decide whether a stored fixture needs fetching,
//! pull its performance data, write it and rescore.
//!
//! Fetching for the selected fixtures runs on a bounded rayon pool. Writes
//! and the score recomputation that reads them back happen afterwards on the
//! single connection, one transaction per fixture.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use rusqlite::Connection;
use serde::Serialize;

use crate::config::Config;
use crate::error::{IngestResult, ProviderError};
use crate::fielding::{attribute_fielding, fielding_rows, parse_ball_events};
use crate::model::{
    BattingPerformance, BowlingPerformance, FieldingPerformance, FieldingTally, Fixture,
    FixtureId, PlayerId,
};
use crate::normalize::{normalize_batting, normalize_bowling};
use crate::provider::{IncludeKind, StatsProvider};
use crate::scoring::score_fixture;
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureState {
    Scheduled,
    Live,
    CompletedMissingData,
    CompletedWithData,
}

impl FixtureState {
    pub fn needs_fetch(self) -> bool {
        matches!(self, FixtureState::Live | FixtureState::CompletedMissingData)
    }
}

/// Pure function of start time, wall clock and whether batting rows exist.
/// The live window is inclusive at both ends.
pub fn classify_fixture(
    starting_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: ChronoDuration,
    has_batting_data: bool,
) -> FixtureState {
    if now < starting_at {
        return FixtureState::Scheduled;
    }
    if now <= starting_at + window {
        return FixtureState::Live;
    }
    if has_batting_data {
        FixtureState::CompletedWithData
    } else {
        FixtureState::CompletedMissingData
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleSummary {
    pub total_fixtures: usize,
    pub scheduled: usize,
    pub live_updated: usize,
    pub backfilled: usize,
    pub already_complete: usize,
    pub fetch_failures: usize,
    pub write_failures: usize,
    pub errors: Vec<String>,
}

/// Everything the provider told us about one fixture, normalised.
#[derive(Debug, Clone, Default)]
pub struct FixtureData {
    pub fixture_id: FixtureId,
    pub batting: Vec<BattingPerformance>,
    pub bowling: Vec<BowlingPerformance>,
    pub fielding: Vec<FieldingPerformance>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub rows_written: usize,
    pub scores_written: usize,
    pub failures: usize,
}

pub fn fetch_fixture_data(
    provider: &dyn StatsProvider,
    fixture_id: FixtureId,
) -> Result<FixtureData, ProviderError> {
    let batting = provider.fetch_fixture_include(fixture_id, IncludeKind::Batting)?;
    let bowling = provider.fetch_fixture_include(fixture_id, IncludeKind::Bowling)?;
    let balls = provider.fetch_fixture_include(fixture_id, IncludeKind::Balls)?;

    let tallies = attribute_fielding(&parse_ball_events(&balls));
    Ok(FixtureData {
        fixture_id,
        batting: normalize_batting(fixture_id, &batting),
        bowling: normalize_bowling(fixture_id, &bowling),
        fielding: fielding_rows(fixture_id, &tallies),
    })
}

/// Writes the fixture's rows and rescores it inside one transaction. A row
/// that fails to write is logged and counted; the rest still land.
///
/// Players with a stored fielding row who no longer earn any credit get
/// their row zeroed, so stored fielding always matches the latest events.
pub fn persist_fixture_data(
    conn: &mut Connection,
    data: &FixtureData,
) -> rusqlite::Result<WriteStats> {
    let tx = conn.transaction()?;
    let mut stats = WriteStats::default();

    let credited: BTreeSet<PlayerId> = data.fielding.iter().map(|f| f.player_id).collect();
    let cleared: Vec<FieldingPerformance> = store::load_fielding(&tx, data.fixture_id)?
        .into_iter()
        .filter(|row| !credited.contains(&row.player_id) && row.tally != FieldingTally::default())
        .map(|row| FieldingPerformance {
            tally: FieldingTally::default(),
            ..row
        })
        .collect();

    let mut tally = |what: &str, player_id: u64, res: rusqlite::Result<()>| match res {
        Ok(()) => stats.rows_written += 1,
        Err(err) => {
            warn!(
                "fixture {}: {what} upsert failed for player {player_id}: {err}",
                data.fixture_id
            );
            stats.failures += 1;
        }
    };
    for row in &data.batting {
        tally("batting", row.player_id, store::upsert_batting(&tx, row));
    }
    for row in &data.bowling {
        tally("bowling", row.player_id, store::upsert_bowling(&tx, row));
    }
    for row in data.fielding.iter().chain(&cleared) {
        tally("fielding", row.player_id, store::upsert_fielding(&tx, row));
    }

    let scored = recompute_fixture_scores(&tx, data.fixture_id)?;
    stats.scores_written = scored.scores_written;
    stats.failures += scored.failures;

    tx.commit()?;
    Ok(stats)
}

/// Reads the stored rows for a fixture back and overwrites its scores.
/// Running it twice on unchanged rows writes identical values.
pub fn recompute_fixture_scores(
    conn: &Connection,
    fixture_id: FixtureId,
) -> rusqlite::Result<WriteStats> {
    let batting = store::load_batting(conn, fixture_id)?;
    let bowling = store::load_bowling(conn, fixture_id)?;
    let fielding = store::load_fielding(conn, fixture_id)?;

    let mut stats = WriteStats::default();
    for score in score_fixture(fixture_id, &batting, &bowling, &fielding) {
        match store::upsert_score(conn, &score) {
            Ok(()) => stats.scores_written += 1,
            Err(err) => {
                warn!(
                    "fixture {fixture_id}: score upsert failed for player {}: {err}",
                    score.player_id
                );
                stats.failures += 1;
            }
        }
    }
    Ok(stats)
}

/// The lifecycle scan over every stored fixture.
pub fn check_and_update(
    conn: &mut Connection,
    provider: &dyn StatsProvider,
    cfg: &Config,
    now: DateTime<Utc>,
) -> IngestResult<LifecycleSummary> {
    let fixtures = store::load_fixtures(conn)?;
    let window = ChronoDuration::from_std(cfg.match_window)
        .unwrap_or_else(|_| ChronoDuration::hours(4));

    let mut summary = LifecycleSummary {
        total_fixtures: fixtures.len(),
        ..LifecycleSummary::default()
    };
    if fixtures.is_empty() {
        info!("no fixtures stored; run fetch-initial-data first");
        return Ok(summary);
    }

    let mut targets: Vec<(Fixture, FixtureState)> = Vec::new();
    for fixture in fixtures {
        let has_data = match store::has_batting_data(conn, fixture.id) {
            Ok(v) => v,
            Err(err) => {
                warn!("fixture {}: batting lookup failed: {err}", fixture.id);
                summary
                    .errors
                    .push(format!("fixture {}: batting lookup failed: {err}", fixture.id));
                continue;
            }
        };
        let state = classify_fixture(fixture.starting_at, now, window, has_data);
        debug!("fixture {} is {:?}", fixture.id, state);
        if state.needs_fetch() {
            targets.push((fixture, state));
        } else if state == FixtureState::Scheduled {
            summary.scheduled += 1;
        } else {
            summary.already_complete += 1;
        }
    }

    let fetched: Vec<(FixtureId, FixtureState, Result<FixtureData, ProviderError>)> =
        with_fetch_pool(cfg.fetch_parallelism, || {
            targets
                .par_iter()
                .map(|(fixture, state)| {
                    (fixture.id, *state, fetch_fixture_data(provider, fixture.id))
                })
                .collect()
        });

    for (fixture_id, state, result) in fetched {
        let data = match result {
            Ok(data) => data,
            Err(err) => {
                let kind = if err.is_timeout() { "timed out" } else { "failed" };
                warn!("fixture {fixture_id}: fetch {kind}: {err}");
                summary.fetch_failures += 1;
                summary
                    .errors
                    .push(format!("fixture {fixture_id}: fetch {kind}: {err}"));
                continue;
            }
        };
        match persist_fixture_data(conn, &data) {
            Ok(stats) => {
                summary.write_failures += stats.failures;
                match state {
                    FixtureState::Live => summary.live_updated += 1,
                    _ => summary.backfilled += 1,
                }
                debug!(
                    "fixture {fixture_id}: {} rows, {} scores",
                    stats.rows_written, stats.scores_written
                );
            }
            Err(err) => {
                warn!("fixture {fixture_id}: write failed: {err}");
                summary.write_failures += 1;
                summary
                    .errors
                    .push(format!("fixture {fixture_id}: write failed: {err}"));
            }
        }
    }

    info!(
        "update summary: {} with data, {} live updated, {} backfilled, {} scheduled, {} fetch failures",
        summary.already_complete,
        summary.live_updated,
        summary.backfilled,
        summary.scheduled,
        summary.fetch_failures
    );
    Ok(summary)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RescoreSummary {
    pub fixtures: usize,
    pub scores_written: usize,
    pub write_failures: usize,
}

/// Recomputes scores for every stored fixture from stored rows.
pub fn rescore_all(conn: &mut Connection) -> IngestResult<RescoreSummary> {
    let fixtures = store::load_fixtures(conn)?;
    let mut summary = RescoreSummary::default();
    for fixture in &fixtures {
        let tx = conn.transaction()?;
        let stats = recompute_fixture_scores(&tx, fixture.id)?;
        tx.commit()?;
        summary.fixtures += 1;
        summary.scores_written += stats.scores_written;
        summary.write_failures += stats.failures;
    }
    info!(
        "rescored {} fixtures ({} scores)",
        summary.fixtures, summary.scores_written
    );
    Ok(summary)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub fixtures_fetched: usize,
    pub players_fetched: usize,
    pub fixtures_saved: usize,
    pub players_saved: usize,
    pub fixture_errors: usize,
    pub player_errors: usize,
    pub teams_skipped: usize,
    pub errors: Vec<String>,
}

/// Loads the season's fixtures and every configured team's squad.
///
/// A failed fixture listing aborts the run. A failed squad only skips that
/// team. Squad calls are spaced by `cfg.squad_fetch_delay`.
pub fn fetch_initial_data(
    conn: &mut Connection,
    provider: &dyn StatsProvider,
    cfg: &Config,
) -> IngestResult<SyncSummary> {
    let mut summary = SyncSummary::default();

    let raw_fixtures = provider.fetch_fixtures(cfg.league_id, cfg.season_id)?;
    summary.fixtures_fetched = raw_fixtures.len();
    info!(
        "fetched {} fixtures for league {} season {}",
        raw_fixtures.len(),
        cfg.league_id,
        cfg.season_id
    );

    let tx = conn.transaction()?;
    for raw in &raw_fixtures {
        let Some(fixture) = raw.to_fixture() else {
            warn!("fixture {}: missing or unparseable start time", raw.id);
            summary.fixture_errors += 1;
            summary
                .errors
                .push(format!("fixture {}: missing or unparseable start time", raw.id));
            continue;
        };
        match store::upsert_fixture(&tx, &fixture) {
            Ok(()) => summary.fixtures_saved += 1,
            Err(err) => {
                warn!("fixture {}: save failed: {err}", fixture.id);
                summary.fixture_errors += 1;
                summary
                    .errors
                    .push(format!("fixture {}: save failed: {err}", fixture.id));
            }
        }
    }
    tx.commit()?;

    for (idx, team_id) in cfg.team_ids.iter().copied().enumerate() {
        if idx > 0 && !cfg.squad_fetch_delay.is_zero() {
            std::thread::sleep(cfg.squad_fetch_delay);
        }
        let squad = match provider.fetch_squad(team_id, cfg.season_id) {
            Ok(squad) => squad,
            Err(err) => {
                warn!("team {team_id}: squad fetch failed, skipping: {err}");
                summary.teams_skipped += 1;
                summary
                    .errors
                    .push(format!("team {team_id}: squad fetch failed: {err}"));
                continue;
            }
        };
        summary.players_fetched += squad.len();
        debug!("team {team_id}: {} players", squad.len());

        let tx = conn.transaction()?;
        for player in &squad {
            match store::upsert_player(&tx, player) {
                Ok(()) => summary.players_saved += 1,
                Err(err) => {
                    warn!("player {}: save failed: {err}", player.id);
                    summary.player_errors += 1;
                    summary
                        .errors
                        .push(format!("player {}: save failed: {err}", player.id));
                }
            }
        }
        tx.commit()?;
    }

    info!(
        "initial sync: {}/{} fixtures saved, {}/{} players saved, {} teams skipped",
        summary.fixtures_saved,
        summary.fixtures_fetched,
        summary.players_saved,
        summary.players_fetched,
        summary.teams_skipped
    );
    Ok(summary)
}

fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn classification_follows_the_clock() {
        let t = Utc.with_ymd_and_hms(2024, 4, 1, 14, 0, 0).unwrap();
        let w = ChronoDuration::hours(4);
        let h = ChronoDuration::hours;

        assert_eq!(classify_fixture(t, t - h(1), w, false), FixtureState::Scheduled);
        assert_eq!(classify_fixture(t, t, w, false), FixtureState::Live);
        assert_eq!(classify_fixture(t, t + h(1), w, true), FixtureState::Live);
        assert_eq!(classify_fixture(t, t + h(4), w, true), FixtureState::Live);
        assert_eq!(
            classify_fixture(t, t + h(5), w, false),
            FixtureState::CompletedMissingData
        );
        assert_eq!(
            classify_fixture(t, t + h(5), w, true),
            FixtureState::CompletedWithData
        );
    }

    #[test]
    fn only_live_and_missing_are_fetched() {
        assert!(FixtureState::Live.needs_fetch());
        assert!(FixtureState::CompletedMissingData.needs_fetch());
        assert!(!FixtureState::Scheduled.needs_fetch());
        assert!(!FixtureState::CompletedWithData.needs_fetch());
    }
}

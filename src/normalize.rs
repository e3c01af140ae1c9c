//! Canonical batting/bowling rows from provider records.
//!
//! The provider has shipped the same numbers under several names over time
//! (`score` vs `attributes.runs`, `medians` vs `maidens`, ...). Every lookup
//! tries a list of candidate paths and takes the first numeric value found;
//! anything missing becomes 0 so scoring never sees a hole.

use serde_json::Value;

use crate::model::{BattingPerformance, BowlingPerformance, FixtureId, PlayerId};
use crate::provider::{as_f64_any, as_u64_any};

/// Upper bound for any single counter or overs figure in one innings.
pub const MAX_STAT: i64 = 10_000;

const PLAYER_ID: &[&str] = &["player_id", "attributes.player_id"];

const BAT_RUNS: &[&str] = &["score", "attributes.runs", "runs"];
const BAT_BALLS: &[&str] = &["ball", "attributes.balls", "balls"];
const BAT_FOURS: &[&str] = &["four_x", "attributes.fours", "fours"];
const BAT_SIXES: &[&str] = &["six_x", "attributes.sixes", "sixes"];

const BOWL_OVERS: &[&str] = &["overs", "attributes.overs"];
const BOWL_RUNS: &[&str] = &["runs", "attributes.runs"];
const BOWL_WICKETS: &[&str] = &["wickets", "attributes.wickets"];
const BOWL_MAIDENS: &[&str] = &["medians", "attributes.maidens", "maidens"];
const BOWL_ECONOMY: &[&str] = &["rate", "attributes.economy", "economy"];

pub fn normalize_batting(fixture_id: FixtureId, records: &[Value]) -> Vec<BattingPerformance> {
    records
        .iter()
        .filter_map(|r| {
            let player_id = player_id(r)?;
            let runs_scored = pick_i64(r, BAT_RUNS);
            let balls_faced = pick_i64(r, BAT_BALLS);
            Some(BattingPerformance {
                fixture_id,
                player_id,
                runs_scored,
                balls_faced,
                boundaries: pick_i64(r, BAT_FOURS),
                sixes: pick_i64(r, BAT_SIXES),
                strike_rate: strike_rate(runs_scored, balls_faced),
            })
        })
        .collect()
}

pub fn normalize_bowling(fixture_id: FixtureId, records: &[Value]) -> Vec<BowlingPerformance> {
    records
        .iter()
        .filter_map(|r| {
            let player_id = player_id(r)?;
            let overs_bowled = pick_f64(r, BOWL_OVERS)
                .unwrap_or(0.0)
                .clamp(0.0, MAX_STAT as f64);
            let runs_conceded = pick_i64(r, BOWL_RUNS);
            let economy = pick_f64(r, BOWL_ECONOMY)
                .map(|v| v.clamp(0.0, MAX_STAT as f64))
                .unwrap_or_else(|| derived_economy(runs_conceded, overs_bowled));
            Some(BowlingPerformance {
                fixture_id,
                player_id,
                overs_bowled,
                runs_conceded,
                wickets: pick_i64(r, BOWL_WICKETS),
                maiden_overs: pick_i64(r, BOWL_MAIDENS),
                economy,
            })
        })
        .collect()
}

/// Runs per hundred balls; 0 when no balls were faced.
pub fn strike_rate(runs: i64, balls: i64) -> f64 {
    if balls > 0 {
        (runs as f64) * 100.0 / (balls as f64)
    } else {
        0.0
    }
}

/// Only used when the provider leaves economy out.
pub fn derived_economy(runs_conceded: i64, overs: f64) -> f64 {
    let balls = overs_to_balls(overs);
    if balls == 0 {
        return 0.0;
    }
    (runs_conceded as f64) * 6.0 / (balls as f64)
}

/// `3.4` overs -> 22 balls.
pub fn overs_to_balls(overs: f64) -> i64 {
    if !overs.is_finite() || overs <= 0.0 {
        return 0;
    }
    let whole = overs.trunc() as i64;
    let part = ((overs - overs.trunc()) * 10.0).round() as i64;
    whole * 6 + part.clamp(0, 5)
}

fn player_id(record: &Value) -> Option<PlayerId> {
    PLAYER_ID
        .iter()
        .find_map(|path| lookup(record, path).and_then(as_u64_any))
        .filter(|id| *id != 0)
}

fn pick_f64(record: &Value, paths: &[&str]) -> Option<f64> {
    paths
        .iter()
        .find_map(|path| lookup(record, path).and_then(as_f64_any))
        .filter(|v| v.is_finite())
}

/// Counters outside `0..=MAX_STAT` are clamped.
fn pick_i64(record: &Value, paths: &[&str]) -> i64 {
    pick_f64(record, paths)
        .map(|v| (v.round() as i64).clamp(0, MAX_STAT))
        .unwrap_or(0)
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |v, key| v.get(key))
        .filter(|v| !v.is_null())
}

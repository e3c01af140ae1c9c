//! Fielding attribution from ball-by-ball events.
//!
//! Each delivery's outcome text is matched against an ordered rule list.
//! Categories overlap ("catch out" is both a dot ball for the bowler and a
//! catch for the fielder), so every matching rule fires, in order, and each
//! produces zero or more credits. Counters are folded into a fresh map per
//! call; nothing is shared between fixtures.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{FieldingPerformance, FieldingTally, FixtureId, PlayerId};
use crate::provider::as_u64_any;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallEvent {
    /// Lower-cased, trimmed outcome description ("catch out", "no run", ...).
    pub outcome: String,
    pub bowler_id: Option<PlayerId>,
    pub catch_stump_id: Option<PlayerId>,
    pub runout_by_id: Option<PlayerId>,
}

impl BallEvent {
    pub fn new(
        outcome: &str,
        bowler_id: Option<PlayerId>,
        catch_stump_id: Option<PlayerId>,
        runout_by_id: Option<PlayerId>,
    ) -> Self {
        Self {
            outcome: outcome.trim().to_lowercase(),
            bowler_id: bowler_id.filter(|id| *id != 0),
            catch_stump_id: catch_stump_id.filter(|id| *id != 0),
            runout_by_id: runout_by_id.filter(|id| *id != 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCategory {
    BowledOrLbw,
    DotBall,
    Catch,
    Stumping,
    RunOut,
}

/// Evaluation order. New vocabulary goes in as a new variant plus a slot here.
pub const RULE_ORDER: [OutcomeCategory; 5] = [
    OutcomeCategory::BowledOrLbw,
    OutcomeCategory::DotBall,
    OutcomeCategory::Catch,
    OutcomeCategory::Stumping,
    OutcomeCategory::RunOut,
];

const BOWLED_OR_LBW: &[&str] = &["clean bowled", "lbw out"];
const DOT_BALL_EXACT: &[&str] = &["no run", "catch out", "clean bowled", "lbw out", "hit wicket"];

impl OutcomeCategory {
    pub fn matches(self, outcome: &str) -> bool {
        match self {
            OutcomeCategory::BowledOrLbw => BOWLED_OR_LBW.contains(&outcome),
            OutcomeCategory::DotBall => {
                DOT_BALL_EXACT.contains(&outcome)
                    || outcome.contains("stump out")
                    || outcome.contains("bye")
            }
            OutcomeCategory::Catch => outcome == "catch out",
            OutcomeCategory::Stumping => outcome.contains("stump out") && !outcome.contains("sub"),
            OutcomeCategory::RunOut => outcome.contains("run out") && !outcome.contains("sub"),
        }
    }

    fn credits(self, event: &BallEvent) -> Vec<(PlayerId, Credit)> {
        match self {
            OutcomeCategory::BowledOrLbw => event
                .bowler_id
                .map(|id| vec![(id, Credit::BowledLbw)])
                .unwrap_or_default(),
            OutcomeCategory::DotBall => event
                .bowler_id
                .map(|id| vec![(id, Credit::DotBall)])
                .unwrap_or_default(),
            OutcomeCategory::Catch => event
                .catch_stump_id
                .map(|id| vec![(id, Credit::Catch)])
                .unwrap_or_default(),
            OutcomeCategory::Stumping => event
                .catch_stump_id
                .map(|id| vec![(id, Credit::Stumping)])
                .unwrap_or_default(),
            OutcomeCategory::RunOut => runout_credits(event.runout_by_id, event.catch_stump_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credit {
    Catch,
    Stumping,
    DirectRunOut,
    IndirectRunOut,
    DotBall,
    BowledLbw,
}

/// A single fielder on the event is a direct run-out. Two distinct fielders
/// (thrower credited via `runout_by`, receiver via `catch_stump`) each get an
/// indirect run-out. No ids at all credits nobody.
fn runout_credits(
    runout_by: Option<PlayerId>,
    catch_stump: Option<PlayerId>,
) -> Vec<(PlayerId, Credit)> {
    match (runout_by, catch_stump) {
        (None, None) => Vec::new(),
        (Some(id), None) | (None, Some(id)) => vec![(id, Credit::DirectRunOut)],
        (Some(a), Some(b)) if a == b => vec![(a, Credit::DirectRunOut)],
        (Some(a), Some(b)) => vec![(a, Credit::IndirectRunOut), (b, Credit::IndirectRunOut)],
    }
}

pub fn classify(outcome: &str) -> Vec<OutcomeCategory> {
    RULE_ORDER
        .iter()
        .copied()
        .filter(|cat| cat.matches(outcome))
        .collect()
}

pub fn event_credits(event: &BallEvent) -> Vec<(PlayerId, Credit)> {
    classify(&event.outcome)
        .into_iter()
        .flat_map(|cat| cat.credits(event))
        .collect()
}

pub fn apply_credit(tally: FieldingTally, credit: Credit) -> FieldingTally {
    let mut next = tally;
    match credit {
        Credit::Catch => next.catches += 1,
        Credit::Stumping => next.stumpings += 1,
        Credit::DirectRunOut => next.direct_runouts += 1,
        Credit::IndirectRunOut => next.indirect_runouts += 1,
        Credit::DotBall => next.dot_balls += 1,
        Credit::BowledLbw => next.lbw_bowled_wickets += 1,
    }
    next
}

/// Counters for every player referenced by at least one credited event.
/// Players absent from the map have an all-zero tally.
pub fn attribute_fielding(events: &[BallEvent]) -> BTreeMap<PlayerId, FieldingTally> {
    events
        .iter()
        .flat_map(event_credits)
        .fold(BTreeMap::new(), |mut acc, (player_id, credit)| {
            let tally = acc.get(&player_id).copied().unwrap_or_default();
            acc.insert(player_id, apply_credit(tally, credit));
            acc
        })
}

pub fn fielding_rows(
    fixture_id: FixtureId,
    tallies: &BTreeMap<PlayerId, FieldingTally>,
) -> Vec<FieldingPerformance> {
    tallies
        .iter()
        .map(|(player_id, tally)| FieldingPerformance {
            fixture_id,
            player_id: *player_id,
            tally: *tally,
        })
        .collect()
}

/// Reads the provider's ball records. The outcome lives in `score.name`
/// (older payloads put a plain string in `score`).
pub fn parse_ball_events(records: &[Value]) -> Vec<BallEvent> {
    records
        .iter()
        .map(|ball| {
            let outcome = ball
                .get("score")
                .and_then(|s| s.get("name").and_then(|n| n.as_str()).or_else(|| s.as_str()))
                .unwrap_or("");
            BallEvent::new(
                outcome,
                ball.get("bowler_id").and_then(as_u64_any),
                ball.get("catchstump_id").and_then(as_u64_any),
                ball.get("runout_by_id").and_then(as_u64_any),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(outcome: &str, bowler: u64, actor: u64, runout: u64) -> BallEvent {
        BallEvent::new(outcome, Some(bowler), Some(actor), Some(runout))
    }

    #[test]
    fn rule_order_is_stable() {
        assert_eq!(
            classify("clean bowled"),
            vec![OutcomeCategory::BowledOrLbw, OutcomeCategory::DotBall]
        );
        assert_eq!(
            classify("stump out"),
            vec![OutcomeCategory::DotBall, OutcomeCategory::Stumping]
        );
        assert_eq!(classify("stump out (sub)"), vec![OutcomeCategory::DotBall]);
        assert!(classify("6 runs").is_empty());
    }

    #[test]
    fn outcome_text_is_normalised() {
        let e = BallEvent::new("  Catch Out ", Some(1), Some(2), None);
        assert_eq!(e.outcome, "catch out");
    }

    #[test]
    fn run_out_single_fielder_is_direct() {
        let tallies = attribute_fielding(&[ev("run out", 0, 0, 9)]);
        assert_eq!(tallies[&9].direct_runouts, 1);
        assert_eq!(tallies[&9].indirect_runouts, 0);

        let tallies = attribute_fielding(&[ev("run out", 0, 8, 0)]);
        assert_eq!(tallies[&8].direct_runouts, 1);
    }

    #[test]
    fn run_out_two_fielders_are_indirect() {
        let tallies = attribute_fielding(&[ev("run out", 1, 8, 9)]);
        assert_eq!(tallies[&8].indirect_runouts, 1);
        assert_eq!(tallies[&9].indirect_runouts, 1);
        assert_eq!(tallies[&8].direct_runouts + tallies[&9].direct_runouts, 0);
        // a run out is not a dot ball for the bowler
        assert!(!tallies.contains_key(&1));
    }

    #[test]
    fn run_out_without_ids_credits_nobody() {
        assert!(attribute_fielding(&[ev("run out", 0, 0, 0)]).is_empty());
    }

    #[test]
    fn substitute_dismissals_are_not_credited() {
        let tallies = attribute_fielding(&[ev("run out (sub)", 0, 4, 5)]);
        assert!(tallies.is_empty());
    }

    #[test]
    fn missing_ids_contribute_nothing() {
        let e = BallEvent::new("catch out", None, None, None);
        assert!(event_credits(&e).is_empty());
    }
}

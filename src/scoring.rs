use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    BattingPerformance, BowlingPerformance, FantasyScore, FieldingPerformance, FieldingTally,
    FixtureId, PlayerId,
};

/// Awarded once to any player with at least one performance row.
pub const APPEARANCE_BONUS: i64 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointsBreakdown {
    pub batting: i64,
    pub bowling: i64,
    pub fielding: i64,
    pub total: i64,
}

pub fn batting_points(b: &BattingPerformance) -> i64 {
    let mut points = b.runs_scored + b.boundaries * 4 + b.sixes * 6;
    points += milestone_bonus(b.runs_scored);

    if b.runs_scored == 0 && b.balls_faced > 0 {
        points -= 2;
    }
    if b.balls_faced >= 10 {
        points += strike_rate_adjustment(b.strike_rate);
    }
    points
}

/// Highest threshold met wins; only one bonus per innings.
pub fn milestone_bonus(runs: i64) -> i64 {
    if runs >= 100 {
        16
    } else if runs >= 75 {
        12
    } else if runs >= 50 {
        8
    } else if runs >= 25 {
        4
    } else {
        0
    }
}

pub fn strike_rate_adjustment(sr: f64) -> i64 {
    if sr > 170.0 {
        6
    } else if sr > 150.0 {
        4
    } else if sr >= 130.0 {
        2
    } else if sr <= 70.0 && sr > 60.0 {
        -2
    } else if sr <= 60.0 && sr >= 50.0 {
        -4
    } else if sr < 50.0 {
        -6
    } else {
        0
    }
}

pub fn bowling_points(b: &BowlingPerformance) -> i64 {
    let mut points = b.wickets * 25 + b.maiden_overs * 12;
    points += match b.wickets {
        3 => 4,
        4 => 8,
        w if w >= 5 => 12,
        _ => 0,
    };
    if b.overs_bowled >= 2.0 {
        points += economy_adjustment(b.economy);
    }
    points
}

/// Bands are inclusive as listed; economies falling between bands
/// (e.g. 5.995 or 8.5) earn nothing.
pub fn economy_adjustment(econ: f64) -> i64 {
    if econ < 5.0 {
        6
    } else if (5.0..=5.99).contains(&econ) {
        4
    } else if (6.0..=7.0).contains(&econ) {
        2
    } else if (10.0..=11.0).contains(&econ) {
        -2
    } else if econ > 11.0 && econ <= 12.0 {
        -4
    } else if econ > 12.0 {
        -6
    } else {
        0
    }
}

pub fn fielding_points(t: &FieldingTally) -> i64 {
    let mut points = t.catches * 8;
    if t.catches >= 3 {
        points += 4;
    }
    points
        + t.stumpings * 12
        + t.direct_runouts * 12
        + t.indirect_runouts * 6
        + t.dot_balls
        + t.lbw_bowled_wickets * 8
}

/// `None` when the player has no row in any discipline for the fixture.
pub fn score_player(
    batting: Option<&BattingPerformance>,
    bowling: Option<&BowlingPerformance>,
    fielding: Option<&FieldingTally>,
) -> Option<PointsBreakdown> {
    if batting.is_none() && bowling.is_none() && fielding.is_none() {
        return None;
    }
    let batting = batting.map(batting_points).unwrap_or(0);
    let bowling = bowling.map(bowling_points).unwrap_or(0);
    let fielding = fielding.map(fielding_points).unwrap_or(0);
    Some(PointsBreakdown {
        batting,
        bowling,
        fielding,
        total: batting + bowling + fielding + APPEARANCE_BONUS,
    })
}

/// Scores every player that appears in any of the three row sets for one
/// fixture. Output is ordered by player id.
pub fn score_fixture(
    fixture_id: FixtureId,
    batting: &[BattingPerformance],
    bowling: &[BowlingPerformance],
    fielding: &[FieldingPerformance],
) -> Vec<FantasyScore> {
    let bat: BTreeMap<PlayerId, &BattingPerformance> =
        batting.iter().map(|b| (b.player_id, b)).collect();
    let bowl: BTreeMap<PlayerId, &BowlingPerformance> =
        bowling.iter().map(|b| (b.player_id, b)).collect();
    let field: BTreeMap<PlayerId, &FieldingTally> =
        fielding.iter().map(|f| (f.player_id, &f.tally)).collect();

    let players: BTreeSet<PlayerId> = bat
        .keys()
        .chain(bowl.keys())
        .chain(field.keys())
        .copied()
        .collect();

    players
        .into_iter()
        .filter_map(|player_id| {
            let p = score_player(
                bat.get(&player_id).copied(),
                bowl.get(&player_id).copied(),
                field.get(&player_id).copied(),
            )?;
            Some(FantasyScore {
                fixture_id,
                player_id,
                batting_points: p.batting,
                bowling_points: p.bowling,
                fielding_points: p.fielding,
                total_points: p.total,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bat(runs: i64, balls: i64, fours: i64, sixes: i64) -> BattingPerformance {
        BattingPerformance {
            fixture_id: 1,
            player_id: 1,
            runs_scored: runs,
            balls_faced: balls,
            boundaries: fours,
            sixes,
            strike_rate: crate::normalize::strike_rate(runs, balls),
        }
    }

    #[test]
    fn milestones_are_exclusive() {
        assert_eq!(milestone_bonus(24), 0);
        assert_eq!(milestone_bonus(25), 4);
        assert_eq!(milestone_bonus(50), 8);
        assert_eq!(milestone_bonus(99), 12);
        assert_eq!(milestone_bonus(100), 16);
        assert_eq!(milestone_bonus(180), 16);
    }

    #[test]
    fn duck_costs_two() {
        assert_eq!(batting_points(&bat(0, 3, 0, 0)), -2);
        // not out without facing: no duck
        assert_eq!(batting_points(&bat(0, 0, 0, 0)), 0);
    }

    #[test]
    fn strike_rate_needs_ten_balls() {
        // 200 SR off 5 balls: no adjustment
        assert_eq!(batting_points(&bat(10, 5, 0, 0)), 10);
        // 40 SR off 10 balls: -6
        assert_eq!(batting_points(&bat(4, 10, 0, 0)), -2);
    }

    #[test]
    fn strike_rate_bands() {
        assert_eq!(strike_rate_adjustment(171.0), 6);
        assert_eq!(strike_rate_adjustment(170.0), 4);
        assert_eq!(strike_rate_adjustment(150.0), 2);
        assert_eq!(strike_rate_adjustment(130.0), 2);
        assert_eq!(strike_rate_adjustment(100.0), 0);
        assert_eq!(strike_rate_adjustment(70.0), -2);
        assert_eq!(strike_rate_adjustment(60.0), -4);
        assert_eq!(strike_rate_adjustment(50.0), -4);
        assert_eq!(strike_rate_adjustment(49.9), -6);
    }

    #[test]
    fn economy_bands() {
        assert_eq!(economy_adjustment(4.99), 6);
        assert_eq!(economy_adjustment(5.5), 4);
        assert_eq!(economy_adjustment(5.995), 0);
        assert_eq!(economy_adjustment(7.0), 2);
        assert_eq!(economy_adjustment(8.5), 0);
        assert_eq!(economy_adjustment(10.0), -2);
        assert_eq!(economy_adjustment(11.5), -4);
        assert_eq!(economy_adjustment(12.5), -6);
    }

    #[test]
    fn catches_bonus_at_three() {
        let t = FieldingTally {
            catches: 3,
            ..FieldingTally::default()
        };
        assert_eq!(fielding_points(&t), 28);
    }

    #[test]
    fn no_rows_no_score() {
        assert!(score_player(None, None, None).is_none());
        let p = score_player(None, None, Some(&FieldingTally::default())).unwrap();
        assert_eq!(p.total, APPEARANCE_BONUS);
    }
}

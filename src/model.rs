use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type FixtureId = u64;
pub type PlayerId = u64;
pub type TeamId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub id: FixtureId,
    pub round: Option<i64>,
    pub local_team_id: TeamId,
    pub visitor_team_id: TeamId,
    pub starting_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Option<String>,
    pub team_id: TeamId,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattingPerformance {
    pub fixture_id: FixtureId,
    pub player_id: PlayerId,
    pub runs_scored: i64,
    pub balls_faced: i64,
    pub boundaries: i64,
    pub sixes: i64,
    pub strike_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BowlingPerformance {
    pub fixture_id: FixtureId,
    pub player_id: PlayerId,
    /// Cricket notation: `3.4` is three overs and four balls.
    pub overs_bowled: f64,
    pub runs_conceded: i64,
    pub wickets: i64,
    pub maiden_overs: i64,
    pub economy: f64,
}

/// Per-player counters derived from ball-by-ball events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldingTally {
    pub catches: i64,
    pub stumpings: i64,
    pub direct_runouts: i64,
    pub indirect_runouts: i64,
    pub dot_balls: i64,
    pub lbw_bowled_wickets: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldingPerformance {
    pub fixture_id: FixtureId,
    pub player_id: PlayerId,
    pub tally: FieldingTally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FantasyScore {
    pub fixture_id: FixtureId,
    pub player_id: PlayerId,
    pub batting_points: i64,
    pub bowling_points: i64,
    pub fielding_points: i64,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FantasyTeam {
    pub id: u32,
    pub league_id: u32,
    pub name: String,
    #[serde(default)]
    pub players: Vec<PlayerId>,
    #[serde(default)]
    pub captain_id: Option<PlayerId>,
    #[serde(default)]
    pub vice_captain_id: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub team_id: u32,
    pub team_name: String,
    pub total_points: i64,
}

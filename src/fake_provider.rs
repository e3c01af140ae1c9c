//! In-memory `StatsProvider` for offline runs and tests.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::model::{FixtureId, Player, TeamId};
use crate::provider::{IncludeKind, RawFixture, RawPlayer, StatsProvider};

#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    pub fixtures: Vec<RawFixture>,
    pub squads: HashMap<TeamId, Vec<RawPlayer>>,
    pub includes: HashMap<(FixtureId, IncludeKind), Vec<Value>>,
    pub fail_fixture_list: bool,
    pub failing_teams: HashSet<TeamId>,
    pub failing_fixtures: HashSet<FixtureId>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixture(mut self, fixture: RawFixture) -> Self {
        self.fixtures.push(fixture);
        self
    }

    pub fn with_squad(mut self, team_id: TeamId, players: Vec<RawPlayer>) -> Self {
        self.squads.insert(team_id, players);
        self
    }

    pub fn with_include(mut self, fixture_id: FixtureId, kind: IncludeKind, rows: Vec<Value>) -> Self {
        self.includes.insert((fixture_id, kind), rows);
        self
    }

    pub fn failing_team(mut self, team_id: TeamId) -> Self {
        self.failing_teams.insert(team_id);
        self
    }

    pub fn failing_fixture(mut self, fixture_id: FixtureId) -> Self {
        self.failing_fixtures.insert(fixture_id);
        self
    }

    /// Two teams, three fixtures: one finished, one in progress and one
    /// scheduled, relative to `now`.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let fmt = |t: DateTime<Utc>| t.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string();
        let fixture = |id: FixtureId, round: &str, start: DateTime<Utc>| RawFixture {
            id,
            round_label: Some(round.to_string()),
            local_team_id: 2,
            visitor_team_id: 3,
            starting_at: Some(fmt(start)),
        };
        let player = |id: u64, name: &str, role: &str, team_id: TeamId| Player {
            id,
            name: name.to_string(),
            role: Some(role.to_string()),
            team_id,
            photo_url: None,
        };

        let mut fake = Self::new()
            .with_fixture(fixture(901, "1st Match", now - Duration::days(1)))
            .with_fixture(fixture(902, "2nd Match", now - Duration::hours(1)))
            .with_fixture(fixture(903, "3rd Match", now + Duration::days(2)))
            .with_squad(
                2,
                vec![
                    player(101, "Aiden Opener", "Batsman", 2),
                    player(102, "Ravi Keeper", "Wicketkeeper", 2),
                    player(103, "Sam Quick", "Bowler", 2),
                ],
            )
            .with_squad(
                3,
                vec![
                    player(201, "Tom Anchor", "Batsman", 3),
                    player(202, "Kiran Spin", "Bowler", 3),
                    player(203, "Leo Allround", "Allrounder", 3),
                ],
            );

        for fixture_id in [901, 902] {
            fake = fake
                .with_include(
                    fixture_id,
                    IncludeKind::Batting,
                    vec![
                        json!({ "player_id": 101, "score": 52, "ball": 30, "four_x": 5, "six_x": 2 }),
                        json!({ "player_id": 102, "score": 18, "ball": 15, "four_x": 2, "six_x": 0 }),
                        json!({ "player_id": 201, "score": 0, "ball": 3, "four_x": 0, "six_x": 0 }),
                        json!({ "player_id": 203, "score": 34, "ball": 20, "four_x": 3, "six_x": 1 }),
                    ],
                )
                .with_include(
                    fixture_id,
                    IncludeKind::Bowling,
                    vec![
                        json!({ "player_id": 103, "overs": 4, "runs": 18, "wickets": 3, "medians": 1, "rate": 4.5 }),
                        json!({ "player_id": 202, "overs": 4, "runs": 41, "wickets": 1, "medians": 0, "rate": 10.25 }),
                    ],
                )
                .with_include(
                    fixture_id,
                    IncludeKind::Balls,
                    vec![
                        json!({ "bowler_id": 103, "catchstump_id": 102, "score": { "name": "Catch Out" } }),
                        json!({ "bowler_id": 103, "score": { "name": "Clean Bowled" } }),
                        json!({ "bowler_id": 103, "score": { "name": "No Run" } }),
                        json!({ "bowler_id": 202, "runout_by_id": 203, "score": { "name": "Run Out" } }),
                    ],
                );
        }
        fake
    }
}

impl StatsProvider for FakeProvider {
    fn fetch_fixtures(
        &self,
        _league_id: u32,
        _season_id: u32,
    ) -> Result<Vec<RawFixture>, ProviderError> {
        if self.fail_fixture_list {
            return Err(ProviderError::Status {
                status: 503,
                body: "fixture listing unavailable".to_string(),
            });
        }
        Ok(self.fixtures.clone())
    }

    fn fetch_squad(&self, team_id: TeamId, _season_id: u32) -> Result<Vec<RawPlayer>, ProviderError> {
        if self.failing_teams.contains(&team_id) {
            return Err(ProviderError::Status {
                status: 500,
                body: format!("squad {team_id} unavailable"),
            });
        }
        Ok(self.squads.get(&team_id).cloned().unwrap_or_default())
    }

    fn fetch_fixture_include(
        &self,
        fixture_id: FixtureId,
        kind: IncludeKind,
    ) -> Result<Vec<Value>, ProviderError> {
        if self.failing_fixtures.contains(&fixture_id) {
            return Err(ProviderError::Malformed(format!(
                "fixture {fixture_id} returned garbage"
            )));
        }
        Ok(self
            .includes
            .get(&(fixture_id, kind))
            .cloned()
            .unwrap_or_default())
    }
}

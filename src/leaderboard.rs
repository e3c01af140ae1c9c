//! League standings from per-player point totals.
//!
//! Captain counts double and vice-captain one and a half. Everything is
//! summed in half-points and rounded once per team, half up.

use std::collections::HashMap;

use log::{info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::IngestResult;
use crate::model::{FantasyTeam, LeaderboardEntry, League, PlayerId};
use crate::store;

pub const ALL_GROUPS: &str = "All";

/// Multiplier for `player_id` within `team`, in half-units (2 = 1x).
fn half_multiplier(team: &FantasyTeam, player_id: PlayerId) -> i64 {
    if team.captain_id == Some(player_id) {
        4
    } else if team.vice_captain_id == Some(player_id) {
        3
    } else {
        2
    }
}

/// Team total with multipliers applied. Players without scores count as 0.
pub fn team_total(team: &FantasyTeam, player_points: &HashMap<PlayerId, i64>) -> i64 {
    for (label, id) in [("captain", team.captain_id), ("vice-captain", team.vice_captain_id)] {
        if let Some(id) = id {
            if !team.players.contains(&id) {
                warn!(
                    "team {} ({}): {label} {id} is not in the roster",
                    team.id, team.name
                );
            }
        }
    }

    let halves = team.players.iter().fold(0i64, |acc, id| {
        let points = player_points.get(id).copied().unwrap_or(0);
        acc.saturating_add(points.saturating_mul(half_multiplier(team, *id)))
    });
    halves.saturating_add(1).div_euclid(2)
}

/// Ranked entries, highest total first. Ties keep input order; rank is the
/// 1-based position.
pub fn compute_leaderboard(
    teams: &[FantasyTeam],
    player_points: &HashMap<PlayerId, i64>,
) -> Vec<LeaderboardEntry> {
    let mut totals: Vec<(&FantasyTeam, i64)> = teams
        .iter()
        .map(|team| (team, team_total(team, player_points)))
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1));

    totals
        .into_iter()
        .enumerate()
        .map(|(idx, (team, total_points))| LeaderboardEntry {
            rank: idx + 1,
            team_id: team.id,
            team_name: team.name.clone(),
            total_points,
        })
        .collect()
}

pub fn league_leaderboard(
    conn: &Connection,
    league_id: Option<u32>,
) -> rusqlite::Result<Vec<LeaderboardEntry>> {
    let teams = store::load_fantasy_teams(conn, league_id)?;
    let points = store::player_point_totals(conn)?;
    Ok(compute_leaderboard(&teams, &points))
}

/// Leagues and teams as kept in a hand-maintained JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueFile {
    #[serde(default)]
    pub leagues: Vec<League>,
    #[serde(default)]
    pub teams: Vec<FantasyTeam>,
}

/// Writes every league and team in `raw`; rosters are replaced.
pub fn import_league_file(conn: &mut Connection, raw: &str) -> IngestResult<LeagueFile> {
    let file: LeagueFile = serde_json::from_str(raw).map_err(anyhow::Error::from)?;
    for league in &file.leagues {
        store::upsert_league(conn, league)?;
    }
    for team in &file.teams {
        store::save_fantasy_team(conn, team)?;
    }
    info!(
        "imported {} leagues and {} teams",
        file.leagues.len(),
        file.teams.len()
    );
    Ok(file)
}

fn group_of(team_name: &str) -> &str {
    team_name.split_whitespace().next().unwrap_or("")
}

/// `"All"` followed by each distinct first word of a team name, in order
/// of first appearance.
pub fn leaderboard_groups(entries: &[LeaderboardEntry]) -> Vec<String> {
    let mut groups = vec![ALL_GROUPS.to_string()];
    for entry in entries {
        let group = group_of(&entry.team_name);
        if !group.is_empty() && !groups.iter().any(|g| g == group) {
            groups.push(group.to_string());
        }
    }
    groups
}

pub fn filter_by_group(entries: &[LeaderboardEntry], group: &str) -> Vec<LeaderboardEntry> {
    if group.is_empty() || group.eq_ignore_ascii_case(ALL_GROUPS) {
        return entries.to_vec();
    }
    entries
        .iter()
        .filter(|e| group_of(&e.team_name) == group)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, name: &str, players: &[u64], c: Option<u64>, vc: Option<u64>) -> FantasyTeam {
        FantasyTeam {
            id,
            league_id: 1,
            name: name.to_string(),
            players: players.to_vec(),
            captain_id: c,
            vice_captain_id: vc,
        }
    }

    fn points(pairs: &[(u64, i64)]) -> HashMap<PlayerId, i64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn captain_and_vice_multipliers() {
        let t = team(1, "Alpha", &[1, 2, 3], Some(1), Some(2));
        assert_eq!(team_total(&t, &points(&[(1, 50), (2, 40), (3, 30)])), 190);
    }

    #[test]
    fn half_points_round_up_once_per_team() {
        let t = team(1, "Alpha", &[1, 2], None, Some(1));
        // 1.5 * 7 = 10.5 -> 11
        assert_eq!(team_total(&t, &points(&[(1, 7)])), 11);
        // 1.5 * -3 = -4.5 -> -4
        assert_eq!(team_total(&t, &points(&[(1, -3)])), -4);
    }

    #[test]
    fn captain_wins_when_also_vice() {
        let t = team(1, "Alpha", &[1], Some(1), Some(1));
        assert_eq!(team_total(&t, &points(&[(1, 10)])), 20);
    }

    #[test]
    fn captain_outside_roster_is_ignored() {
        let t = team(1, "Alpha", &[2], Some(9), None);
        assert_eq!(team_total(&t, &points(&[(2, 10), (9, 100)])), 10);
    }

    #[test]
    fn huge_totals_saturate() {
        let t = team(1, "Alpha", &[1, 2], Some(1), None);
        let total = team_total(&t, &points(&[(1, i64::MAX), (2, i64::MAX)]));
        assert_eq!(total, i64::MAX / 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let teams = vec![
            team(1, "Alpha One", &[1], None, None),
            team(2, "Beta One", &[2], None, None),
            team(3, "Alpha Two", &[3], None, None),
        ];
        let board = compute_leaderboard(&teams, &points(&[(1, 10), (2, 20), (3, 10)]));
        let order: Vec<u32> = board.iter().map(|e| e.team_id).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn groups_and_filter_keep_rank() {
        let teams = vec![
            team(1, "Alpha One", &[1], None, None),
            team(2, "Beta One", &[2], None, None),
            team(3, "Alpha Two", &[3], None, None),
        ];
        let board = compute_leaderboard(&teams, &points(&[(1, 10), (2, 20), (3, 5)]));
        assert_eq!(leaderboard_groups(&board), vec!["All", "Beta", "Alpha"]);

        let alpha = filter_by_group(&board, "Alpha");
        assert_eq!(alpha.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(filter_by_group(&board, "All").len(), 3);
    }
}

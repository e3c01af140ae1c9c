use std::fs;
use std::path::PathBuf;

use cricket_fantasy::leaderboard::{
    filter_by_group, import_league_file, league_leaderboard, leaderboard_groups,
};
use cricket_fantasy::model::FantasyScore;
use cricket_fantasy::store;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn score(fixture_id: u64, player_id: u64, total: i64) -> FantasyScore {
    FantasyScore {
        fixture_id,
        player_id,
        batting_points: total,
        bowling_points: 0,
        fielding_points: 0,
        total_points: total,
    }
}

fn seeded_db() -> rusqlite::Connection {
    let mut conn = store::open_in_memory().unwrap();
    for s in [
        score(1, 57, 50),
        score(1, 60, 20),
        score(1, 70, 30),
        score(1, 81, 10),
        score(2, 57, 10),
        score(2, 71, 40),
    ] {
        store::upsert_score(&conn, &s).unwrap();
    }
    import_league_file(&mut conn, &read_fixture("league_teams.json")).unwrap();
    conn
}

#[test]
fn import_round_trips_rosters() {
    let conn = seeded_db();
    let leagues = store::load_leagues(&conn).unwrap();
    assert_eq!(leagues.len(), 1);
    assert_eq!(leagues[0].name, "Office League");

    let teams = store::load_fantasy_teams(&conn, Some(1)).unwrap();
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].players, vec![57, 60, 70]);
    assert_eq!(teams[0].captain_id, Some(57));
    assert_eq!(teams[1].vice_captain_id, None);
}

#[test]
fn league_table_applies_multipliers_across_fixtures() {
    let conn = seeded_db();
    let board = league_leaderboard(&conn, Some(1)).unwrap();
    assert_eq!(board.len(), 2);

    // 60 x 2 + 30 x 1.5 + 20
    assert_eq!(board[0].team_name, "Alpha Strikers");
    assert_eq!(board[0].total_points, 185);
    assert_eq!(board[1].total_points, 70);
}

#[test]
fn group_filter_over_all_leagues() {
    let conn = seeded_db();
    let board = league_leaderboard(&conn, None).unwrap();
    assert_eq!(leaderboard_groups(&board), vec!["All", "Alpha", "Beta"]);

    let alpha = filter_by_group(&board, "Alpha");
    let ranks: Vec<usize> = alpha.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 3]);
}

#[test]
fn reimport_replaces_roster() {
    let mut conn = seeded_db();
    import_league_file(
        &mut conn,
        r#"{ "teams": [ { "id": 1, "league_id": 1, "name": "Alpha Strikers", "players": [71] } ] }"#,
    )
    .unwrap();
    let teams = store::load_fantasy_teams(&conn, Some(1)).unwrap();
    assert_eq!(teams[0].players, vec![71]);
    assert_eq!(teams[0].captain_id, None);
}

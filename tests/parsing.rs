use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};

use cricket_fantasy::fielding::{attribute_fielding, parse_ball_events};
use cricket_fantasy::normalize::{normalize_batting, normalize_bowling};
use cricket_fantasy::provider::{
    IncludeKind, parse_fixtures_json, parse_include_json, parse_squad_json,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_fixture_listing() {
    let raw = read_fixture("sportmonks_fixtures.json");
    let rows = parse_fixtures_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 3);

    let first = rows[0].to_fixture().expect("first fixture has a start time");
    assert_eq!(first.id, 46523);
    assert_eq!(first.round, Some(48));
    assert_eq!((first.local_team_id, first.visitor_team_id), (2, 3));
    assert_eq!(
        first.starting_at,
        Utc.with_ymd_and_hms(2024, 5, 12, 14, 0, 0).unwrap()
    );

    let second = rows[1].to_fixture().expect("second fixture has a start time");
    assert_eq!(second.id, 46524);
    assert_eq!(second.round, None);
    assert_eq!(second.local_team_id, 4);

    assert!(rows[2].to_fixture().is_none());
}

#[test]
fn parses_squad() {
    let raw = read_fixture("sportmonks_squad.json");
    let players = parse_squad_json(&raw, 2).expect("squad should parse");
    assert_eq!(players.len(), 2);

    assert_eq!(players[0].name, "MS Dhoni");
    assert_eq!(players[0].role.as_deref(), Some("Wicketkeeper"));
    assert!(players[0].photo_url.is_some());
    assert_eq!(players[0].team_id, 2);

    assert_eq!(players[1].id, 60);
    assert_eq!(players[1].name, "Ravindra Jadeja");
    assert_eq!(players[1].photo_url, None);
}

#[test]
fn batting_falls_back_to_included() {
    let raw = read_fixture("fixture_batting_included.json");
    let records = parse_include_json(&raw, IncludeKind::Batting).expect("payload should parse");
    assert_eq!(records.len(), 2);

    let rows = normalize_batting(46523, &records);
    assert_eq!(rows[0].player_id, 57);
    assert_eq!(rows[0].runs_scored, 52);
    assert_eq!(rows[1].player_id, 60);
    assert_eq!(rows[1].balls_faced, 2);
}

#[test]
fn bowling_prefers_primary_shape() {
    let raw = read_fixture("fixture_bowling.json");
    let records = parse_include_json(&raw, IncludeKind::Bowling).expect("payload should parse");
    let rows = normalize_bowling(46523, &records);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].player_id, 70);
    assert_eq!(rows[0].economy, 4.5);
    assert!((rows[1].economy - 9.0).abs() < 1e-9);
}

#[test]
fn attributes_ball_by_ball_fixture() {
    let raw = read_fixture("fixture_balls.json");
    let records = parse_include_json(&raw, IncludeKind::Balls).expect("payload should parse");
    assert_eq!(records.len(), 9);

    let tallies = attribute_fielding(&parse_ball_events(&records));

    let bowler = tallies[&70];
    assert_eq!(bowler.dot_balls, 3);
    assert_eq!(bowler.lbw_bowled_wickets, 1);

    assert_eq!(tallies[&71].dot_balls, 2);
    assert_eq!(tallies[&81].catches, 1);
    assert_eq!(tallies[&81].indirect_runouts, 1);
    assert_eq!(tallies[&83].indirect_runouts, 1);
    assert_eq!(tallies[&82].stumpings, 1);
    assert_eq!(tallies[&84].direct_runouts, 1);
    assert!(!tallies.contains_key(&85));
}

#[test]
fn empty_body_yields_no_records() {
    assert!(parse_include_json("", IncludeKind::Balls).unwrap().is_empty());
    assert!(parse_include_json("{\"data\":{}}", IncludeKind::Balls).unwrap().is_empty());
    assert!(parse_fixtures_json("{not json").is_err());
}

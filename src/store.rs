use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{
    BattingPerformance, BowlingPerformance, FantasyScore, FantasyTeam, FieldingPerformance,
    FieldingTally, Fixture, FixtureId, League, Player, PlayerId,
};
use crate::provider::parse_start_time;

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .context("enable wal")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS fixtures (
            id INTEGER PRIMARY KEY,
            round INTEGER NULL,
            local_team_id INTEGER NOT NULL,
            visitor_team_id INTEGER NOT NULL,
            starting_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NULL,
            team_id INTEGER NOT NULL,
            photo_url TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);

        CREATE TABLE IF NOT EXISTS batting_performances (
            fixture_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            runs_scored INTEGER NOT NULL,
            balls_faced INTEGER NOT NULL,
            boundaries INTEGER NOT NULL,
            sixes INTEGER NOT NULL,
            strike_rate REAL NOT NULL,
            PRIMARY KEY (fixture_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS bowling_performances (
            fixture_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            overs_bowled REAL NOT NULL,
            runs_conceded INTEGER NOT NULL,
            wickets INTEGER NOT NULL,
            maiden_overs INTEGER NOT NULL,
            economy REAL NOT NULL,
            PRIMARY KEY (fixture_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS fielding_performances (
            fixture_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            catches INTEGER NOT NULL,
            stumpings INTEGER NOT NULL,
            direct_runouts INTEGER NOT NULL,
            indirect_runouts INTEGER NOT NULL,
            dot_balls INTEGER NOT NULL,
            lbw_bowled_wickets INTEGER NOT NULL,
            PRIMARY KEY (fixture_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS fantasy_scores (
            fixture_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            batting_points INTEGER NOT NULL,
            bowling_points INTEGER NOT NULL,
            fielding_points INTEGER NOT NULL,
            total_points INTEGER NOT NULL,
            PRIMARY KEY (fixture_id, player_id)
        );
        CREATE INDEX IF NOT EXISTS idx_scores_player ON fantasy_scores(player_id);

        CREATE TABLE IF NOT EXISTS leagues (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fantasy_teams (
            id INTEGER PRIMARY KEY,
            league_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            captain_id INTEGER NULL,
            vice_captain_id INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_fantasy_teams_league ON fantasy_teams(league_id);

        CREATE TABLE IF NOT EXISTS fantasy_team_players (
            team_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            PRIMARY KEY (team_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS job_leases (
            job TEXT PRIMARY KEY,
            holder TEXT NOT NULL,
            acquired_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sync_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            action TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            summary_json TEXT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn upsert_fixture(conn: &Connection, f: &Fixture) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO fixtures (id, round, local_team_id, visitor_team_id, starting_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            round = excluded.round,
            local_team_id = excluded.local_team_id,
            visitor_team_id = excluded.visitor_team_id,
            starting_at = excluded.starting_at,
            updated_at = excluded.updated_at
        WHERE fixtures.round IS NOT excluded.round
            OR fixtures.local_team_id IS NOT excluded.local_team_id
            OR fixtures.visitor_team_id IS NOT excluded.visitor_team_id
            OR fixtures.starting_at IS NOT excluded.starting_at
        "#,
        params![
            f.id as i64,
            f.round,
            f.local_team_id as i64,
            f.visitor_team_id as i64,
            f.starting_at.to_rfc3339(),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn upsert_player(conn: &Connection, p: &Player) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO players (id, name, role, team_id, photo_url)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            role = excluded.role,
            team_id = excluded.team_id,
            photo_url = excluded.photo_url
        "#,
        params![p.id as i64, p.name, p.role, p.team_id as i64, p.photo_url],
    )?;
    Ok(())
}

pub fn upsert_batting(conn: &Connection, b: &BattingPerformance) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO batting_performances
            (fixture_id, player_id, runs_scored, balls_faced, boundaries, sixes, strike_rate)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(fixture_id, player_id) DO UPDATE SET
            runs_scored = excluded.runs_scored,
            balls_faced = excluded.balls_faced,
            boundaries = excluded.boundaries,
            sixes = excluded.sixes,
            strike_rate = excluded.strike_rate
        "#,
        params![
            b.fixture_id as i64,
            b.player_id as i64,
            b.runs_scored,
            b.balls_faced,
            b.boundaries,
            b.sixes,
            b.strike_rate,
        ],
    )?;
    Ok(())
}

pub fn upsert_bowling(conn: &Connection, b: &BowlingPerformance) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO bowling_performances
            (fixture_id, player_id, overs_bowled, runs_conceded, wickets, maiden_overs, economy)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(fixture_id, player_id) DO UPDATE SET
            overs_bowled = excluded.overs_bowled,
            runs_conceded = excluded.runs_conceded,
            wickets = excluded.wickets,
            maiden_overs = excluded.maiden_overs,
            economy = excluded.economy
        "#,
        params![
            b.fixture_id as i64,
            b.player_id as i64,
            b.overs_bowled,
            b.runs_conceded,
            b.wickets,
            b.maiden_overs,
            b.economy,
        ],
    )?;
    Ok(())
}

pub fn upsert_fielding(conn: &Connection, f: &FieldingPerformance) -> rusqlite::Result<()> {
    let t = &f.tally;
    conn.execute(
        r#"
        INSERT INTO fielding_performances
            (fixture_id, player_id, catches, stumpings, direct_runouts, indirect_runouts,
             dot_balls, lbw_bowled_wickets)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(fixture_id, player_id) DO UPDATE SET
            catches = excluded.catches,
            stumpings = excluded.stumpings,
            direct_runouts = excluded.direct_runouts,
            indirect_runouts = excluded.indirect_runouts,
            dot_balls = excluded.dot_balls,
            lbw_bowled_wickets = excluded.lbw_bowled_wickets
        "#,
        params![
            f.fixture_id as i64,
            f.player_id as i64,
            t.catches,
            t.stumpings,
            t.direct_runouts,
            t.indirect_runouts,
            t.dot_balls,
            t.lbw_bowled_wickets,
        ],
    )?;
    Ok(())
}

pub fn upsert_score(conn: &Connection, s: &FantasyScore) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO fantasy_scores
            (fixture_id, player_id, batting_points, bowling_points, fielding_points, total_points)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(fixture_id, player_id) DO UPDATE SET
            batting_points = excluded.batting_points,
            bowling_points = excluded.bowling_points,
            fielding_points = excluded.fielding_points,
            total_points = excluded.total_points
        "#,
        params![
            s.fixture_id as i64,
            s.player_id as i64,
            s.batting_points,
            s.bowling_points,
            s.fielding_points,
            s.total_points,
        ],
    )?;
    Ok(())
}

/// Fixtures with an unparseable stored start time are skipped.
pub fn load_fixtures(conn: &Connection) -> rusqlite::Result<Vec<Fixture>> {
    let mut stmt = conn.prepare(
        "SELECT id, round, local_team_id, visitor_team_id, starting_at
         FROM fixtures ORDER BY starting_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)? as u64,
            row.get::<_, Option<i64>>(1)?,
            row.get::<_, i64>(2)? as u64,
            row.get::<_, i64>(3)? as u64,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, round, local_team_id, visitor_team_id, starting_at) = row?;
        let Some(starting_at) = parse_start_time(&starting_at) else {
            log::warn!("fixture {id}: unreadable start time {starting_at:?}");
            continue;
        };
        out.push(Fixture {
            id,
            round,
            local_team_id,
            visitor_team_id,
            starting_at,
        });
    }
    Ok(out)
}

pub fn has_batting_data(conn: &Connection, fixture_id: FixtureId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM batting_performances WHERE fixture_id = ?1)",
        params![fixture_id as i64],
        |row| row.get::<_, bool>(0),
    )
}

pub fn load_players(conn: &Connection) -> rusqlite::Result<Vec<Player>> {
    let mut stmt =
        conn.prepare("SELECT id, name, role, team_id, photo_url FROM players ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Player {
            id: row.get::<_, i64>(0)? as u64,
            name: row.get(1)?,
            role: row.get(2)?,
            team_id: row.get::<_, i64>(3)? as u64,
            photo_url: row.get(4)?,
        })
    })?;
    rows.collect()
}

pub fn load_batting(
    conn: &Connection,
    fixture_id: FixtureId,
) -> rusqlite::Result<Vec<BattingPerformance>> {
    let mut stmt = conn.prepare(
        "SELECT player_id, runs_scored, balls_faced, boundaries, sixes, strike_rate
         FROM batting_performances WHERE fixture_id = ?1 ORDER BY player_id",
    )?;
    let rows = stmt.query_map(params![fixture_id as i64], |row| {
        Ok(BattingPerformance {
            fixture_id,
            player_id: row.get::<_, i64>(0)? as u64,
            runs_scored: row.get(1)?,
            balls_faced: row.get(2)?,
            boundaries: row.get(3)?,
            sixes: row.get(4)?,
            strike_rate: row.get(5)?,
        })
    })?;
    rows.collect()
}

pub fn load_bowling(
    conn: &Connection,
    fixture_id: FixtureId,
) -> rusqlite::Result<Vec<BowlingPerformance>> {
    let mut stmt = conn.prepare(
        "SELECT player_id, overs_bowled, runs_conceded, wickets, maiden_overs, economy
         FROM bowling_performances WHERE fixture_id = ?1 ORDER BY player_id",
    )?;
    let rows = stmt.query_map(params![fixture_id as i64], |row| {
        Ok(BowlingPerformance {
            fixture_id,
            player_id: row.get::<_, i64>(0)? as u64,
            overs_bowled: row.get(1)?,
            runs_conceded: row.get(2)?,
            wickets: row.get(3)?,
            maiden_overs: row.get(4)?,
            economy: row.get(5)?,
        })
    })?;
    rows.collect()
}

pub fn load_fielding(
    conn: &Connection,
    fixture_id: FixtureId,
) -> rusqlite::Result<Vec<FieldingPerformance>> {
    let mut stmt = conn.prepare(
        "SELECT player_id, catches, stumpings, direct_runouts, indirect_runouts,
                dot_balls, lbw_bowled_wickets
         FROM fielding_performances WHERE fixture_id = ?1 ORDER BY player_id",
    )?;
    let rows = stmt.query_map(params![fixture_id as i64], |row| {
        Ok(FieldingPerformance {
            fixture_id,
            player_id: row.get::<_, i64>(0)? as u64,
            tally: FieldingTally {
                catches: row.get(1)?,
                stumpings: row.get(2)?,
                direct_runouts: row.get(3)?,
                indirect_runouts: row.get(4)?,
                dot_balls: row.get(5)?,
                lbw_bowled_wickets: row.get(6)?,
            },
        })
    })?;
    rows.collect()
}

pub fn load_scores(conn: &Connection, fixture_id: FixtureId) -> rusqlite::Result<Vec<FantasyScore>> {
    let mut stmt = conn.prepare(
        "SELECT player_id, batting_points, bowling_points, fielding_points, total_points
         FROM fantasy_scores WHERE fixture_id = ?1 ORDER BY player_id",
    )?;
    let rows = stmt.query_map(params![fixture_id as i64], |row| {
        Ok(FantasyScore {
            fixture_id,
            player_id: row.get::<_, i64>(0)? as u64,
            batting_points: row.get(1)?,
            bowling_points: row.get(2)?,
            fielding_points: row.get(3)?,
            total_points: row.get(4)?,
        })
    })?;
    rows.collect()
}

/// Fantasy points per player summed over every scored fixture.
pub fn player_point_totals(conn: &Connection) -> rusqlite::Result<HashMap<PlayerId, i64>> {
    let mut stmt = conn.prepare(
        "SELECT player_id, SUM(total_points) FROM fantasy_scores GROUP BY player_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)?))
    })?;
    rows.collect()
}

pub fn upsert_league(conn: &Connection, league: &League) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO leagues (id, name) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        params![league.id, league.name],
    )?;
    Ok(())
}

pub fn load_leagues(conn: &Connection) -> rusqlite::Result<Vec<League>> {
    let mut stmt = conn.prepare("SELECT id, name FROM leagues ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(League {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

/// Writes the team row and replaces its roster.
pub fn save_fantasy_team(conn: &mut Connection, team: &FantasyTeam) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        r#"
        INSERT INTO fantasy_teams (id, league_id, name, captain_id, vice_captain_id)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            league_id = excluded.league_id,
            name = excluded.name,
            captain_id = excluded.captain_id,
            vice_captain_id = excluded.vice_captain_id
        "#,
        params![
            team.id,
            team.league_id,
            team.name,
            team.captain_id.map(|id| id as i64),
            team.vice_captain_id.map(|id| id as i64),
        ],
    )?;
    tx.execute(
        "DELETE FROM fantasy_team_players WHERE team_id = ?1",
        params![team.id],
    )?;
    for player_id in &team.players {
        tx.execute(
            "INSERT OR IGNORE INTO fantasy_team_players (team_id, player_id) VALUES (?1, ?2)",
            params![team.id, *player_id as i64],
        )?;
    }
    tx.commit()
}

/// Teams ordered by id, optionally scoped to one league.
pub fn load_fantasy_teams(
    conn: &Connection,
    league_id: Option<u32>,
) -> rusqlite::Result<Vec<FantasyTeam>> {
    let mut stmt = conn.prepare(
        "SELECT id, league_id, name, captain_id, vice_captain_id
         FROM fantasy_teams
         WHERE (?1 IS NULL OR league_id = ?1)
         ORDER BY id",
    )?;
    let teams = stmt
        .query_map(params![league_id], |row| {
            Ok(FantasyTeam {
                id: row.get(0)?,
                league_id: row.get(1)?,
                name: row.get(2)?,
                players: Vec::new(),
                captain_id: row.get::<_, Option<i64>>(3)?.map(|id| id as u64),
                vice_captain_id: row.get::<_, Option<i64>>(4)?.map(|id| id as u64),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut roster_stmt = conn.prepare(
        "SELECT player_id FROM fantasy_team_players WHERE team_id = ?1 ORDER BY player_id",
    )?;
    let mut out = Vec::with_capacity(teams.len());
    for mut team in teams {
        team.players = roster_stmt
            .query_map(params![team.id], |row| Ok(row.get::<_, i64>(0)? as u64))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        out.push(team);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseOutcome {
    Acquired,
    Held { holder: String },
}

/// Takes the named lease unless another holder has an unexpired one.
pub fn try_acquire_lease(
    conn: &Connection,
    job: &str,
    holder: &str,
    now: DateTime<Utc>,
    ttl_secs: i64,
) -> rusqlite::Result<LeaseOutcome> {
    let now_secs = now.timestamp();
    let changed = conn.execute(
        r#"
        INSERT INTO job_leases (job, holder, acquired_at, expires_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(job) DO UPDATE SET
            holder = excluded.holder,
            acquired_at = excluded.acquired_at,
            expires_at = excluded.expires_at
        WHERE job_leases.expires_at <= excluded.acquired_at
        "#,
        params![job, holder, now_secs, now_secs + ttl_secs],
    )?;
    if changed > 0 {
        return Ok(LeaseOutcome::Acquired);
    }
    let holder = conn
        .query_row(
            "SELECT holder FROM job_leases WHERE job = ?1",
            params![job],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .unwrap_or_default();
    Ok(LeaseOutcome::Held { holder })
}

pub fn release_lease(conn: &Connection, job: &str, holder: &str) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM job_leases WHERE job = ?1 AND holder = ?2",
        params![job, holder],
    )?;
    Ok(())
}

pub fn begin_sync_run(conn: &Connection, action: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO sync_runs (action, started_at, finished_at, summary_json, errors_json)
         VALUES (?1, ?2, NULL, NULL, '[]')",
        params![action, Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_sync_run(
    conn: &Connection,
    run_id: i64,
    summary_json: &str,
    errors: &[String],
) -> rusqlite::Result<()> {
    let errors_json = serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE sync_runs SET finished_at = ?1, summary_json = ?2, errors_json = ?3
         WHERE run_id = ?4",
        params![Utc::now().to_rfc3339(), summary_json, errors_json, run_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn batting(runs: i64) -> BattingPerformance {
        BattingPerformance {
            fixture_id: 1,
            player_id: 10,
            runs_scored: runs,
            balls_faced: 20,
            boundaries: 2,
            sixes: 1,
            strike_rate: crate::normalize::strike_rate(runs, 20),
        }
    }

    #[test]
    fn batting_upsert_replaces_in_place() {
        let conn = open_in_memory().unwrap();
        upsert_batting(&conn, &batting(12)).unwrap();
        upsert_batting(&conn, &batting(12)).unwrap();
        upsert_batting(&conn, &batting(30)).unwrap();

        let rows = load_batting(&conn, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].runs_scored, 30);
        assert!(has_batting_data(&conn, 1).unwrap());
        assert!(!has_batting_data(&conn, 2).unwrap());
    }

    #[test]
    fn fixture_round_trips_start_time() {
        let conn = open_in_memory().unwrap();
        let f = Fixture {
            id: 42,
            round: Some(48),
            local_team_id: 2,
            visitor_team_id: 3,
            starting_at: Utc.with_ymd_and_hms(2023, 3, 31, 14, 0, 0).unwrap(),
        };
        upsert_fixture(&conn, &f).unwrap();
        upsert_fixture(&conn, &f).unwrap();
        assert_eq!(load_fixtures(&conn).unwrap(), vec![f]);
    }

    #[test]
    fn unchanged_fixture_keeps_updated_at() {
        let conn = open_in_memory().unwrap();
        let mut f = Fixture {
            id: 5,
            round: Some(2),
            local_team_id: 2,
            visitor_team_id: 3,
            starting_at: Utc.with_ymd_and_hms(2023, 3, 31, 14, 0, 0).unwrap(),
        };
        let updated_at = |conn: &Connection| -> String {
            conn.query_row("SELECT updated_at FROM fixtures WHERE id = 5", [], |row| {
                row.get(0)
            })
            .unwrap()
        };

        upsert_fixture(&conn, &f).unwrap();
        let first = updated_at(&conn);
        std::thread::sleep(std::time::Duration::from_millis(5));
        upsert_fixture(&conn, &f).unwrap();
        assert_eq!(updated_at(&conn), first);

        f.round = Some(3);
        upsert_fixture(&conn, &f).unwrap();
        assert_ne!(updated_at(&conn), first);
        assert_eq!(load_fixtures(&conn).unwrap()[0].round, Some(3));
    }

    #[test]
    fn lease_blocks_second_holder_until_expiry() {
        let conn = open_in_memory().unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            try_acquire_lease(&conn, "sync", "a", t0, 60).unwrap(),
            LeaseOutcome::Acquired
        );
        assert_eq!(
            try_acquire_lease(&conn, "sync", "b", t0, 60).unwrap(),
            LeaseOutcome::Held {
                holder: "a".to_string()
            }
        );
        let later = t0 + chrono::Duration::seconds(61);
        assert_eq!(
            try_acquire_lease(&conn, "sync", "b", later, 60).unwrap(),
            LeaseOutcome::Acquired
        );
    }

    #[test]
    fn released_lease_is_free() {
        let conn = open_in_memory().unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        try_acquire_lease(&conn, "sync", "a", t0, 600).unwrap();
        release_lease(&conn, "sync", "a").unwrap();
        assert_eq!(
            try_acquire_lease(&conn, "sync", "b", t0, 600).unwrap(),
            LeaseOutcome::Acquired
        );
    }
}

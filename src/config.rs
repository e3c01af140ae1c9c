use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::IngestError;

const DEFAULT_API_BASE: &str = "https://cricket.sportmonks.com/api/v2.0";
const DEFAULT_LEAGUE_ID: u32 = 1;
const DEFAULT_SEASON_ID: u32 = 1689;
const DEFAULT_TEAM_IDS: &[u64] = &[2, 3, 4, 5, 6, 7, 8, 9, 1979, 1976];
const CACHE_DIR: &str = "cricket_fantasy";
const DB_FILE: &str = "fantasy.sqlite";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: String,
    pub api_base: String,
    pub league_id: u32,
    pub season_id: u32,
    pub team_ids: Vec<u64>,
    pub db_path: PathBuf,
    pub squad_fetch_delay: Duration,
    pub request_timeout: Duration,
    /// Assumed length of a match; a fixture counts as live from its start
    /// until start + window.
    pub match_window: Duration,
    pub poll_interval: Duration,
    pub fetch_parallelism: usize,
    pub job_lease: Duration,
}

impl Config {
    /// Reads `.env.local` and `.env` (if present) and then the process
    /// environment. A missing API token is fatal.
    pub fn from_env() -> Result<Self, IngestError> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let api_token = opt_env("SPORTMONKS_API_TOKEN").ok_or_else(|| {
            IngestError::Configuration("SPORTMONKS_API_TOKEN is required".to_string())
        })?;
        let mut cfg = Self::with_token(api_token);
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Environment-driven config for the offline provider, where no token is
    /// needed.
    pub fn offline_from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let mut cfg = Self::with_token(String::new());
        cfg.apply_env_overrides();
        cfg
    }

    pub fn with_token(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            league_id: DEFAULT_LEAGUE_ID,
            season_id: DEFAULT_SEASON_ID,
            team_ids: DEFAULT_TEAM_IDS.to_vec(),
            db_path: default_db_path().unwrap_or_else(|| PathBuf::from(DB_FILE)),
            squad_fetch_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(10),
            match_window: Duration::from_secs(4 * 60 * 60),
            poll_interval: Duration::from_secs(300),
            fetch_parallelism: 6,
            job_lease: Duration::from_secs(900),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(base) = opt_env("CRICKET_API_BASE") {
            self.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(id) = env_parse::<u32>("CRICKET_LEAGUE_ID") {
            self.league_id = id;
        }
        if let Some(id) = env_parse::<u32>("CRICKET_SEASON_ID") {
            self.season_id = id;
        }
        if let Some(raw) = opt_env("CRICKET_TEAM_IDS") {
            let ids = parse_ids(&raw);
            if !ids.is_empty() {
                self.team_ids = ids;
            }
        }
        if let Some(path) = opt_env("CRICKET_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }
        if let Some(ms) = env_parse::<u64>("SQUAD_FETCH_DELAY_MS") {
            self.squad_fetch_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("REQUEST_TIMEOUT_SECS") {
            self.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(hours) = env_parse::<u64>("MATCH_WINDOW_HOURS") {
            self.match_window = Duration::from_secs(hours * 60 * 60);
        }
        if let Some(secs) = env_parse::<u64>("POLL_INTERVAL_SECS") {
            self.poll_interval = Duration::from_secs(secs.max(30));
        }
        if let Some(n) = env_parse::<usize>("FETCH_PARALLELISM") {
            self.fetch_parallelism = n;
        }
        self.fetch_parallelism = self.fetch_parallelism.clamp(2, 32);
        if let Some(secs) = env_parse::<u64>("JOB_LEASE_SECS") {
            self.job_lease = Duration::from_secs(secs.max(60));
        }
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(DB_FILE));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR).join(DB_FILE))
}

/// Parses a list like `"2, 3;4 9"`, dropping zeros and duplicates while
/// keeping first-seen order.
pub fn parse_ids(raw: &str) -> Vec<u64> {
    let mut seen = HashSet::new();
    raw.split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .filter(|id| *id != 0)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val.trim().to_string())
        }
    })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    opt_env(key).and_then(|val| val.parse::<T>().ok())
}

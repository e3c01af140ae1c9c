use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::Config;
use crate::error::{IngestError, ProviderError};
use crate::http_client::http_client;
use crate::model::{Fixture, FixtureId, Player, TeamId};

/// Per-fixture listings the provider exposes through `?include=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    Batting,
    Bowling,
    Balls,
}

impl IncludeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IncludeKind::Batting => "batting",
            IncludeKind::Bowling => "bowling",
            IncludeKind::Balls => "balls",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawFixture {
    pub id: FixtureId,
    pub round_label: Option<String>,
    pub local_team_id: TeamId,
    pub visitor_team_id: TeamId,
    pub starting_at: Option<String>,
}

impl RawFixture {
    /// `None` when the start time is missing or unparseable; such a fixture
    /// cannot be scheduled.
    pub fn to_fixture(&self) -> Option<Fixture> {
        let starting_at = parse_start_time(self.starting_at.as_deref()?)?;
        Some(Fixture {
            id: self.id,
            round: self.round_label.as_deref().and_then(parse_round_label),
            local_team_id: self.local_team_id,
            visitor_team_id: self.visitor_team_id,
            starting_at,
        })
    }
}

pub type RawPlayer = Player;

/// The three calls the ingestion path needs from a statistics source.
pub trait StatsProvider: Sync {
    fn fetch_fixtures(&self, league_id: u32, season_id: u32)
    -> Result<Vec<RawFixture>, ProviderError>;

    fn fetch_squad(&self, team_id: TeamId, season_id: u32) -> Result<Vec<RawPlayer>, ProviderError>;

    fn fetch_fixture_include(
        &self,
        fixture_id: FixtureId,
        kind: IncludeKind,
    ) -> Result<Vec<Value>, ProviderError>;
}

pub struct SportmonksProvider {
    client: &'static Client,
    api_base: String,
    api_token: String,
}

impl SportmonksProvider {
    pub fn new(cfg: &Config) -> Result<Self, IngestError> {
        if cfg.api_token.trim().is_empty() {
            return Err(IngestError::Configuration(
                "SPORTMONKS_API_TOKEN is required".to_string(),
            ));
        }
        let client = http_client(cfg.request_timeout)?;
        Ok(Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            api_token: cfg.api_token.clone(),
        })
    }

    fn get_json(&self, path: &str) -> Result<Value, ProviderError> {
        let sep = if path.contains('?') { '&' } else { '?' };
        let url = format!("{}{path}{sep}api_token={}", self.api_base, self.api_token);
        debug!("GET {}", redact_token(&url, &self.api_token));

        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: redact_token(&body, &self.api_token),
            });
        }
        parse_body(&body)
    }
}

impl StatsProvider for SportmonksProvider {
    fn fetch_fixtures(
        &self,
        league_id: u32,
        season_id: u32,
    ) -> Result<Vec<RawFixture>, ProviderError> {
        let path =
            format!("/fixtures?filter[league_id]={league_id}&filter[season_id]={season_id}");
        let value = self.get_json(&path)?;
        Ok(fixtures_from_value(&value))
    }

    fn fetch_squad(&self, team_id: TeamId, season_id: u32) -> Result<Vec<RawPlayer>, ProviderError> {
        let value = self.get_json(&format!("/teams/{team_id}/squad/{season_id}"))?;
        Ok(squad_from_value(&value, team_id))
    }

    fn fetch_fixture_include(
        &self,
        fixture_id: FixtureId,
        kind: IncludeKind,
    ) -> Result<Vec<Value>, ProviderError> {
        let value = self.get_json(&format!("/fixtures/{fixture_id}?include={}", kind.as_str()))?;
        Ok(extract_include(&value, kind))
    }
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<RawFixture>, ProviderError> {
    Ok(fixtures_from_value(&parse_body(raw)?))
}

pub fn parse_squad_json(raw: &str, team_id: TeamId) -> Result<Vec<RawPlayer>, ProviderError> {
    Ok(squad_from_value(&parse_body(raw)?, team_id))
}

pub fn parse_include_json(raw: &str, kind: IncludeKind) -> Result<Vec<Value>, ProviderError> {
    Ok(extract_include(&parse_body(raw)?, kind))
}

/// Pulls the records for `kind` out of a fixture payload. The primary shape
/// is `data.<kind>` (either a list or `{ "data": [...] }`); only when that is
/// absent do we look at the top-level `included` list filtered by `type`.
pub fn extract_include(value: &Value, kind: IncludeKind) -> Vec<Value> {
    let key = kind.as_str();
    if let Some(primary) = value.get("data").and_then(|d| d.get(key)) {
        if let Some(arr) = primary.as_array() {
            return arr.clone();
        }
        if let Some(arr) = primary.get("data").and_then(|d| d.as_array()) {
            return arr.clone();
        }
    }

    value
        .get("included")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter(|item| {
                    item.get("type")
                        .and_then(|t| t.as_str())
                        .is_some_and(|t| t.eq_ignore_ascii_case(key))
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn fixtures_from_value(value: &Value) -> Vec<RawFixture> {
    let Some(items) = value.get("data").and_then(|d| d.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let parsed = parse_raw_fixture(item);
            if parsed.is_none() {
                debug!("skipping fixture without ids: {item}");
            }
            parsed
        })
        .collect()
}

fn parse_raw_fixture(v: &Value) -> Option<RawFixture> {
    let id = v.get("id").and_then(as_u64_any).filter(|id| *id != 0)?;
    let local_team_id = v.get("localteam_id").and_then(as_u64_any).unwrap_or(0);
    let visitor_team_id = v.get("visitorteam_id").and_then(as_u64_any).unwrap_or(0);
    let round_label = v.get("round").and_then(|r| match r {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let starting_at = v
        .get("starting_at")
        .and_then(|s| s.as_str())
        .map(|s| s.to_string());
    Some(RawFixture {
        id,
        round_label,
        local_team_id,
        visitor_team_id,
        starting_at,
    })
}

fn squad_from_value(value: &Value, team_id: TeamId) -> Vec<RawPlayer> {
    let Some(items) = value
        .get("data")
        .and_then(|d| d.get("squad"))
        .and_then(|s| s.as_array())
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|p| {
            let id = p.get("id").and_then(as_u64_any).filter(|id| *id != 0)?;
            let name = non_empty_str(p.get("fullname")).unwrap_or_else(|| {
                let first = p.get("firstname").and_then(|v| v.as_str()).unwrap_or("");
                let last = p.get("lastname").and_then(|v| v.as_str()).unwrap_or("");
                format!("{first} {last}").trim().to_string()
            });
            Some(Player {
                id,
                name,
                role: non_empty_str(p.get("position").and_then(|pos| pos.get("name"))),
                team_id,
                photo_url: non_empty_str(p.get("image_path")),
            })
        })
        .collect()
}

fn parse_body(raw: &str) -> Result<Value, ProviderError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).map_err(|err| ProviderError::Malformed(err.to_string()))
}

/// Leading integer of a free-text round label: "48th Match" -> 48.
pub fn parse_round_label(raw: &str) -> Option<i64> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<i64>().ok()
}

/// Accepts RFC 3339 (`2023-03-31T14:00:00.000000Z`) and the bare
/// `YYYY-MM-DD HH:MM:SS` form, which is taken as UTC.
pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub(crate) fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

pub(crate) fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    let s = v?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn redact_token(url: &str, token: &str) -> String {
    if token.is_empty() {
        return url.to_string();
    }
    url.replace(token, "API_TOKEN_HIDDEN")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_label_takes_leading_number() {
        assert_eq!(parse_round_label("48th Match"), Some(48));
        assert_eq!(parse_round_label("7"), Some(7));
        assert_eq!(parse_round_label("Final"), None);
        assert_eq!(parse_round_label(""), None);
    }

    #[test]
    fn start_time_accepts_provider_formats() {
        let a = parse_start_time("2023-03-31T14:00:00.000000Z").unwrap();
        let b = parse_start_time("2023-03-31 14:00:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_start_time("soon").is_none());
    }

    #[test]
    fn primary_include_wins_over_included() {
        let v = json!({
            "data": { "batting": [{ "player_id": 1 }] },
            "included": [{ "type": "batting", "player_id": 2 }]
        });
        let rows = extract_include(&v, IncludeKind::Batting);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["player_id"], 1);
    }

    #[test]
    fn included_is_filtered_by_type() {
        let v = json!({
            "data": { "id": 9 },
            "included": [
                { "type": "Bowling", "attributes": { "player_id": 3 } },
                { "type": "batting", "attributes": { "player_id": 4 } }
            ]
        });
        let rows = extract_include(&v, IncludeKind::Bowling);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["attributes"]["player_id"], 3);
    }

    #[test]
    fn nested_balls_list_is_unwrapped() {
        let v = json!({ "data": { "balls": { "data": [{ "id": 1 }, { "id": 2 }] } } });
        assert_eq!(extract_include(&v, IncludeKind::Balls).len(), 2);
    }

    #[test]
    fn transport_error_does_not_leak_token() {
        let mut cfg = Config::with_token("SUPERSECRET123");
        cfg.api_base = "http://127.0.0.1:9".to_string();
        let provider = SportmonksProvider::new(&cfg).unwrap();

        let err = provider.fetch_fixtures(1, 1689).unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
        let shown = err.to_string();
        assert!(!shown.contains("SUPERSECRET123"), "{shown}");
        assert!(!shown.contains("api_token"), "{shown}");
    }

    #[test]
    fn token_is_redacted() {
        assert_eq!(
            redact_token("https://x/fixtures?api_token=s3cret", "s3cret"),
            "https://x/fixtures?api_token=API_TOKEN_HIDDEN"
        );
    }
}

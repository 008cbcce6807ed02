use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Sentinel best time meaning "no completed level yet".
pub const UNSET_TIME: u64 = 999_999;

/// Aggregate counters as persisted under [`super::STATS_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub total_games: u64,
    pub total_wins: u64,
    pub total_losses: u64,
    pub best_time: u64,
    pub total_time_played: u64,
    pub current_streak: u64,
    pub longest_streak: u64,
}

impl Default for StatsRecord {
    fn default() -> Self {
        Self {
            total_games: 0,
            total_wins: 0,
            total_losses: 0,
            best_time: UNSET_TIME,
            total_time_played: 0,
            current_streak: 0,
            longest_streak: 0,
        }
    }
}

impl StatsRecord {
    /// Decode a stored record, falling back to the default for each field that
    /// is missing or not a non-negative integer.
    pub fn from_json(json: &str) -> Self {
        let value: Value = serde_json::from_str(json).unwrap_or_else(|e| {
            warn!("Failed to parse stored stats, using defaults: {}", e);
            Value::Null
        });
        let defaults = Self::default();
        let field = |name: &str, default: u64| {
            value.get(name).and_then(Value::as_u64).unwrap_or(default)
        };

        Self {
            total_games: field("totalGames", defaults.total_games),
            total_wins: field("totalWins", defaults.total_wins),
            total_losses: field("totalLosses", defaults.total_losses),
            best_time: field("bestTime", defaults.best_time),
            total_time_played: field("totalTimePlayed", defaults.total_time_played),
            current_streak: field("currentStreak", defaults.current_streak),
            longest_streak: field("longestStreak", defaults.longest_streak),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// One completed level. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelResult {
    pub level: u32,
    pub size: usize,
    /// Completion time in whole seconds.
    pub time: u64,
    pub moves: u32,
    pub par_time: u64,
    pub stars: u8,
    pub date: DateTime<Utc>,
}

impl LevelResult {
    /// Build a result stamped with the current time.
    pub fn completed_now(
        level: u32,
        size: usize,
        time: u64,
        moves: u32,
        par_time: u64,
        stars: u8,
    ) -> Self {
        Self {
            level,
            size,
            time,
            moves,
            par_time,
            stars,
            date: Utc::now(),
        }
    }
}

/// Helper function to serialize level history to JSON
pub fn serialize_history(history: &[LevelResult]) -> String {
    serde_json::to_string(history).unwrap_or_else(|_| "[]".to_string())
}

/// Helper function to deserialize level history from JSON.
///
/// Entries that do not decode are dropped; the rest keep their order.
pub fn deserialize_history(json: &str) -> Vec<LevelResult> {
    let entries: Vec<Value> = serde_json::from_str(json).unwrap_or_else(|e| {
        warn!("Failed to parse stored level history, starting empty: {}", e);
        vec![]
    });

    let total = entries.len();
    let history: Vec<LevelResult> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();

    if history.len() < total {
        warn!(
            "Dropped {} malformed level history entries",
            total - history.len()
        );
    }
    history
}

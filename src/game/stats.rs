//! Persisted win/loss aggregates and recent level history.

use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::storage::{
    HISTORY_KEY, KeyValueStore, STATS_KEY,
    models::{LevelResult, StatsRecord, deserialize_history, serialize_history},
};

/// Maximum number of level results kept, most recent first.
pub const HISTORY_LIMIT: usize = 50;

/// Aggregated statistics across all played levels.
///
/// Every mutating call writes the new state through the store. Write failures
/// are logged and the in-memory state is kept.
pub struct StatsTracker {
    store: Rc<dyn KeyValueStore>,
    record: StatsRecord,
    history: Vec<LevelResult>,
}

impl StatsTracker {
    /// Create a tracker initialised from whatever the store holds.
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        let mut tracker = Self {
            store,
            record: StatsRecord::default(),
            history: Vec::new(),
        };
        tracker.load_from_storage();
        tracker
    }

    pub fn aggregate(&self) -> &StatsRecord {
        &self.record
    }

    /// Recorded levels, most recent first.
    pub fn history(&self) -> &[LevelResult] {
        &self.history
    }

    /// Percentage of games won, 0 when nothing has been played.
    pub fn win_rate(&self) -> f64 {
        if self.record.total_games == 0 {
            return 0.0;
        }
        (self.record.total_wins as f64 / self.record.total_games as f64) * 100.0
    }

    /// Mean winning time in whole seconds, 0 without wins.
    pub fn average_time(&self) -> u64 {
        if self.record.total_wins == 0 {
            return 0;
        }
        (self.record.total_time_played as f64 / self.record.total_wins as f64).round() as u64
    }

    pub fn total_stars(&self) -> u32 {
        self.history.iter().map(|r| u32::from(r.stars)).sum()
    }

    pub fn record_win(&mut self, time: u64) {
        let r = &mut self.record;
        r.total_games = r.total_games.saturating_add(1);
        r.total_wins = r.total_wins.saturating_add(1);
        r.total_time_played = r.total_time_played.saturating_add(time);
        r.current_streak = r.current_streak.saturating_add(1);
        r.longest_streak = r.longest_streak.max(r.current_streak);
        r.best_time = r.best_time.min(time);

        debug!(
            "Recorded win in {}s (streak {}, longest {})",
            time, r.current_streak, r.longest_streak
        );
        self.save_to_storage();
    }

    pub fn record_loss(&mut self) {
        let r = &mut self.record;
        r.total_games = r.total_games.saturating_add(1);
        r.total_losses = r.total_losses.saturating_add(1);
        r.current_streak = 0;

        debug!("Recorded loss ({} total)", r.total_losses);
        self.save_to_storage();
    }

    /// Store a completed level and count it as a win.
    ///
    /// This already calls [`Self::record_win`]; do not record the same
    /// completion twice.
    pub fn add_result(&mut self, result: LevelResult) {
        let time = result.time;
        self.history.insert(0, result);
        self.history.truncate(HISTORY_LIMIT);
        self.record_win(time);
    }

    /// Fastest recorded result for a level/size pair. Ties go to the most recent.
    pub fn get_best_for_level(&self, level: u32, size: usize) -> Option<&LevelResult> {
        self.history
            .iter()
            .filter(|r| r.level == level && r.size == size)
            .min_by_key(|r| r.time)
    }

    /// Most recent result for a level/size pair.
    pub fn latest_for_level(&self, level: u32, size: usize) -> Option<&LevelResult> {
        self.history
            .iter()
            .find(|r| r.level == level && r.size == size)
    }

    pub fn reset_stats(&mut self) {
        self.record = StatsRecord::default();
        self.history.clear();
        info!("Statistics reset");
        self.save_to_storage();
    }

    /// Replace in-memory state with the stored one. Missing or malformed
    /// entries fall back to defaults.
    pub fn load_from_storage(&mut self) {
        self.record = self
            .read(STATS_KEY)
            .map(|json| StatsRecord::from_json(&json))
            .unwrap_or_default();

        self.history = self
            .read(HISTORY_KEY)
            .map(|json| deserialize_history(&json))
            .unwrap_or_default();
        self.history.truncate(HISTORY_LIMIT);
    }

    pub fn save_to_storage(&self) {
        if let Err(e) = self.store.set(STATS_KEY, &self.record.to_json()) {
            warn!("Failed to save stats: {:#}", e);
        }
        if let Err(e) = self.store.set(HISTORY_KEY, &serialize_history(&self.history)) {
            warn!("Failed to save level history: {:#}", e);
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap_or_else(|e| {
            warn!("Failed to load {}: {:#}", key, e);
            None
        })
    }
}

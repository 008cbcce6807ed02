pub mod models;
pub mod sqlite;

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

pub use sqlite::SqliteStore;

/// Key holding the session's best completion time in whole seconds.
pub const BEST_TIME_KEY: &str = "maze-best-time";
/// Key holding the JSON aggregate counters.
pub const STATS_KEY: &str = "maze-stats";
/// Key holding the JSON level history, most recent first.
pub const HISTORY_KEY: &str = "maze-level-history";

/// Minimal key/value persistence used by the session and the stats tracker.
///
/// Writes are last-write-wins; implementations are not expected to be transactional.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Get the path to the database file using platform-specific data directory
pub fn get_db_path() -> Result<PathBuf> {
    let mut path = dirs::data_dir()
        .context("Unable to determine data directory for your platform")?;

    path.push("maze-quest");

    std::fs::create_dir_all(&path)
        .context("Failed to create maze-quest data directory")?;

    path.push("maze.db");
    Ok(path)
}

/// Store whose writes always fail, for exercising the warn-and-continue paths.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FailingStore {
    pub(crate) inner: MemoryStore,
}

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(anyhow::anyhow!("disk full while writing {}", key))
    }
}

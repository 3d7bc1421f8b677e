use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Tunables of the load strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadMoreConfig {
    /// Page size when scrolling into history
    pub prev_page_size: u32,
    /// Page size when scrolling towards newer messages and for silent merges
    pub next_page_size: u32,
    /// Size of the latest page fetched by eager and passive loads; a loaded
    /// window more than `eager_page_size - 1` behind that page gets replaced
    pub eager_page_size: u32,
    /// Largest index jump that a pushed index change merges silently
    pub silent_merge_threshold: u64,
    /// How long a forward or eager load keeps its lock after inserting, so the
    /// view can settle without re-triggering the load
    pub scroll_settle_ms: u64,
    /// Upper bound on pages fetched by one silent merge
    pub silent_max_rounds: u32,
    /// Upper bound on how long the initial load waits for the messages to render
    pub locate_timeout_ms: u64,
    pub enable_two_way_load: bool,
    pub enable_mark_read: bool,
}

impl Default for LoadMoreConfig {
    fn default() -> Self {
        Self {
            prev_page_size: 15,
            next_page_size: 15,
            eager_page_size: 20,
            silent_merge_threshold: 5,
            scroll_settle_ms: 100,
            silent_max_rounds: 20,
            locate_timeout_ms: 3_000,
            enable_two_way_load: true,
            enable_mark_read: false,
        }
    }
}

impl LoadMoreConfig {
    pub fn validate(&self) -> Result<(), Error> {
        for (name, size) in [
            ("prev_page_size", self.prev_page_size),
            ("next_page_size", self.next_page_size),
            ("eager_page_size", self.eager_page_size),
            ("silent_max_rounds", self.silent_max_rounds),
        ] {
            if size == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn locate_timeout(&self) -> Duration {
        Duration::from_millis(self.locate_timeout_ms)
    }
}

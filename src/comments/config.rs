use crate::comments::harvest::{DEFAULT_ENDPOINT_PATTERN, DEFAULT_MAX_DEPTH};
use std::time::Duration;

/// Tuning for one page visit
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// URL fragment identifying comment listing responses
    pub endpoint_pattern: String,

    /// Pause after each interaction round for content and responses to arrive
    pub settle_interval: Duration,

    /// Hard cap on interaction rounds per page
    pub max_rounds: u32,

    /// Consecutive rounds without growth that count as converged
    pub stagnant_rounds: u32,

    /// How long to wait for the comment panel after clicking its icon
    pub panel_timeout: Duration,

    /// Nesting bound when walking response payloads
    pub max_json_depth: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            endpoint_pattern: DEFAULT_ENDPOINT_PATTERN.to_string(),
            settle_interval: Duration::from_millis(1200),
            max_rounds: 30,
            stagnant_rounds: 3,
            panel_timeout: Duration::from_secs(8),
            max_json_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl HarvestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.endpoint_pattern = pattern.into();
        self
    }

    pub fn with_settle_interval(mut self, interval: Duration) -> Self {
        self.settle_interval = interval;
        self
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    pub fn with_stagnant_rounds(mut self, rounds: u32) -> Self {
        self.stagnant_rounds = rounds.max(1);
        self
    }

    pub fn with_panel_timeout(mut self, timeout: Duration) -> Self {
        self.panel_timeout = timeout;
        self
    }

    pub fn with_max_json_depth(mut self, depth: usize) -> Self {
        self.max_json_depth = depth;
        self
    }
}

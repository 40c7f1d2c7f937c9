// src/config.rs
// =============================================================================
// Run-time settings for a crawl.
//
// There is only one knob today: how deep the crawl goes. The default is 2,
// which means "the links on the start page, plus the links on each of those
// pages". It can be overridden with the LINK_TREE_MAX_DEPTH environment
// variable. There is no command-line flag for it.
// =============================================================================

use thiserror::Error;

// Depth used when nothing else is configured
pub const DEFAULT_MAX_DEPTH: usize = 2;

// Environment variable that overrides DEFAULT_MAX_DEPTH
pub const MAX_DEPTH_ENV: &str = "LINK_TREE_MAX_DEPTH";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LINK_TREE_MAX_DEPTH must be a non-negative integer, got {value:?}")]
    InvalidMaxDepth { value: String },
}

// Settings shared by every component during one run
// Read-only once the crawl starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlConfig {
    max_depth: usize,
}

impl CrawlConfig {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    // Reads overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Builds a config from any key -> value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unset means default; set but unparsable is an error, not a fallback
        let max_depth = match lookup(MAX_DEPTH_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidMaxDepth { value: raw })?,
            None => DEFAULT_MAX_DEPTH,
        };

        Ok(Self::new(max_depth))
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

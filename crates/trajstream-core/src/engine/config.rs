use thiserror::Error;

/// Frames kept in memory when no capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
}

/// How the indexer reacts when it meets data it cannot parse before end-of-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Keep the frames indexed so far and record the truncation.
    #[default]
    Lenient,
    /// Fail initialisation with
    /// [`TrajectoryError::TruncatedIndex`](super::error::TrajectoryError::TruncatedIndex).
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub cache_capacity: usize,
    pub index_policy: IndexPolicy,
}

impl ReaderConfig {
    /// Checks invariants that hold for every config produced by [`ReaderConfigBuilder`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "cache_capacity",
                reason: "must hold at least one frame",
            });
        }
        Ok(())
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            index_policy: IndexPolicy::default(),
        }
    }
}

#[derive(Default)]
pub struct ReaderConfigBuilder {
    cache_capacity: Option<usize>,
    index_policy: Option<IndexPolicy>,
}

impl ReaderConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }
    pub fn index_policy(mut self, policy: IndexPolicy) -> Self {
        self.index_policy = Some(policy);
        self
    }
    pub fn strict(self, strict: bool) -> Self {
        self.index_policy(if strict {
            IndexPolicy::Strict
        } else {
            IndexPolicy::Lenient
        })
    }

    pub fn build(self) -> Result<ReaderConfig, ConfigError> {
        let config = ReaderConfig {
            cache_capacity: self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
            index_policy: self.index_policy.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

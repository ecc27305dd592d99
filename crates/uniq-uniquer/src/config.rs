//! Uniquer configuration, validation, and error types.

use std::error::Error;
use std::fmt;

use uniq_arena::{ArenaConfig, ArenaError};

/// Builder input for [`StorageUniquer::with_config`](crate::StorageUniquer::with_config).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniquerConfig {
    /// Whether entry locks block. Default: `true`.
    ///
    /// Disable only for single-threaded pipelines; see
    /// [`StorageUniquer::set_multithreading`](crate::StorageUniquer::set_multithreading).
    pub multithreaded: bool,
    /// Arena sizing.
    pub arena: ArenaConfig,
}

impl Default for UniquerConfig {
    fn default() -> Self {
        Self {
            multithreaded: true,
            arena: ArenaConfig::default(),
        }
    }
}

impl UniquerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arena.validate().map_err(ConfigError::Arena)
    }
}

/// Errors detected during [`UniquerConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Arena configuration is invalid.
    Arena(ArenaError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
        }
    }
}

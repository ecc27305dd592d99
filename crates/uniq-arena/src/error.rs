//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur while setting up an arena.
///
/// Allocation itself never returns an error: running out of memory is
/// fatal and aborts through the global allocation error handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// An [`ArenaConfig`](crate::ArenaConfig) value violates an invariant.
    InvalidConfig {
        /// Description of which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}

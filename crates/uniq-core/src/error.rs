//! Error types for the uniq storage uniquer.
//!
//! Only mutation has a recoverable failure channel. Use of an unregistered
//! tag, tag/type mismatches and arena exhaustion are programming or resource
//! errors and abort the operation with a panic instead.

use std::error::Error;
use std::fmt;

/// A storage class refused to apply a mutation.
///
/// Returned by `StorageUniquer::mutate`; the caller decides whether the
/// refusal matters. The instance is left unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationError {
    /// The mutable component was already assigned and is write-once.
    Finalized,
    /// The storage class caps how many times it may be mutated.
    LimitReached {
        /// The configured mutation limit.
        limit: u32,
    },
    /// The storage class rejected the mutation for its own reason.
    Rejected {
        /// Human-readable description of the rejection.
        reason: String,
    },
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finalized => write!(f, "storage is finalized"),
            Self::LimitReached { limit } => {
                write!(f, "mutation limit of {limit} reached")
            }
            Self::Rejected { reason } => write!(f, "mutation rejected: {reason}"),
        }
    }
}

impl Error for MutationError {}

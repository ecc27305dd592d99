//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the arena allocator.
///
/// Controls segment sizing and growth. Validated at construction; all
/// values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the first segments in bytes.
    ///
    /// Default: 4096. Must be a power of two.
    pub segment_bytes: usize,

    /// Number of segments allocated at each size before the size doubles.
    ///
    /// Default: 128. Must be non-zero.
    pub growth_interval: usize,

    /// Upper bound on the size of a regular segment in bytes.
    ///
    /// Default: 4MB. Must be a power of two and at least `segment_bytes`.
    /// Requests larger than the current segment size are served from a
    /// dedicated block and are not subject to this cap.
    pub max_segment_bytes: usize,
}

impl ArenaConfig {
    /// Default size of the first segments: one page.
    pub const DEFAULT_SEGMENT_BYTES: usize = 4096;

    /// Default number of segments per size class.
    pub const DEFAULT_GROWTH_INTERVAL: usize = 128;

    /// Default cap on regular segment size.
    pub const DEFAULT_MAX_SEGMENT_BYTES: usize = 4 * 1024 * 1024;

    /// Create a config with default growth and the given first segment size.
    pub fn new(segment_bytes: usize) -> Self {
        Self {
            segment_bytes,
            growth_interval: Self::DEFAULT_GROWTH_INTERVAL,
            max_segment_bytes: Self::DEFAULT_MAX_SEGMENT_BYTES.max(segment_bytes),
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.segment_bytes.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "segment_bytes must be a non-zero power of two, got {}",
                    self.segment_bytes
                ),
            });
        }
        if self.growth_interval == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "growth_interval must be non-zero".into(),
            });
        }
        if !self.max_segment_bytes.is_power_of_two() || self.max_segment_bytes < self.segment_bytes
        {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "max_segment_bytes must be a power of two >= segment_bytes ({}), got {}",
                    self.segment_bytes, self.max_segment_bytes
                ),
            });
        }
        Ok(())
    }

    /// Size of the next regular segment when `existing` segments are live.
    pub fn segment_bytes_for(&self, existing: usize) -> usize {
        let doublings = (existing / self.growth_interval).min(usize::BITS as usize - 1) as u32;
        self.segment_bytes
            .checked_shl(doublings)
            .filter(|&size| size != 0 && size <= self.max_segment_bytes)
            .unwrap_or(self.max_segment_bytes)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEGMENT_BYTES)
    }
}

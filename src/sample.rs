//! The per-interval sample record.

use serde::{Deserialize, Serialize};

/// One completed sampling interval.
///
/// Produced exactly once per `samples_divisor` timebase ticks, immutable once
/// built. Owned by the ring buffer from push until consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Value of the monotonic tick counter when this sample was built.
    pub tick_index: u64,

    /// Milliseconds elapsed since the current acquisition run started,
    /// measured on the timebase's own monotonic clock.
    pub elapsed_ms: u64,

    /// Number of hardware events accumulated during the interval.
    pub event_count: u64,
}

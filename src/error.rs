//! Error types for the acquisition pipeline.
//!
//! Producer-side conditions (timer overruns, buffer-full drops) are recorded
//! as diagnostics counters and logged, never returned as errors: the timer
//! context has no caller to report to synchronously. Everything surfaced here
//! is a consumer-context result value.

use thiserror::Error;

/// Errors returned by control-plane operations on
/// [`AcquisitionController`](crate::controller::AcquisitionController).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// `configure` was called with a divisor of zero.
    ///
    /// The divisor is the number of timebase ticks per produced sample and
    /// must be at least 1. The controller state is unchanged when this is
    /// returned.
    #[error("samples divisor must be at least 1")]
    InvalidDivisor,

    /// The sample buffer capacity is not a power of two of at least 2.
    ///
    /// Capacity is fixed at construction; cursor arithmetic relies on a
    /// power-of-two size.
    #[error("buffer capacity must be a power of two >= 2, got {0}")]
    InvalidCapacity(usize),
}

/// Errors returned by [`ConsumerGateway::read`](crate::gateway::ConsumerGateway::read).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// No samples are ready and the caller asked not to block.
    ///
    /// Retry later, or use `poll_ready` to wait for readiness externally.
    #[error("no samples ready")]
    WouldBlock,

    /// A blocking read was interrupted before any data was consumed.
    ///
    /// Not a data-loss condition: nothing was drained from the buffer and
    /// the caller may simply retry.
    #[error("blocking read interrupted")]
    Interrupted,
}

/// Errors returned when parsing a sample line produced by
/// [`codec::encode`](crate::codec::encode).
#[derive(Error, Debug)]
pub enum CodecError {
    /// The leading tag token did not match the expected line tag.
    #[error("unexpected line tag '{0}'")]
    UnexpectedTag(String),

    /// The line did not split into the tag plus three integer fields.
    #[error("expected 4 fields, got {0}")]
    FieldCount(usize),

    /// A numeric field failed to parse as an unsigned integer.
    #[error("invalid integer field: {0}")]
    InvalidField(#[from] std::num::ParseIntError),
}

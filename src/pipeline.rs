//! State shared across the producer and consumer contexts of one
//! acquisition pipeline.
//!
//! Exactly two execution contexts touch this state: the sampler task (the
//! timer context, never blocked) and the consumer calling through the
//! gateway. The ring buffer cursors are the only state both sides mutate,
//! and only through the buffer's own locking discipline.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Notify};

use crate::accumulator::EventAccumulator;
use crate::ring::RingBuffer;
use crate::sample::Sample;

/// Producer-side diagnostic counters. Cumulative across runs, updated with
/// relaxed atomics only (no counter is ever load-bearing for correctness).
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    pub ticks: AtomicU64,
    pub samples_produced: AtomicU64,
    pub samples_dropped: AtomicU64,
    pub timer_overruns: AtomicU64,
}

impl Diagnostics {
    pub(crate) fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            samples_produced: self.samples_produced.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            timer_overruns: self.timer_overruns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the pipeline's diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSnapshot {
    /// Timebase firings observed since the pipeline was built.
    pub ticks: u64,
    /// Samples successfully enqueued.
    pub samples_produced: u64,
    /// Samples dropped because the buffer was full.
    pub samples_dropped: u64,
    /// Sampling periods skipped by timebase overruns.
    pub timer_overruns: u64,
}

/// Everything the sampler task, controller and gateway share.
pub(crate) struct Shared {
    pub accumulator: EventAccumulator,
    pub ring: RingBuffer<Sample>,
    /// Readiness flag for poll-style consumers. Set by the sampler after
    /// each produced sample, cleared by the gateway once the buffer drains
    /// empty.
    pub readable: AtomicBool,
    /// Wakes a consumer blocked in `read` when a sample lands.
    pub data_ready: Notify,
    /// Wakes a consumer blocked in `read` with `Interrupted`.
    pub interrupt: Notify,
    /// Bumped on every stop transition so blocked readers wake and return
    /// whatever is buffered.
    pub stop_gen: watch::Sender<u64>,
    pub diag: Diagnostics,
}

impl Shared {
    pub(crate) fn new(capacity: usize) -> Arc<Self> {
        let (stop_gen, _) = watch::channel(0);
        Arc::new(Self {
            accumulator: EventAccumulator::new(),
            ring: RingBuffer::with_capacity(capacity),
            readable: AtomicBool::new(false),
            data_ready: Notify::new(),
            interrupt: Notify::new(),
            stop_gen,
            diag: Diagnostics::default(),
        })
    }
}

/// Cheap cloneable handle for the event source side of the pipeline.
///
/// This is the only surface an interrupt-like context needs: a single
/// lock-free call per hardware edge.
#[derive(Clone)]
pub struct EventInput {
    pub(crate) shared: Arc<Shared>,
}

impl EventInput {
    /// Record one hardware event. Lock-free, never blocks, never fails.
    pub fn record_event(&self) {
        self.shared.accumulator.record_event();
    }
}

impl std::fmt::Debug for EventInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventInput")
            .field("pending_events", &self.shared.accumulator.peek())
            .finish()
    }
}

//! The periodic sampler: the timebase-driven producer task.
//!
//! Every operation in the loop body is bounded-time and non-blocking. The
//! task holds no lock across an await and never waits for the consumer; a
//! full buffer drops the sample and counts the drop.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::pipeline::Shared;
use crate::sample::Sample;

/// Run the timebase loop until `shutdown` fires (or its sender is dropped).
///
/// The next deadline is always recomputed relative to the monotonic clock,
/// advancing by whole periods until it lies in the future. Needing more than
/// one period to catch up means firings were missed; that is recorded as an
/// overrun, not an error. A fixed-delay re-arm would instead let the period
/// drift by the callback latency on every firing.
pub(crate) async fn run(
    shared: Arc<Shared>,
    period: Duration,
    divisor: u32,
    started: Instant,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut deadline = started + period;
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {}
            _ = &mut shutdown => break,
        }

        let now = Instant::now();
        let mut advanced = 1u64;
        deadline += period;
        while deadline <= now {
            deadline += period;
            advanced += 1;
        }
        if advanced > 1 {
            let missed = advanced - 1;
            shared.diag.timer_overruns.fetch_add(missed, Ordering::Relaxed);
            tracing::warn!(missed, "timebase overrun, sampling periods skipped");
        }

        tick += 1;
        shared.diag.ticks.fetch_add(1, Ordering::Relaxed);

        if tick % u64::from(divisor) == 0 {
            let sample = Sample {
                tick_index: tick,
                elapsed_ms: now.duration_since(started).as_millis() as u64,
                event_count: shared.accumulator.drain_and_reset(),
            };

            match shared.ring.push(sample) {
                Ok(()) => {
                    shared.diag.samples_produced.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    shared.diag.samples_dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(tick, "sample buffer full, dropping sample");
                }
            }

            // Readable regardless of the push outcome: a full buffer still
            // holds unread samples.
            shared.readable.store(true, Ordering::Release);
            shared.data_ready.notify_waiters();
        }
    }
}

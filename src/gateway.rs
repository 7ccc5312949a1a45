//! Single-consumer read surface for the sample buffer.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::error::ReadError;
use crate::pipeline::Shared;
use crate::sample::Sample;

/// Drains the pipeline's sample buffer for the one consumer.
///
/// Obtained from [`AcquisitionController::new`]; there is exactly one per
/// pipeline, and `read` takes `&mut self` so overlapping read sessions
/// cannot exist.
///
/// [`AcquisitionController::new`]: crate::controller::AcquisitionController::new
pub struct ConsumerGateway {
    shared: Arc<Shared>,
}

/// Cloneable handle that wakes a blocked [`ConsumerGateway::read`] with
/// [`ReadError::Interrupted`]. Wire it to signal handling in the hosting
/// environment.
#[derive(Clone)]
pub struct ReadInterrupt {
    shared: Arc<Shared>,
}

impl ReadInterrupt {
    /// Interrupt a currently blocked read, if any. A read that is not
    /// waiting at this moment is unaffected.
    pub fn interrupt(&self) {
        self.shared.interrupt.notify_waiters();
    }
}

impl ConsumerGateway {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Handle for interrupting blocked reads from another context.
    pub fn interrupt_handle(&self) -> ReadInterrupt {
        ReadInterrupt {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Readiness flag for poll-style integrations. True once a sample has
    /// been produced and the buffer has not drained empty since.
    pub fn poll_ready(&self) -> bool {
        self.shared.readable.load(Ordering::Acquire)
    }

    /// Number of unread samples, without consuming anything.
    pub fn pending_count(&self) -> usize {
        self.shared.ring.len()
    }

    /// Read up to `max_items` samples in tick order.
    ///
    /// With data buffered, returns immediately in both modes. Otherwise:
    ///
    /// - `blocking = false`: returns [`ReadError::WouldBlock`].
    /// - `blocking = true`: suspends until the sampler signals readiness,
    ///   a stop transition occurs (returns the buffered batch, possibly
    ///   empty), or the read is interrupted (returns
    ///   [`ReadError::Interrupted`] with nothing consumed).
    pub async fn read(
        &mut self,
        max_items: usize,
        blocking: bool,
    ) -> Result<Vec<Sample>, ReadError> {
        let mut stop_rx = self.shared.stop_gen.subscribe();

        loop {
            if !self.shared.ring.is_empty() {
                return Ok(self.drain(max_items));
            }
            if !blocking {
                return Err(ReadError::WouldBlock);
            }

            let notified = self.shared.data_ready.notified();
            let interrupted = self.shared.interrupt.notified();
            tokio::pin!(notified, interrupted);
            // Register both waiters before the final emptiness check so a
            // sample landing in between cannot be missed.
            notified.as_mut().enable();
            interrupted.as_mut().enable();
            if !self.shared.ring.is_empty() {
                continue;
            }

            tokio::select! {
                _ = notified => {}
                _ = interrupted => return Err(ReadError::Interrupted),
                _ = stop_rx.changed() => return Ok(self.drain(max_items)),
            }
        }
    }

    /// One bounded read session: checkpoint, lock-free bulk copy, commit,
    /// then readiness-flag maintenance.
    fn drain(&self, max_items: usize) -> Vec<Sample> {
        let batch = self.shared.ring.begin_read();
        let take = batch.len().min(max_items);
        let mut out = Vec::with_capacity(take);
        for i in 0..take {
            out.push(batch.peek(i));
        }
        batch.commit(take);

        // Clear readiness only once the buffer is empty, re-arming if a
        // push slipped in between the check and the clear.
        if self.shared.ring.is_empty() {
            self.shared.readable.store(false, Ordering::Release);
            if !self.shared.ring.is_empty() {
                self.shared.readable.store(true, Ordering::Release);
            }
        }

        if !out.is_empty() {
            debug!(count = out.len(), "drained samples");
        }
        out
    }
}

impl std::fmt::Debug for ConsumerGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerGateway")
            .field("pending", &self.pending_count())
            .field("ready", &self.poll_ready())
            .finish()
    }
}

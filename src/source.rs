//! Simulated pulse source.
//!
//! Stands in for the hardware edge input: a task that records events at a
//! configurable mean rate with randomized inter-pulse gaps, so the pipeline
//! can run and be demonstrated without any physical signal attached.

use std::time::Duration;

use rand::Rng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::pipeline::EventInput;

/// Background task emitting simulated pulses into an [`EventInput`].
#[derive(Debug)]
pub struct MockPulseSource {
    task_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockPulseSource {
    /// Spawn a pulse generator averaging `mean_rate_hz` events per second.
    ///
    /// Gaps between pulses are drawn uniformly from 0.5x to 1.5x the mean
    /// interval, which is enough irregularity to exercise the accumulator
    /// without a full arrival-process model.
    pub fn spawn(input: EventInput, mean_rate_hz: f64) -> Self {
        let mean_gap = Duration::from_secs_f64(1.0 / mean_rate_hz.max(f64::MIN_POSITIVE));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            loop {
                let jitter = rand::thread_rng().gen_range(0.5..1.5);
                let gap = mean_gap.mul_f64(jitter);
                tokio::select! {
                    _ = tokio::time::sleep(gap) => input.record_event(),
                    _ = &mut shutdown_rx => break,
                }
            }
            debug!("pulse source stopped");
        });

        Self {
            task_handle: Some(handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Stop the generator and wait for its task to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for MockPulseSource {
    fn drop(&mut self) {
        // Closing the channel is enough for the task to exit on its own.
        self.shutdown_tx.take();
    }
}

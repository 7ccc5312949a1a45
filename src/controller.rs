//! Control plane for the acquisition pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::PulseDaqConfig;
use crate::error::ControlError;
use crate::gateway::ConsumerGateway;
use crate::pipeline::{DiagnosticsSnapshot, EventInput, Shared};
use crate::sampler;

/// Lifecycle state of the acquisition pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    /// No timebase running; the buffer still serves whatever it holds.
    Stopped,
    /// Timebase running, samples being produced.
    Running,
}

/// Owns the timebase task and the start/stop/configure state machine.
///
/// Transitions are serialized through `&mut self`; they run in the caller's
/// (consumer-side) context, never the producer's. The controller is the
/// producer end of a strict single-producer/single-consumer pair whose
/// consumer end is the [`ConsumerGateway`] returned by [`new`](Self::new).
pub struct AcquisitionController {
    shared: Arc<Shared>,
    period: Duration,
    divisor: u32,
    state: AcquisitionState,
    task_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl AcquisitionController {
    /// Build a stopped pipeline from configuration, returning the controller
    /// and the single consumer gateway attached to its buffer.
    pub fn new(config: &PulseDaqConfig) -> Result<(Self, ConsumerGateway), ControlError> {
        let capacity = config.buffer.capacity;
        if !capacity.is_power_of_two() || capacity < 2 {
            return Err(ControlError::InvalidCapacity(capacity));
        }
        if config.timebase.samples_divisor == 0 {
            return Err(ControlError::InvalidDivisor);
        }

        let shared = Shared::new(capacity);
        let gateway = ConsumerGateway::new(Arc::clone(&shared));
        let controller = Self {
            shared,
            period: config.timebase.period,
            divisor: config.timebase.samples_divisor,
            state: AcquisitionState::Stopped,
            task_handle: None,
            shutdown_tx: None,
        };
        Ok((controller, gateway))
    }

    /// Start (or restart) the measurement.
    ///
    /// Restarting while running is allowed and re-initializes: the previous
    /// timebase is quiesced first, then the tick counter and the acquisition
    /// start time reset with the new task, and the event accumulator is
    /// cleared while the source is masked so events from before the restart
    /// cannot leak into the first sample of the new run. Samples already
    /// buffered are kept for the consumer.
    pub async fn start(&mut self) -> Result<(), ControlError> {
        self.halt_sampler().await;

        let accu = &self.shared.accumulator;
        accu.mask();
        let stale = accu.drain_and_reset();
        if stale > 0 {
            debug!(stale, "discarded events accumulated before start");
        }
        accu.unmask();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        // The acquisition start time is taken here, not at the task's first
        // poll, so elapsed time is measured from the start call itself.
        let task = sampler::run(
            Arc::clone(&self.shared),
            self.period,
            self.divisor,
            tokio::time::Instant::now(),
            shutdown_rx,
        );
        self.task_handle = Some(tokio::spawn(task));
        self.shutdown_tx = Some(shutdown_tx);
        self.state = AcquisitionState::Running;

        info!(period = ?self.period, divisor = self.divisor, "acquisition started");
        Ok(())
    }

    /// Stop the measurement. Idempotent, valid from any state.
    ///
    /// Cancels the timebase and waits for an in-flight firing to finish, so
    /// on return the pipeline is quiesced: no sample production races the
    /// caller. A consumer blocked in `read` is woken and handed whatever is
    /// already buffered.
    pub async fn stop(&mut self) -> Result<(), ControlError> {
        self.halt_sampler().await;
        self.state = AcquisitionState::Stopped;
        self.shared.stop_gen.send_modify(|g| *g = g.wrapping_add(1));
        info!("acquisition stopped");
        Ok(())
    }

    /// Set the number of timebase ticks per produced sample.
    ///
    /// Rejects zero without touching any state. Otherwise the pipeline is
    /// stopped first, the divisor applied, and the controller left
    /// `Stopped`; the new value takes effect on the next `start`.
    pub async fn configure(&mut self, divisor: u32) -> Result<(), ControlError> {
        if divisor == 0 {
            return Err(ControlError::InvalidDivisor);
        }
        self.stop().await?;
        self.divisor = divisor;
        info!(divisor, "samples divisor configured");
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Configured ticks-per-sample divisor.
    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    /// Handle for the event source feeding this pipeline.
    pub fn event_input(&self) -> EventInput {
        EventInput {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Copy of the producer-side diagnostic counters.
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.shared.diag.snapshot()
    }

    /// Signal the sampler task and wait until it has fully exited.
    async fn halt_sampler(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            if let Err(err) = handle.await {
                tracing::error!(?err, "sampler task did not exit cleanly");
            }
        }
    }
}

impl Drop for AcquisitionController {
    fn drop(&mut self) {
        // Dropping the shutdown sender is enough: the sampler loop exits as
        // soon as the channel closes. The task cannot be awaited here.
        self.shutdown_tx.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PulseDaqConfig;

    fn test_config() -> PulseDaqConfig {
        let mut config = PulseDaqConfig::default();
        config.timebase.period = Duration::from_millis(10);
        config
    }

    #[tokio::test]
    async fn test_configure_rejects_zero_divisor() {
        let (mut controller, _gateway) =
            AcquisitionController::new(&test_config()).unwrap();
        assert_eq!(
            controller.configure(0).await,
            Err(ControlError::InvalidDivisor)
        );
        // State untouched by the rejected call.
        assert_eq!(controller.state(), AcquisitionState::Stopped);
        assert_eq!(controller.divisor(), 1);
    }

    #[tokio::test]
    async fn test_configure_while_running_leaves_stopped() {
        let (mut controller, _gateway) =
            AcquisitionController::new(&test_config()).unwrap();
        controller.start().await.unwrap();
        assert_eq!(controller.state(), AcquisitionState::Running);

        controller.configure(4).await.unwrap();
        assert_eq!(controller.state(), AcquisitionState::Stopped);
        assert_eq!(controller.divisor(), 4);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (mut controller, _gateway) =
            AcquisitionController::new(&test_config()).unwrap();
        controller.stop().await.unwrap();
        controller.start().await.unwrap();
        controller.stop().await.unwrap();
        controller.stop().await.unwrap();
        assert_eq!(controller.state(), AcquisitionState::Stopped);
    }

    #[tokio::test]
    async fn test_invalid_capacity_rejected() {
        let mut config = test_config();
        config.buffer.capacity = 100;
        assert!(matches!(
            AcquisitionController::new(&config),
            Err(ControlError::InvalidCapacity(100))
        ));
    }
}

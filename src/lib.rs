//! `pulse-daq`
//!
//! Pulse-counting data acquisition: discrete hardware events are counted in
//! an interrupt-safe accumulator, aggregated into fixed-period samples by a
//! monotonic timebase task, buffered in a bounded single-producer /
//! single-consumer ring, and drained by one consumer through a blocking or
//! non-blocking gateway.
//!
//! ## Architecture
//!
//! ```text
//! pulse source -> EventAccumulator -> PeriodicSampler -> RingBuffer -> ConsumerGateway
//!  (any context,    (atomic counter)    (timer task)      (SPSC ring)    (blocking /
//!   lock-free)                                                            non-blocking)
//! ```
//!
//! The producer side never blocks: a full buffer drops the sample and
//! counts the drop; timer overruns are detected against the monotonic clock
//! and counted. The consumer side drains batches through a two-phase read
//! protocol whose bulk copy runs outside any lock.
//!
//! ## Key Types
//!
//! - [`AcquisitionController`]: start/stop/configure state machine, owns
//!   the timebase task
//! - [`ConsumerGateway`]: the single consumer's read surface
//! - [`EventInput`]: lock-free handle for the event source
//! - [`RingBuffer`]: the bounded SPSC sample store
//! - [`PulseDaqConfig`]: TOML + environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use pulse_daq::{AcquisitionController, PulseDaqConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PulseDaqConfig::default();
//! let (mut controller, mut gateway) = AcquisitionController::new(&config)?;
//!
//! let input = controller.event_input();
//! controller.start().await?;
//! input.record_event();
//!
//! let samples = gateway.read(64, true).await?;
//! for sample in &samples {
//!     println!("{}", pulse_daq::codec::encode(sample).trim_end());
//! }
//! controller.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod ring;
pub mod sample;
mod sampler;
pub mod source;
pub mod telemetry;

pub use accumulator::EventAccumulator;
pub use config::PulseDaqConfig;
pub use controller::{AcquisitionController, AcquisitionState};
pub use error::{CodecError, ControlError, ReadError};
pub use gateway::{ConsumerGateway, ReadInterrupt};
pub use pipeline::{DiagnosticsSnapshot, EventInput};
pub use ring::{Full, ReadBatch, RingBuffer};
pub use sample::Sample;
pub use source::MockPulseSource;

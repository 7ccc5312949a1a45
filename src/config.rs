//! Configuration loading for the acquisition pipeline.
//!
//! Configuration is loaded from a TOML file merged with environment
//! variables prefixed `PULSE_DAQ_` (double underscore separating nested
//! keys, e.g. `PULSE_DAQ_TIMEBASE__SAMPLES_DIVISOR=10`). Every field has a
//! default, so an empty file and no file at all are both valid.

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseDaqConfig {
    /// Application-level settings.
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Timebase settings.
    #[serde(default)]
    pub timebase: TimebaseConfig,
    /// Sample buffer settings.
    #[serde(default)]
    pub buffer: BufferConfig,
    /// Simulated pulse source settings.
    #[serde(default)]
    pub source: SourceConfig,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Default logging directive (trace, debug, info, warn, error),
    /// overridable via `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Timebase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimebaseConfig {
    /// Nominal sampling period, in humane form (e.g. "1s", "250ms").
    #[serde(with = "humantime_serde", default = "default_period")]
    pub period: Duration,
    /// Timebase ticks per produced sample. Must be at least 1.
    #[serde(default = "default_divisor")]
    pub samples_divisor: u32,
}

/// Sample buffer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Slot count of the sample ring buffer. Must be a power of two of at
    /// least 2; one slot stays empty, so `capacity - 1` samples fit.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Simulated pulse source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Mean simulated pulse rate in events per second.
    #[serde(default = "default_mean_rate")]
    pub mean_rate_hz: f64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_period() -> Duration {
    Duration::from_secs(1)
}

fn default_divisor() -> u32 {
    1
}

fn default_capacity() -> usize {
    256
}

fn default_mean_rate() -> f64 {
    25.0
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for TimebaseConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            samples_divisor: default_divisor(),
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mean_rate_hz: default_mean_rate(),
        }
    }
}

impl PulseDaqConfig {
    /// Load configuration from `config/pulse.toml` and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/pulse.toml")
    }

    /// Load configuration from a specific file path and the environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PULSE_DAQ_").split("__"))
            .extract()
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.timebase.period.is_zero() {
            return Err("timebase.period must be greater than zero".to_string());
        }

        if self.timebase.samples_divisor == 0 {
            return Err("timebase.samples_divisor must be at least 1".to_string());
        }

        if !self.buffer.capacity.is_power_of_two() || self.buffer.capacity < 2 {
            return Err(format!(
                "buffer.capacity must be a power of two >= 2, got {}",
                self.buffer.capacity
            ));
        }

        if !self.source.mean_rate_hz.is_finite() || self.source.mean_rate_hz <= 0.0 {
            return Err("source.mean_rate_hz must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PulseDaqConfig::default();
        config.validate().unwrap();
        assert_eq!(config.timebase.period, Duration::from_secs(1));
        assert_eq!(config.timebase.samples_divisor, 1);
        assert_eq!(config.buffer.capacity, 256);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [application]
            log_level = "debug"

            [timebase]
            period = "250ms"
            samples_divisor = 4

            [buffer]
            capacity = 64

            [source]
            mean_rate_hz = 100.0
            "#
        )
        .unwrap();

        let config = PulseDaqConfig::load_from(file.path()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.timebase.period, Duration::from_millis(250));
        assert_eq!(config.timebase.samples_divisor, 4);
        assert_eq!(config.buffer.capacity, 64);
        assert_eq!(config.source.mean_rate_hz, 100.0);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = PulseDaqConfig::load_from("/nonexistent/pulse.toml").unwrap();
        config.validate().unwrap();
        assert_eq!(config.timebase.samples_divisor, 1);
    }

    #[test]
    fn test_validate_rejects_zero_divisor() {
        let mut config = PulseDaqConfig::default();
        config.timebase.samples_divisor = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_power_of_two_capacity() {
        let mut config = PulseDaqConfig::default();
        config.buffer.capacity = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = PulseDaqConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}

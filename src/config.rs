//! Configuration System using Figment
//!
//! Configuration is loaded from:
//! 1. a TOML file (base configuration)
//! 2. Environment variables (prefixed with `GRBL_`, nested keys split on `__`)
//!
//! # Environment Variable Overrides
//!
//! ```text
//! GRBL_MACHINE__PORT=/dev/ttyACM0
//! GRBL_MACHINE__BAUD_RATE=9600
//! GRBL_MACHINE__PRE_MOVE_DELAY=250ms
//! GRBL_APPLICATION__LOG_LEVEL=debug
//! ```
//!
//! # Example File
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [machine]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600     # GRBL 0.8
//! feed_rate = 200.0
//! read_timeout = "1s"
//!
//! [chamber]
//! shape = "cylinder3d"
//! radius = 50.0
//! height = 100.0
//! padding = 10.0
//! target_radius = 25.0
//! target_height = 50.0
//! ```

use crate::controller::ControllerSettings;
use crate::error::{GrblError, Result};
use crate::geometry::SafetyEnvelope;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "GRBL_";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub application: ApplicationConfig,
    pub machine: MachineConfig,
    pub chamber: SafetyEnvelope,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Serial link and motion timing for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Serial port (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Linear move feed rate in mm/min
    #[serde(default = "default_feed_rate")]
    pub feed_rate: f64,
    #[serde(default = "default_read_timeout", with = "humantime_serde")]
    pub read_timeout: Duration,
    #[serde(default = "default_settle_delay", with = "humantime_serde")]
    pub settle_delay: Duration,
    #[serde(default = "default_pre_move_delay", with = "humantime_serde")]
    pub pre_move_delay: Duration,
    #[serde(default, with = "humantime_serde")]
    pub post_move_delay: Duration,
    #[serde(default, with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(
        default,
        with = "humantime_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_move_wait: Option<Duration>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_feed_rate() -> f64 {
    400.0
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_settle_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_pre_move_delay() -> Duration {
    Duration::from_millis(500)
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: default_baud_rate(),
            feed_rate: default_feed_rate(),
            read_timeout: default_read_timeout(),
            settle_delay: default_settle_delay(),
            pre_move_delay: default_pre_move_delay(),
            post_move_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            max_move_wait: None,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            machine: MachineConfig::default(),
            chamber: SafetyEnvelope::circle_2d(140.0, 20.0, 20.0),
        }
    }
}

impl From<&MachineConfig> for ControllerSettings {
    fn from(machine: &MachineConfig) -> Self {
        ControllerSettings {
            baud_rate: machine.baud_rate,
            feed_rate: machine.feed_rate,
            read_timeout: machine.read_timeout,
            settle_delay: machine.settle_delay,
            pre_move_delay: machine.pre_move_delay,
            post_move_delay: machine.post_move_delay,
            poll_interval: machine.poll_interval,
            max_move_wait: machine.max_move_wait,
        }
    }
}

impl StageConfig {
    /// Load from `path`, apply `GRBL_` environment overrides, then validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: StageConfig = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without environment overrides.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StageConfig = Figment::new().merge(Toml::string(content)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GrblError::Configuration(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.machine.port.trim().is_empty() {
            return Err(GrblError::Configuration(
                "machine.port must not be empty".to_string(),
            ));
        }
        if self.machine.baud_rate == 0 {
            return Err(GrblError::Configuration(
                "machine.baud_rate must be positive".to_string(),
            ));
        }
        if !self.machine.feed_rate.is_finite() || self.machine.feed_rate <= 0.0 {
            return Err(GrblError::Configuration(format!(
                "machine.feed_rate must be a positive number, got {}",
                self.machine.feed_rate
            )));
        }
        Ok(())
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings::from(&self.machine)
    }
}

//! Custom error types for the stage controller.
//!
//! This module defines the primary error type, `GrblError`, for the whole crate.
//! Using the `thiserror` crate, it gives one consistent place for everything that
//! can go wrong between the host and the motion stage, from opening the serial
//! port to the firmware rejecting a command.
//!
//! ## Error Hierarchy
//!
//! - **`Connection`**: the transport could not be opened. The controller has to be
//!   reconstructed to try again.
//! - **`Command`**: the firmware answered a command with something other than `ok`
//!   or a status frame. Carries the offending command text.
//! - **`OriginNotSet`** / **`OutOfBounds`**: precondition and safety-envelope
//!   violations raised before (or during) motion.
//! - **`MalformedStatus`** / **`Timeout`**: problems seen while polling a move.
//! - **`CsvFormat`**: a point file could not be turned into points.
//! - **`Config`** / **`Configuration`**: loading and semantic validation failures of
//!   the deployment configuration.
//!
//! None of these are retried by the library. Operator intervention is expected for
//! `OutOfBounds` and `Command`.

use crate::geometry::Point;
use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, GrblError>;

#[derive(Error, Debug)]
pub enum GrblError {
    #[error("Failed to connect to '{address}': {reason}")]
    Connection { address: String, reason: String },

    #[error("Command '{command}' rejected by firmware: {response}")]
    Command { command: String, response: String },

    #[error("Origin has not been set; call set_origin() before moving")]
    OriginNotSet,

    #[error("Position {point} is outside the safety envelope")]
    OutOfBounds { point: Point },

    #[error("Malformed status frame: {0}")]
    MalformedStatus(String),

    #[error("Move did not reach Idle within {waited:?}")]
    Timeout { waited: Duration },

    #[error("CSV format error: {0}")]
    CsvFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("Serial support not enabled. Rebuild with --features instrument_serial")]
    SerialFeatureDisabled,
}

impl From<figment::Error> for GrblError {
    fn from(err: figment::Error) -> Self {
        GrblError::Config(Box::new(err))
    }
}

impl GrblError {
    /// True for errors that mean the stage may be somewhere it should not be.
    pub fn needs_operator(&self) -> bool {
        matches!(self, GrblError::OutOfBounds { .. } | GrblError::Command { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GrblError::Command {
            command: "G1 F400 X1 Y2 Z0".to_string(),
            response: "error:22".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command 'G1 F400 X1 Y2 Z0' rejected by firmware: error:22"
        );
    }

    #[test]
    fn test_out_of_bounds_display() {
        let err = GrblError::OutOfBounds {
            point: Point::new(1.0, 2.0, 3.0),
        };
        assert!(err.to_string().contains("(1, 2, 3)"));
    }

    #[test]
    fn test_needs_operator() {
        assert!(GrblError::OutOfBounds {
            point: Point::default()
        }
        .needs_operator());
        assert!(!GrblError::OriginNotSet.needs_operator());
        assert!(!GrblError::CsvFormat("bad".into()).needs_operator());
    }
}

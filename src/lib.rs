//! Core library for the grbl_stage controller.
//!
//! This library drives a cartesian/cylindrical motion stage running GRBL-class
//! firmware over a serial link. It turns target positions into G-code, keeps
//! every commanded and in-flight position inside a chamber safety envelope, and
//! polls machine status until each move completes. It is used by the
//! `grbl_stage` command-line tool.

pub mod adapters;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod geometry;
pub mod protocol;

pub use config::StageConfig;
pub use controller::{ControllerSettings, GrblController};
pub use error::{GrblError, Result};
pub use geometry::{Point, SafetyEnvelope};

//! Configuration file and environment override loading.
//!
//! Tests that set GRBL_* variables run serially so they cannot leak into each other.

use grbl_stage::{GrblError, SafetyEnvelope, StageConfig};
use serial_test::serial;
use std::time::Duration;
use tempfile::NamedTempFile;

const STAGE_TOML: &str = r#"
[application]
log_level = "debug"

[machine]
port = "COM3"
baud_rate = 9600
feed_rate = 200.0

[chamber]
shape = "cylinder3d"
radius = 50.0
height = 100.0
padding = 10.0
target_radius = 25.0
target_height = 50.0
"#;

/// Creates a temporary configuration file.
fn create_temp_config(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), content).unwrap();
    file
}

#[test]
#[serial]
fn test_load_from_file() {
    let file = create_temp_config(STAGE_TOML);
    let config = StageConfig::load(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.machine.port, "COM3");
    assert_eq!(
        config.chamber,
        SafetyEnvelope::cylinder_3d(50.0, 100.0, 10.0, 25.0, 50.0)
    );

    let settings = config.controller_settings();
    assert_eq!(settings.baud_rate, 9600);
    assert_eq!(settings.feed_rate, 200.0);
    assert_eq!(settings.read_timeout, Duration::from_secs(1));
    assert_eq!(settings.max_move_wait, None);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let file = create_temp_config(STAGE_TOML);

    std::env::set_var("GRBL_MACHINE__PORT", "/dev/ttyACM0");
    std::env::set_var("GRBL_MACHINE__BAUD_RATE", "115200");
    std::env::set_var("GRBL_MACHINE__PRE_MOVE_DELAY", "250ms");
    let result = StageConfig::load(file.path());
    std::env::remove_var("GRBL_MACHINE__PORT");
    std::env::remove_var("GRBL_MACHINE__BAUD_RATE");
    std::env::remove_var("GRBL_MACHINE__PRE_MOVE_DELAY");

    let config = result.unwrap();
    assert_eq!(config.machine.port, "/dev/ttyACM0");
    assert_eq!(config.machine.baud_rate, 115_200);
    assert_eq!(config.machine.pre_move_delay, Duration::from_millis(250));
    // Untouched values still come from the file
    assert_eq!(config.machine.feed_rate, 200.0);
}

#[test]
#[serial]
fn test_invalid_override_fails_validation() {
    let file = create_temp_config(STAGE_TOML);

    std::env::set_var("GRBL_MACHINE__FEED_RATE", "-5");
    let result = StageConfig::load(file.path());
    std::env::remove_var("GRBL_MACHINE__FEED_RATE");

    assert!(matches!(result, Err(GrblError::Configuration(_))));
}

#[test]
#[serial]
fn test_missing_file_without_env_fails() {
    let result = StageConfig::load("/nonexistent/grbl_stage.toml");
    assert!(matches!(result, Err(GrblError::Config(_))));
}

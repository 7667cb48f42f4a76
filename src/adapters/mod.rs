//! Transport adapters
//!
//! This module contains implementations of the [`Transport`] trait, the low-level
//! line-oriented I/O channel the controller talks GRBL over.
//!
//! - [`SerialTransport`] for a real stage on an RS-232/USB serial port
//! - [`MockTransport`] for scripted tests
//! - [`SimulatedGrbl`] for running the full protocol without hardware

pub mod mock;
#[cfg(feature = "instrument_serial")]
pub mod serial_adapter;

pub use mock::{MockHandle, MockTransport, SimulatedGrbl};
#[cfg(feature = "instrument_serial")]
pub use serial_adapter::SerialTransport;

use crate::error::Result;
use async_trait::async_trait;

/// Duplex byte stream with line-based reads.
///
/// `read_lines` returns whatever complete lines are available before the read
/// timeout expires, with line terminators stripped. Silence is an empty vector,
/// not an error.
#[async_trait]
pub trait Transport: Send {
    fn name(&self) -> &str;

    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    async fn read_lines(&mut self) -> Result<Vec<String>>;

    /// Discard any buffered input.
    async fn clear_input(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.write(format!("{}\n", line).as_bytes()).await
    }
}

/// Split raw bytes into lines, dropping `\r\n` terminators and blank lines.
pub(crate) fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

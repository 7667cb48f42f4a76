use super::{split_lines, Transport};
use crate::error::{GrblError, Result};
use async_trait::async_trait;
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Serial transport for RS-232/USB communication
///
/// This adapter wraps the serialport crate and provides async I/O
/// using Tokio's blocking task executor for synchronous serial operations.
pub struct SerialTransport {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    port_name: String,

    /// Baud rate (e.g., 9600 for GRBL 0.8, 115200 for GRBL 1.1)
    baud_rate: u32,

    /// The actual serial port (behind Arc<Mutex> for async access)
    port: Option<Arc<Mutex<Box<dyn SerialPort>>>>,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `port_name` - Serial port path (e.g., "/dev/ttyUSB0", "COM3")
    /// * `baud_rate` - Communication speed
    /// * `read_timeout` - How long a read waits for data before reporting silence
    ///
    /// # Errors
    /// Returns `GrblError::Connection` if the port cannot be opened
    pub fn open(port_name: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(read_timeout)
            .open()
            .map_err(|e| GrblError::Connection {
                address: port_name.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Serial port '{}' opened at {} baud", port_name, baud_rate);

        Ok(Self {
            port_name: port_name.to_string(),
            baud_rate,
            port: Some(Arc::new(Mutex::new(port))),
        })
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn port(&self) -> Result<Arc<Mutex<Box<dyn SerialPort>>>> {
        self.port.clone().ok_or_else(|| {
            GrblError::Io(std::io::Error::new(
                ErrorKind::NotConnected,
                format!("serial port '{}' is closed", self.port_name),
            ))
        })
    }
}

fn join_error(err: tokio::task::JoinError) -> GrblError {
    GrblError::Io(std::io::Error::other(format!(
        "Serial I/O task panicked: {}",
        err
    )))
}

#[async_trait]
impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.port_name
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port()?;
        let payload = bytes.to_vec();

        // Execute blocking serial I/O on dedicated thread
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut port_guard = port.blocking_lock();
            port_guard.write_all(&payload)?;
            port_guard.flush()?;
            Ok(())
        })
        .await
        .map_err(join_error)??;

        debug!(
            "Sent serial bytes: {:?}",
            String::from_utf8_lossy(bytes).trim_end()
        );
        Ok(())
    }

    async fn read_lines(&mut self) -> Result<Vec<String>> {
        let port = self.port()?;

        // Read until the port goes quiet for one full timeout
        let received = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let mut port_guard = port.blocking_lock();
            let mut received = Vec::new();
            let mut buffer = [0u8; 256];

            loop {
                match port_guard.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => received.extend_from_slice(&buffer[..n]),
                    Err(e) if e.kind() == ErrorKind::TimedOut => break,
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(received)
        })
        .await
        .map_err(join_error)??;

        let lines = split_lines(&received);
        debug!("Received serial lines: {:?}", lines);
        Ok(lines)
    }

    async fn clear_input(&mut self) -> Result<()> {
        let port = self.port()?;
        tokio::task::spawn_blocking(move || -> Result<()> {
            port.blocking_lock()
                .clear(ClearBuffer::Input)
                .map_err(|e| GrblError::Io(std::io::Error::other(e.to_string())))
        })
        .await
        .map_err(join_error)?
    }

    async fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!("Serial port '{}' closed", self.port_name);
        }
        Ok(())
    }
}

//! GRBL motion-stage controller.
//!
//! [`GrblController`] sequences origin setting, move commands and status polling
//! over a [`Transport`], and keeps every commanded and reported position inside a
//! [`SafetyEnvelope`].
//!
//! ## Lifecycle
//!
//! ```text
//! connect ──► Connected (origin not set) ──set_origin──► Ready ──move_to──► Moving
//!                   ▲  │ set_origin error                  ▲                 │
//!                   └──┘                                   └─────────────────┘
//! ```
//!
//! A failed `set_origin` leaves the controller connected and retryable. A failed
//! move returns the controller to Ready; if the failure happened while polling, a
//! feed hold has already been sent.
//!
//! # Example
//!
//! ```no_run
//! use grbl_stage::{ControllerSettings, GrblController, Point, SafetyEnvelope};
//!
//! #[tokio::main]
//! async fn main() -> grbl_stage::Result<()> {
//!     let envelope = SafetyEnvelope::circle_2d(140.0, 20.0, 20.0);
//!     let mut stage =
//!         GrblController::connect("/dev/ttyUSB0", envelope, ControllerSettings::default()).await?;
//!     stage.set_origin().await?;
//!     stage.move_to(Point::planar(10.0, 10.0)).await?;
//!     stage.close().await
//! }
//! ```

use crate::adapters::Transport;
use crate::error::{GrblError, Result};
use crate::geometry::{Point, SafetyEnvelope};
use crate::protocol::{self, MachineState, MachineStatus, ResponseLine};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Per-deployment tuning of the controller.
///
/// Different firmware builds need different values here (GRBL 0.8 talks at 9600
/// baud, GRBL 1.1 at 115200).
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub baud_rate: u32,
    /// Feed rate for linear moves, mm/min.
    pub feed_rate: f64,
    /// How long a read waits before reporting silence.
    pub read_timeout: Duration,
    /// Wait after the wake sequence before clearing input.
    pub settle_delay: Duration,
    /// Wait before every move, so measurement equipment can finish.
    pub pre_move_delay: Duration,
    /// Wait after the stage reports Idle.
    pub post_move_delay: Duration,
    /// Sleep between status queries.
    pub poll_interval: Duration,
    /// Upper bound on waiting for Idle. `None` waits indefinitely.
    pub max_move_wait: Option<Duration>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            feed_rate: 400.0,
            read_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
            pre_move_delay: Duration::from_millis(500),
            post_move_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            max_move_wait: None,
        }
    }
}

/// Host-side controller for one GRBL stage.
///
/// Not shareable between tasks without external locking: every operation takes
/// `&mut self` and the protocol exchange is strictly request/response.
pub struct GrblController {
    transport: Box<dyn Transport>,
    envelope: SafetyEnvelope,
    settings: ControllerSettings,
    origin_set: bool,
    last_position: Option<Point>,
}

impl GrblController {
    /// Open the serial port at `address` and wake the firmware.
    ///
    /// # Errors
    /// `GrblError::Connection` if the port cannot be opened.
    pub async fn connect(
        address: &str,
        envelope: SafetyEnvelope,
        settings: ControllerSettings,
    ) -> Result<Self> {
        #[cfg(feature = "instrument_serial")]
        {
            let transport = crate::adapters::SerialTransport::open(
                address,
                settings.baud_rate,
                settings.read_timeout,
            )?;
            Self::with_transport(Box::new(transport), envelope, settings).await
        }

        #[cfg(not(feature = "instrument_serial"))]
        {
            let _ = (address, envelope, settings);
            Err(GrblError::SerialFeatureDisabled)
        }
    }

    /// Wrap an already-open transport: send the wake sequence, let the firmware
    /// settle and discard its start-up banner.
    pub async fn with_transport(
        mut transport: Box<dyn Transport>,
        envelope: SafetyEnvelope,
        settings: ControllerSettings,
    ) -> Result<Self> {
        if envelope.is_degenerate() {
            warn!(
                "Safety envelope {:?} has no interior; every move will be rejected",
                envelope
            );
        }

        transport.write(protocol::WAKE_SEQUENCE).await?;
        sleep(settings.settle_delay).await;
        transport.clear_input().await?;

        info!("Connected to GRBL stage on '{}'", transport.name());

        Ok(Self {
            transport,
            envelope,
            settings,
            origin_set: false,
            last_position: None,
        })
    }

    pub fn is_origin_set(&self) -> bool {
        self.origin_set
    }

    /// Last commanded or reported position, `None` before the origin is set.
    pub fn last_position(&self) -> Option<Point> {
        self.last_position
    }

    pub fn envelope(&self) -> &SafetyEnvelope {
        &self.envelope
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Make the current machine position the origin, in absolute millimetres.
    pub async fn set_origin(&mut self) -> Result<()> {
        for command in [
            protocol::ABSOLUTE_POSITIONING,
            protocol::ZERO_ORIGIN,
            protocol::UNITS_MM,
        ] {
            self.send_command(command).await?;
        }

        self.origin_set = true;
        self.last_position = Some(Point::ORIGIN);
        info!("Origin set at current machine position");
        Ok(())
    }

    /// Write `command` and collect every line the firmware sends back.
    ///
    /// Each line must be `ok` or a status frame; anything else fails the call with
    /// `GrblError::Command` naming `command`.
    pub async fn send_command(&mut self, command: &str) -> Result<Vec<String>> {
        self.transport.write_line(command).await?;
        debug!("Sent command: {}", command);

        let lines = self.transport.read_lines().await?;
        for line in &lines {
            if let ResponseLine::Rejected(response) = protocol::classify(line) {
                return Err(GrblError::Command {
                    command: command.to_string(),
                    response: response.to_string(),
                });
            }
        }
        debug!("Response to '{}': {:?}", command, lines);
        Ok(lines)
    }

    /// Move to `target` and block until the stage reports Idle.
    ///
    /// # Errors
    /// - `OriginNotSet` before a successful [`set_origin`](Self::set_origin)
    /// - `OutOfBounds` if `target` is outside the envelope (nothing is sent), or if
    ///   the stage reports an outside position while running (a feed hold is sent)
    /// - `Command`, `MalformedStatus`, `Timeout` from the polling loop, also
    ///   followed by a feed hold
    pub async fn move_to(&mut self, target: Point) -> Result<()> {
        if !self.origin_set {
            return Err(GrblError::OriginNotSet);
        }
        if !self.envelope.is_valid(&target) {
            warn!("Rejected move to {}: outside safety envelope", target);
            return Err(GrblError::OutOfBounds { point: target });
        }

        sleep(self.settings.pre_move_delay).await;

        let command = protocol::linear_move(self.settings.feed_rate, &target);
        self.send_command(&command).await?;
        info!("Moving to {}", target);

        if let Err(err) = self.wait_for_idle().await {
            self.emergency_stop(&err).await;
            return Err(err);
        }

        sleep(self.settings.post_move_delay).await;
        self.last_position = Some(target);
        info!("Reached {}", target);
        Ok(())
    }

    /// Send a feed hold (`!`).
    pub async fn feed_hold(&mut self) -> Result<()> {
        self.send_command(protocol::FEED_HOLD).await.map(|_| ())
    }

    /// Release the transport.
    pub async fn close(mut self) -> Result<()> {
        info!("Closing connection to '{}'", self.transport.name());
        self.transport.close().await
    }

    /// Poll status until Idle. Any error return leaves the machine possibly moving.
    async fn wait_for_idle(&mut self) -> Result<()> {
        let started = Instant::now();

        loop {
            if let Some(limit) = self.settings.max_move_wait {
                let waited = started.elapsed();
                if waited > limit {
                    return Err(GrblError::Timeout { waited });
                }
            }

            let lines = self.send_command(protocol::STATUS_QUERY).await?;
            for line in &lines {
                let Some(status) = MachineStatus::parse(line) else {
                    continue;
                };

                match status.state {
                    MachineState::Running => {
                        let position = status
                            .position
                            .ok_or_else(|| GrblError::MalformedStatus(line.clone()))?;
                        if !self.envelope.is_valid(&position) {
                            return Err(GrblError::OutOfBounds { point: position });
                        }
                        self.last_position = Some(position);
                    }
                    MachineState::Idle => return Ok(()),
                    MachineState::Other(_) => {}
                }
            }

            if !self.settings.poll_interval.is_zero() {
                sleep(self.settings.poll_interval).await;
            }
        }
    }

    async fn emergency_stop(&mut self, cause: &GrblError) {
        warn!("Sending feed hold: {}", cause);
        if let Err(e) = self.feed_hold().await {
            error!("Feed hold failed: {}", e);
        }
    }
}

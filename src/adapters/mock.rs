//! Mock transport implementations
//!
//! Provides simulated firmware endpoints for testing without a physical stage.
//! Neither mock sleeps: a status query is answered immediately.
//!
//! # Available Mocks
//!
//! - `MockTransport` - Scripted replies, one batch per written command
//! - `SimulatedGrbl` - Behavioural GRBL model that walks a tool head to each target

use super::Transport;
use crate::error::{GrblError, Result};
use crate::geometry::Point;
use crate::protocol::{self, MachineState};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

// =============================================================================
// MockTransport - Scripted Replies
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    written: Vec<String>,
    replies: VecDeque<Vec<String>>,
    default_reply: Vec<String>,
    pending: Vec<String>,
    input_clears: usize,
    closed: bool,
}

/// Transport that answers each written command with the next queued reply batch.
///
/// Writes that carry no command (the wake sequence) do not consume a reply. When
/// the queue runs dry the default reply is used, which starts out as silence.
///
/// # Example
///
/// ```rust,ignore
/// let (transport, handle) = MockTransport::with_handle();
/// handle.queue_reply(&["ok"]).await;
/// handle.queue_reply(&["<Idle|MPos:0.000,0.000,0.000|FS:0,0>"]).await;
/// ```
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Test-side view of a [`MockTransport`] that has been handed to a controller.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn with_handle() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: state.clone(),
            },
            MockHandle { state },
        )
    }
}

impl MockHandle {
    pub async fn queue_reply(&self, lines: &[&str]) {
        let batch = lines.iter().map(|l| l.to_string()).collect();
        self.state.lock().await.replies.push_back(batch);
    }

    /// Reply used once the queue is empty.
    pub async fn set_default_reply(&self, lines: &[&str]) {
        self.state.lock().await.default_reply = lines.iter().map(|l| l.to_string()).collect();
    }

    /// Every command written so far, without its trailing newline.
    pub async fn commands(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .written
            .iter()
            .map(|w| w.trim_end_matches('\n').to_string())
            .filter(|w| !w.trim().is_empty())
            .collect()
    }

    /// Raw writes, including the wake sequence.
    pub async fn raw_writes(&self) -> Vec<String> {
        self.state.lock().await.written.clone()
    }

    pub async fn count_of(&self, command: &str) -> usize {
        self.commands()
            .await
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    pub async fn input_clears(&self) -> usize {
        self.state.lock().await.input_clears
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(GrblError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "mock transport is closed",
            )));
        }
        if !text.trim().is_empty() {
            let reply = match state.replies.pop_front() {
                Some(batch) => batch,
                None => state.default_reply.clone(),
            };
            state.pending.extend(reply);
        }
        state.written.push(text);
        Ok(())
    }

    async fn read_lines(&mut self) -> Result<Vec<String>> {
        Ok(std::mem::take(&mut self.state.lock().await.pending))
    }

    async fn clear_input(&mut self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.pending.clear();
        state.input_clears += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().await.closed = true;
        Ok(())
    }
}

// =============================================================================
// SimulatedGrbl - Behavioural Firmware Model
// =============================================================================

/// GRBL firmware model with a virtual tool head.
///
/// Simulates a stage with:
/// - `ok` for the supported G-code subset, `error:20` for anything else
/// - straight-line motion of `step_mm` per status query
/// - feed hold (`!`) stops motion where it is
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimulatedGrbl::new();
/// let controller = GrblController::with_transport(Box::new(sim), envelope, settings).await?;
/// ```
pub struct SimulatedGrbl {
    position: Point,
    target: Option<Point>,
    step_mm: f64,
    held: bool,
    pending: Vec<String>,
}

impl SimulatedGrbl {
    /// Create a simulator at the machine origin moving 5mm per status query.
    pub fn new() -> Self {
        Self::with_step(5.0)
    }

    /// Create a simulator with a custom distance travelled per status query.
    pub fn with_step(step_mm: f64) -> Self {
        Self {
            position: Point::ORIGIN,
            target: None,
            step_mm,
            held: false,
            pending: Vec::new(),
        }
    }

    fn state(&self) -> MachineState {
        if self.held {
            MachineState::Other("Hold:0".to_string())
        } else if self.target.is_some() {
            MachineState::Running
        } else {
            MachineState::Idle
        }
    }

    fn advance(&mut self) {
        let Some(target) = self.target else { return };
        if self.held {
            return;
        }
        let remaining = self.position.distance_to(&target);
        if remaining <= self.step_mm {
            self.position = target;
            self.target = None;
        } else {
            let t = self.step_mm / remaining;
            self.position = Point::new(
                self.position.x + (target.x - self.position.x) * t,
                self.position.y + (target.y - self.position.y) * t,
                self.position.z + (target.z - self.position.z) * t,
            );
        }
    }

    fn respond(&mut self, line: &str) -> Option<String> {
        match line {
            protocol::STATUS_QUERY => {
                // Report first so the final leg of a move is seen as Run
                let frame = protocol::format_status(&self.state(), &self.position);
                self.advance();
                Some(frame)
            }
            protocol::FEED_HOLD => {
                self.held = self.target.is_some();
                None
            }
            protocol::ABSOLUTE_POSITIONING | protocol::UNITS_MM => Some(protocol::ACK.into()),
            protocol::ZERO_ORIGIN => {
                self.position = Point::ORIGIN;
                Some(protocol::ACK.into())
            }
            move_cmd if move_cmd.starts_with("G1 ") => match parse_move(move_cmd, self.position) {
                Some(target) => {
                    self.target = Some(target);
                    self.held = false;
                    Some(protocol::ACK.into())
                }
                None => Some("error:2".into()),
            },
            _ => Some("error:20".into()),
        }
    }
}

impl Default for SimulatedGrbl {
    fn default() -> Self {
        Self::new()
    }
}

/// Target of a `G1` line. Missing axis words keep the current coordinate.
fn parse_move(line: &str, current: Point) -> Option<Point> {
    let mut target = current;
    for word in line.split_whitespace().skip(1) {
        let mut chars = word.chars();
        let axis = chars.next()?;
        let value: f64 = chars.as_str().parse().ok()?;
        match axis {
            'X' => target.x = value,
            'Y' => target.y = value,
            'Z' => target.z = value,
            'F' => {}
            _ => return None,
        }
    }
    Some(target)
}

#[async_trait]
impl Transport for SimulatedGrbl {
    fn name(&self) -> &str {
        "simulated-grbl"
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(reply) = self.respond(line) {
                debug!("SimulatedGrbl: {} -> {}", line, reply);
                self.pending.push(reply);
            }
        }
        Ok(())
    }

    async fn read_lines(&mut self) -> Result<Vec<String>> {
        Ok(std::mem::take(&mut self.pending))
    }

    async fn clear_input(&mut self) -> Result<()> {
        self.pending.clear();
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

//! GRBL text protocol subset.
//!
//! Outbound commands are single G-code lines terminated by `\n`. The firmware
//! answers plain commands with `ok` and the `?` query with a status frame:
//!
//! ```text
//! <Run|MPos:12.500,-3.000,0.000|FS:400,0>     GRBL 1.1
//! <Idle,MPos:0.000,0.000,0.000,WPos:...>      GRBL 0.8
//! ```
//!
//! Anything else (typically `error:N` or an `ALARM` line) is a rejection.

use crate::geometry::Point;
use std::fmt;

/// Acknowledgement token for accepted commands.
pub const ACK: &str = "ok";
/// First character of every status frame.
pub const STATUS_MARKER: char = '<';
/// Written on connect to wake the firmware.
pub const WAKE_SEQUENCE: &[u8] = b"\r\n\r\n";

pub const ABSOLUTE_POSITIONING: &str = "G90";
pub const ZERO_ORIGIN: &str = "G92 X0 Y0 Z0";
pub const UNITS_MM: &str = "G21";
pub const STATUS_QUERY: &str = "?";
pub const FEED_HOLD: &str = "!";

/// Linear move at `feed_rate` mm/min to `target`.
pub fn linear_move(feed_rate: f64, target: &Point) -> String {
    format!(
        "G1 F{} X{} Y{} Z{}",
        feed_rate, target.x, target.y, target.z
    )
}

/// How a single response line should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseLine<'a> {
    Ack,
    Status(&'a str),
    Rejected(&'a str),
}

pub fn classify(line: &str) -> ResponseLine<'_> {
    if line == ACK {
        ResponseLine::Ack
    } else if line.starts_with(STATUS_MARKER) {
        ResponseLine::Status(line)
    } else {
        ResponseLine::Rejected(line)
    }
}

/// Machine motion state reported in a status frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineState {
    Idle,
    Running,
    Other(String),
}

impl MachineState {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "Idle" => MachineState::Idle,
            "Run" => MachineState::Running,
            other => MachineState::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            MachineState::Idle => "Idle",
            MachineState::Running => "Run",
            MachineState::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Parsed status frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineStatus {
    pub state: MachineState,
    /// Planar position, when the frame carries one. Firmware `z` is not used.
    pub position: Option<Point>,
}

impl MachineStatus {
    /// Parse a status frame. Returns `None` for lines that are not status frames.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.strip_prefix(STATUS_MARKER)?;
        let tag_end = body.find(['|', ',', '>']).unwrap_or(body.len());
        let state = MachineState::from_tag(&body[..tag_end]);
        let position = parse_position(&body[tag_end..]);
        Some(Self { state, position })
    }
}

/// `x,y` from the comma list following the first `:` of a frame.
fn parse_position(body: &str) -> Option<Point> {
    let start = body.find(':')? + 1;
    let section = &body[start..];
    let section = &section[..section.find(['|', '>']).unwrap_or(section.len())];
    let mut fields = section.split(',');
    let x = fields.next()?.trim().parse::<f64>().ok()?;
    let y = fields.next()?.trim().parse::<f64>().ok()?;
    Some(Point::planar(x, y))
}

/// Render a GRBL 1.1 style frame. Used by the simulator.
pub fn format_status(state: &MachineState, position: &Point) -> String {
    format!(
        "<{}|MPos:{:.3},{:.3},{:.3}|FS:0,0>",
        state.tag(),
        position.x,
        position.y,
        position.z
    )
}

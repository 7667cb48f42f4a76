//! Stage geometry: positions and the chamber safety envelope.

pub mod envelope;
pub mod point;

pub use envelope::SafetyEnvelope;
pub use point::Point;

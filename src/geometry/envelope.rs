//! Chamber geometries used as the motion safety envelope.
//!
//! Every commanded target and every position the firmware reports mid-move is
//! checked against one of these shapes. The usable region shrinks the physical
//! chamber by a wall padding and by the size of whatever the stage is carrying,
//! so the carried object never touches the chamber wall.
//!
//! ## Configuration Example
//!
//! ```toml
//! [chamber]
//! shape = "cylinder3d"
//! radius = 50.0
//! height = 100.0
//! padding = 10.0
//! target_radius = 25.0
//! target_height = 50.0
//! ```

use super::Point;
use serde::{Deserialize, Serialize};

/// Region a stage position must stay strictly inside.
///
/// Misconfigured padding or target sizes can push a derived dimension to zero or
/// below. That is not rejected: such an envelope simply accepts no point at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum SafetyEnvelope {
    /// Flat disc centred on the origin. `z` is not constrained.
    #[serde(rename = "circle2d")]
    Circle2D {
        radius: f64,
        padding: f64,
        target_radius: f64,
    },
    /// Cylinder centred on the origin, symmetric in `z`.
    #[serde(rename = "cylinder3d")]
    Cylinder3D {
        radius: f64,
        height: f64,
        padding: f64,
        target_radius: f64,
        target_height: f64,
    },
}

impl SafetyEnvelope {
    pub fn circle_2d(radius: f64, padding: f64, target_radius: f64) -> Self {
        SafetyEnvelope::Circle2D {
            radius,
            padding,
            target_radius,
        }
    }

    pub fn cylinder_3d(
        radius: f64,
        height: f64,
        padding: f64,
        target_radius: f64,
        target_height: f64,
    ) -> Self {
        SafetyEnvelope::Cylinder3D {
            radius,
            height,
            padding,
            target_radius,
            target_height,
        }
    }

    /// Usable radius after padding and target size are removed.
    pub fn true_radius(&self) -> f64 {
        match *self {
            SafetyEnvelope::Circle2D {
                radius,
                padding,
                target_radius,
            }
            | SafetyEnvelope::Cylinder3D {
                radius,
                padding,
                target_radius,
                ..
            } => radius - padding - target_radius,
        }
    }

    /// Usable half-height, `None` for planar envelopes.
    pub fn true_height(&self) -> Option<f64> {
        match *self {
            SafetyEnvelope::Circle2D { .. } => None,
            SafetyEnvelope::Cylinder3D {
                height,
                padding,
                target_height,
                ..
            } => Some(height - padding - target_height / 2.0),
        }
    }

    /// True when a derived dimension is non-positive, i.e. no point can be valid.
    pub fn is_degenerate(&self) -> bool {
        self.true_radius() <= 0.0 || self.true_height().is_some_and(|h| h <= 0.0)
    }

    /// Whether `point` lies strictly inside the usable region.
    ///
    /// Boundary points are outside. NaN coordinates are always outside.
    pub fn is_valid(&self, point: &Point) -> bool {
        let inside_radius = point.planar_magnitude() < self.true_radius();
        match self.true_height() {
            None => inside_radius,
            Some(true_height) => inside_radius && point.z.abs() < true_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_true_radius() {
        let env = SafetyEnvelope::circle_2d(140.0, 20.0, 20.0);
        assert_eq!(env.true_radius(), 100.0);
        assert_eq!(env.true_height(), None);
    }

    #[test]
    fn test_circle_strict_boundary() {
        let env = SafetyEnvelope::circle_2d(10.0, 0.0, 0.0);
        assert!(env.is_valid(&Point::planar(9.999, 0.0)));
        assert!(!env.is_valid(&Point::planar(10.0, 0.0)));
        assert!(!env.is_valid(&Point::planar(6.0, 8.0)));
        assert!(!env.is_valid(&Point::planar(-10.5, 0.0)));
    }

    #[test]
    fn test_circle_ignores_z() {
        let env = SafetyEnvelope::circle_2d(10.0, 1.0, 1.0);
        assert!(env.is_valid(&Point::new(1.0, 1.0, 1_000.0)));
        assert!(env.is_valid(&Point::new(1.0, 1.0, -1_000.0)));
    }

    #[test]
    fn test_cylinder_dimensions() {
        let env = SafetyEnvelope::cylinder_3d(50.0, 100.0, 10.0, 25.0, 50.0);
        assert_eq!(env.true_radius(), 15.0);
        assert_eq!(env.true_height(), Some(65.0));
    }

    #[test]
    fn test_cylinder_requires_both_conditions() {
        let env = SafetyEnvelope::cylinder_3d(50.0, 100.0, 10.0, 25.0, 50.0);
        assert!(env.is_valid(&Point::new(10.0, 0.0, -10.0)));
        // Inside radius, outside height
        assert!(!env.is_valid(&Point::new(0.0, 0.0, 65.0)));
        assert!(!env.is_valid(&Point::new(0.0, 0.0, -70.0)));
        // Inside height, outside radius
        assert!(!env.is_valid(&Point::new(15.0, 0.0, 0.0)));
        // Both out
        assert!(!env.is_valid(&Point::new(20.0, 20.0, 80.0)));
    }

    #[test]
    fn test_degenerate_envelope_rejects_everything() {
        let env = SafetyEnvelope::circle_2d(10.0, 8.0, 5.0);
        assert!(env.is_degenerate());
        assert!(!env.is_valid(&Point::ORIGIN));

        let env = SafetyEnvelope::cylinder_3d(50.0, 10.0, 5.0, 1.0, 20.0);
        assert!(env.is_degenerate());
        assert!(!env.is_valid(&Point::ORIGIN));
    }

    #[test]
    fn test_nan_is_invalid() {
        let env = SafetyEnvelope::circle_2d(10.0, 0.0, 0.0);
        assert!(!env.is_valid(&Point::planar(f64::NAN, 0.0)));
    }

    #[test]
    fn test_deserialize_tagged_shape() {
        let env: SafetyEnvelope = toml::from_str(
            r#"
shape = "circle2d"
radius = 140.0
padding = 20.0
target_radius = 20.0
"#,
        )
        .unwrap();
        assert_eq!(env, SafetyEnvelope::circle_2d(140.0, 20.0, 20.0));
    }
}

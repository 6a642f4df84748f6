//! # Geometry types
//!
//! Thin pose and velocity types over `nalgebra`. All positions are in the
//! field frame, with headings measured anticlockwise from the +X axis.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::Serialize;

use util::maths::map_pi_to_2pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position and heading on the field.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pose2 {
    /// Position in the field frame
    pub position_m: Vector2<f64>,

    /// Heading, anticlockwise from the field +X axis
    pub heading: Rotation2<f64>,
}

/// A velocity demand or measurement.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Twist {
    /// Linear velocity in the field frame
    ///
    /// Units: meters/second
    pub linear_ms: Vector2<f64>,

    /// Heading rate, positive anticlockwise
    ///
    /// Units: degrees/second
    pub rate_degs: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2 {
    pub fn new(position_m: Vector2<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            heading: Rotation2::new(heading_rad),
        }
    }

    pub fn from_degrees(position_m: Vector2<f64>, heading_deg: f64) -> Self {
        Self::new(position_m, heading_deg.to_radians())
    }

    /// Heading in degrees, in the range [0, 360).
    pub fn heading_deg(&self) -> f64 {
        let deg = map_pi_to_2pi(self.heading.angle()).to_degrees();

        // -0.0 rad maps to 2pi, which is the same heading as 0
        if deg >= 360.0 { deg - 360.0 } else { deg }
    }

    /// Euclidean distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose2) -> f64 {
        (other.position_m - self.position_m).norm()
    }
}

impl Default for Pose2 {
    fn default() -> Self {
        Self {
            position_m: Vector2::zeros(),
            heading: Rotation2::identity(),
        }
    }
}

impl Twist {
    pub fn new(linear_ms: Vector2<f64>, rate_degs: f64) -> Self {
        Self { linear_ms, rate_degs }
    }

    /// The zero velocity.
    pub fn zero() -> Self {
        Self::new(Vector2::zeros(), 0.0)
    }

    /// Build a twist from a speed along a direction given by an angle.
    pub fn from_polar(speed_ms: f64, direction_rad: f64, rate_degs: f64) -> Self {
        Self::new(
            Vector2::new(speed_ms * direction_rad.cos(), speed_ms * direction_rad.sin()),
            rate_degs,
        )
    }

    /// Magnitude of the linear velocity.
    pub fn speed_ms(&self) -> f64 {
        self.linear_ms.norm()
    }
}

/// Angle of a vector from the +X axis, in radians.
///
/// The zero vector has an angle of zero.
pub fn angle_of(v: &Vector2<f64>) -> f64 {
    v[1].atan2(v[0])
}

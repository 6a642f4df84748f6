//! # Follower controllers
//!
//! The pair of motion controllers used by the follower. The distance
//! controller outputs a speed demand from the distance travelled along the
//! path, the heading controller outputs a heading rate demand from the robot
//! heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;

use crate::ctrl::{MotionController, ProfiledPidController};

use super::Params;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Wrapping range of the heading controller input.
///
/// Units: degrees
pub const HEADING_RANGE_DEG: (f64, f64) = (0.0, 360.0);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The follower controllers
#[derive(Debug, Clone)]
pub struct FollowerControllers<C> {
    /// Distance along path controller
    distance: C,

    /// Heading controller
    heading: C,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FollowerControllers<ProfiledPidController> {
    /// Create a new instance of the controllers from the parameters
    pub fn new(params: &Params) -> Self {
        Self::from_parts(
            ProfiledPidController::new(&params.distance_ctrl, params.period_s),
            ProfiledPidController::new(&params.heading_ctrl, params.period_s),
        )
    }
}

impl<C: MotionController> FollowerControllers<C> {
    /// Build from two existing controllers. Continuous input is enabled on the
    /// heading controller.
    pub fn from_parts(distance: C, mut heading: C) -> Self {
        heading.enable_continuous_input(HEADING_RANGE_DEG.0, HEADING_RANGE_DEG.1);

        Self { distance, heading }
    }

    /// Speed demand for the given distance travelled and total path length.
    pub fn speed_dem_ms(&mut self, distance_m: f64, path_length_m: f64) -> f64 {
        self.distance.calculate(distance_m, path_length_m)
    }

    /// Heading rate demand for the given current and target headings.
    pub fn rate_dem_degs(&mut self, heading_deg: f64, target_deg: f64) -> f64 {
        self.heading.calculate(heading_deg, target_deg)
    }

    /// Seed both controllers with zero velocity.
    pub fn reset(&mut self, distance_m: f64, heading_deg: f64) {
        debug!(
            "Follower controllers reset to {:.04} m, {:.02} deg",
            distance_m, heading_deg
        );

        self.distance.reset(distance_m, 0.0);
        self.heading.reset(heading_deg, 0.0);
    }

    pub fn distance(&self) -> &C {
        &self.distance
    }

    pub fn heading(&self) -> &C {
        &self.heading
    }
}

//! # Motion control module
//!
//! The follower drives the robot through two motion controllers, one on the
//! distance travelled along the path and one on the robot heading. It only
//! ever talks to them through the [`MotionController`] trait, so any
//! controller with the same calculate/reset shape can be swapped in.
//!
//! The shipped controller is the [`ProfiledPidController`]: a trapezoidal
//! motion profile generates a moving setpoint which a PID controller then
//! tracks.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod pid;
pub mod profile;
pub mod profiled;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

pub use pid::PidController;
pub use profile::{Constraints, TrapezoidProfile};
pub use profiled::ProfiledPidController;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position and velocity pair along one axis.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

/// Gains and profile limits for a profiled PID controller.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerPreset {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Maximum profile velocity, in controlled units per second
    pub max_vel: f64,

    /// Maximum profile acceleration, in controlled units per second^2
    pub max_accel: f64,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A controller which drives a measurement towards a goal.
pub trait MotionController {
    /// Calculate the next output for the given measurement and goal.
    fn calculate(&mut self, measurement: f64, goal: f64) -> f64;

    /// Reset the controller's internal state to the given position and
    /// velocity.
    fn reset(&mut self, position: f64, velocity: f64);

    /// Treat the input as wrapping between `min` and `max`, for example
    /// angles.
    fn enable_continuous_input(&mut self, min: f64, max: f64);

    /// The current setpoint the controller is tracking.
    fn setpoint(&self) -> ProfileState;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProfileState {
    pub fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }
}

impl ControllerPreset {
    pub fn new(k_p: f64, k_i: f64, k_d: f64, max_vel: f64, max_accel: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            max_vel,
            max_accel,
        }
    }

    /// Default gains for the distance controller.
    pub fn default_distance() -> Self {
        Self::new(3.0, 0.0, 0.0, 1.0, 10.0)
    }

    /// Default gains for the heading controller.
    pub fn default_heading() -> Self {
        Self::new(2.0, 0.0, 0.0, 5.0, 10.0)
    }

    /// True if all values are finite and the profile limits are positive.
    pub fn is_valid(&self) -> bool {
        [self.k_p, self.k_i, self.k_d, self.max_vel, self.max_accel]
            .iter()
            .all(|v| v.is_finite())
            && self.max_vel > 0.0
            && self.max_accel > 0.0
    }
}

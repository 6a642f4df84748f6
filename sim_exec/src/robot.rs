//! # Robot kinematic model
//!
//! A holonomic point robot. Each call to [`Robot::drive`] clamps the commanded
//! speed, then integrates the pose forward by exactly one configured period
//! using explicit Euler.
//!
//! The integration period is fixed by the parameters and is independent of how
//! often `drive` is actually called. The wall clock time between calls is only
//! used for the acceleration estimate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use log::trace;
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use crate::geom::{Pose2, Twist};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the robot model.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotParams {
    /// Maximum linear speed, commands above this are scaled down
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Integration period applied on every drive
    ///
    /// Units: seconds
    pub period_s: f64,
}

#[derive(Debug, Clone)]
pub struct Robot {
    params: RobotParams,

    /// Current pose
    pose: Pose2,

    /// Velocity applied by the last drive
    velocity: Twist,

    /// Velocity applied by the drive before the last one
    last_velocity: Twist,

    /// Time of the last drive
    last_update: Option<Instant>,

    /// Wall clock time between the last two drives
    elapsed_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Robot {
    /// Create a new robot at rest at the given pose.
    pub fn new(pose: Pose2, params: RobotParams) -> Self {
        Self {
            params,
            pose,
            velocity: Twist::zero(),
            last_velocity: Twist::zero(),
            last_update: None,
            elapsed_s: None,
        }
    }

    /// Drive the robot for one period.
    pub fn drive(&mut self, cmd: Twist) {
        self.drive_at(cmd, Instant::now())
    }

    /// Drive the robot for one period, with the wall clock time given
    /// explicitly.
    pub fn drive_at(&mut self, cmd: Twist, now: Instant) {
        self.last_velocity = self.velocity;
        self.elapsed_s = self
            .last_update
            .map(|t| now.saturating_duration_since(t).as_secs_f64());

        // Clamp the speed, keeping the direction
        let mut linear_ms = cmd.linear_ms;
        let speed_ms = linear_ms.norm();
        if speed_ms > self.params.max_speed_ms {
            linear_ms *= self.params.max_speed_ms / speed_ms;
        }
        let cmd = Twist::new(linear_ms, cmd.rate_degs);

        self.pose.position_m += cmd.linear_ms * self.params.period_s;
        self.pose.heading =
            self.pose.heading * Rotation2::new((cmd.rate_degs * self.params.period_s).to_radians());
        self.velocity = cmd;

        self.last_update = Some(now);

        trace!(
            "Robot at ({:.04}, {:.04}) heading {:.02} deg, speed {:.04} m/s",
            self.pose.position_m[0],
            self.pose.position_m[1],
            self.pose.heading_deg(),
            self.velocity.speed_ms()
        );
    }

    /// Change in speed between the last two drives divided by the wall clock
    /// time between them.
    ///
    /// Zero before the second drive or if no time passed between drives.
    ///
    /// Units: meters/second^2
    pub fn acceleration(&self) -> f64 {
        match self.elapsed_s {
            Some(dt) if dt > 0.0 => (self.velocity.speed_ms() - self.last_velocity.speed_ms()) / dt,
            _ => 0.0,
        }
    }

    /// Set the heading, keeping the position.
    pub fn set_heading_deg(&mut self, heading_deg: f64) {
        self.pose.heading = Rotation2::new(heading_deg.to_radians());
    }

    pub fn set_pose(&mut self, pose: Pose2) {
        self.pose = pose;
    }

    pub fn set_position(&mut self, position_m: Vector2<f64>) {
        self.pose.position_m = position_m;
    }

    pub fn pose(&self) -> &Pose2 {
        &self.pose
    }

    pub fn velocity(&self) -> &Twist {
        &self.velocity
    }

    pub fn params(&self) -> &RobotParams {
        &self.params
    }
}

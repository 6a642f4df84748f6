//! Path follower state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;

use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::{
    ctrl::{ControllerPreset, MotionController, ProfiledPidController},
    geom::{Pose2, Twist},
    path::{Path, PathState},
    robot::Robot,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Follower<C = ProfiledPidController> {
    params: Params,

    /// Controller objects used to calculate the demands
    controllers: FollowerControllers<C>,

    /// Closest point found on the last update
    state: PathState,

    /// If false the closest point is still tracked but the robot is never
    /// commanded
    running: bool,

    /// Time of the last update, whether running or not
    last_update: Option<Instant>,
}

/// What happened during one follower update.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct FollowerReport {
    /// Parameter of the closest point
    pub t: f64,

    /// Arc length from the start of the path to the closest point
    pub distance_m: Option<f64>,

    /// Total length of the path
    pub path_length_m: Option<f64>,

    /// Output of the distance controller
    pub speed_dem_ms: Option<f64>,

    /// Output of the heading controller
    pub rate_dem_degs: Option<f64>,

    /// True if the acceleration limit changed the commanded speed
    pub accel_limited: bool,

    /// The velocity sent to the robot, none when idle
    pub command: Option<Twist>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when building a follower.
#[derive(Debug, thiserror::Error)]
pub enum FollowerError {
    #[error("The control period must be positive and finite, got {0}")]
    InvalidPeriod(f64),

    #[error("The {0} controller preset is invalid: {1:?}")]
    InvalidPreset(&'static str, ControllerPreset),

    #[error("The closest point search window must be positive, got {0}")]
    InvalidSearchWindow(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Follower<ProfiledPidController> {
    /// Create a new follower using profiled PID controllers.
    pub fn new(params: Params) -> Result<Self, FollowerError> {
        validate(&params)?;

        let controllers = FollowerControllers::new(&params);

        Ok(Self::build(params, controllers))
    }
}

impl<C: MotionController> Follower<C> {
    /// Create a new follower with the given controllers.
    pub fn with_controllers(
        params: Params,
        controllers: FollowerControllers<C>,
    ) -> Result<Self, FollowerError> {
        validate(&params)?;

        Ok(Self::build(params, controllers))
    }

    fn build(params: Params, controllers: FollowerControllers<C>) -> Self {
        Self {
            params,
            controllers,
            state: PathState::unlocated(),
            running: true,
            last_update: None,
        }
    }

    /// Seed the controllers from the robot's current situation.
    ///
    /// The distance controller starts at the arc length to the robot's closest
    /// point, the heading controller at the robot's heading, both at rest.
    pub fn start(&mut self, path: &Path, robot: &Robot) {
        let closest = path.closest_point(robot.pose());
        let distance_m = path.arc_length(0.0, closest.t);

        self.controllers.reset(distance_m, robot.pose().heading_deg());
    }

    /// Run one control tick.
    pub fn update(&mut self, path: &Path, robot: &mut Robot) -> FollowerReport {
        self.update_at(path, robot, Instant::now())
    }

    /// Run one control tick, with the wall clock time given explicitly.
    ///
    /// The closest point is always updated. The robot is only commanded while
    /// running.
    pub fn update_at(&mut self, path: &Path, robot: &mut Robot, now: Instant) -> FollowerReport {
        self.state = self.locate(path, robot.pose());

        let mut report = FollowerReport {
            t: self.state.t,
            ..Default::default()
        };

        if self.running {
            let distance_m = path.arc_length(0.0, self.state.t);
            let path_length_m = path.path_length();

            let speed_dem_ms = self.controllers.speed_dem_ms(distance_m, path_length_m);
            let rate_dem_degs = self
                .controllers
                .rate_dem_degs(robot.pose().heading_deg(), self.params.end_heading_deg);

            let mut cmd = path.velocity_command(&self.state, robot.pose(), speed_dem_ms, rate_dem_degs);

            // Acceleration limit, measured against the wall clock time since
            // the last update
            if let Some(last) = self.last_update {
                let dt = now.saturating_duration_since(last).as_secs_f64();
                let max_change_ms = path.constants().max_accel_mss * dt;

                let current_ms = robot.velocity().speed_ms();
                let diff_ms = cmd.speed_ms() - current_ms;

                if diff_ms.abs() > max_change_ms {
                    let speed_ms = current_ms + max_change_ms.copysign(diff_ms);
                    cmd = Twist::new(direction(&cmd, robot) * speed_ms, cmd.rate_degs);
                    report.accel_limited = true;

                    trace!("Acceleration limited: {:.04} m/s -> {:.04} m/s", current_ms, speed_ms);
                }
            }

            robot.drive_at(cmd, now);

            report.distance_m = Some(distance_m);
            report.path_length_m = Some(path_length_m);
            report.speed_dem_ms = Some(speed_dem_ms);
            report.rate_dem_degs = Some(rate_dem_degs);
            report.command = Some(cmd);
        }

        self.last_update = Some(now);

        trace!(
            "Follower update: t = {:.04}, running = {}, accel_limited = {}",
            report.t,
            self.running,
            report.accel_limited
        );

        report
    }

    /// Put the robot back at the start of the path and restart the
    /// controllers.
    ///
    /// Running mode is left as it is: an idle follower stays idle after a
    /// reset and only starts driving once [`Follower::set_running`] is called.
    pub fn reset(&mut self, path: &Path, robot: &mut Robot) {
        self.reset_at(path, robot, Instant::now())
    }

    /// Reset, with the wall clock time given explicitly.
    pub fn reset_at(&mut self, path: &Path, robot: &mut Robot, now: Instant) {
        debug!("Follower reset");

        self.state = PathState::new(Pose2::default(), 0.0);

        robot.set_pose(Pose2::new(path.start_point(), 0.0));
        robot.drive_at(Twist::zero(), now);
        robot.set_heading_deg(self.params.start_heading_deg);

        self.start(path, robot);
    }

    pub fn set_running(&mut self, running: bool) {
        if running != self.running {
            debug!("Follower running set to {}", running);
        }
        self.running = running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The closest point found on the last update.
    pub fn state(&self) -> &PathState {
        &self.state
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn distance_controller(&self) -> &C {
        self.controllers.distance()
    }

    pub fn heading_controller(&self) -> &C {
        self.controllers.heading()
    }

    /// Find the closest point to the robot.
    ///
    /// Once a closest point is known only samples within the search window of
    /// it are considered, which stops the follower jumping to a different part
    /// of a self intersecting path.
    fn locate(&self, path: &Path, pose: &Pose2) -> PathState {
        if !self.state.is_located() {
            return path.closest_point(pose);
        }

        let prev_t = self.state.t;
        let window = self.params.search_window;

        let mut best: Option<(f64, f64)> = None;
        for t in path.sample_ts().filter(|t| (prev_t - t).abs() <= window) {
            let dist = (path.location(t) - pose.position_m).norm();
            match best {
                Some((_, d)) if dist >= d => (),
                _ => best = Some((t, dist)),
            }
        }

        match best {
            Some((t, _)) => PathState::new(path.position(t), t),
            None => {
                warn!("No closest point candidates within {} of t = {}", window, prev_t);
                self.state
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn validate(params: &Params) -> Result<(), FollowerError> {
    if !(params.period_s.is_finite() && params.period_s > 0.0) {
        return Err(FollowerError::InvalidPeriod(params.period_s));
    }
    if !params.distance_ctrl.is_valid() {
        return Err(FollowerError::InvalidPreset("distance", params.distance_ctrl));
    }
    if !params.heading_ctrl.is_valid() {
        return Err(FollowerError::InvalidPreset("heading", params.heading_ctrl));
    }
    if !(params.search_window > 0.0) {
        return Err(FollowerError::InvalidSearchWindow(params.search_window));
    }

    Ok(())
}

/// Unit direction of a command, falling back to the robot's current direction
/// of travel and then to zero.
fn direction(cmd: &Twist, robot: &Robot) -> nalgebra::Vector2<f64> {
    cmd.linear_ms
        .try_normalize(std::f64::EPSILON)
        .or_else(|| robot.velocity().linear_ms.try_normalize(std::f64::EPSILON))
        .unwrap_or_else(nalgebra::Vector2::zeros)
}

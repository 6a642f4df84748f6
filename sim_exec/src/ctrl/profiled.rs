//! # Profiled PID controller
//!
//! A PID controller which tracks the setpoint of a trapezoidal motion profile
//! instead of jumping straight to the goal. Every call to `calculate` moves
//! the setpoint one control period along a profile from the current setpoint
//! to the goal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use util::maths::input_modulus;

use super::{
    Constraints, ControllerPreset, MotionController, PidController, ProfileState, TrapezoidProfile,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProfiledPidController {
    pid: PidController,
    constraints: Constraints,

    /// Control period, the time the setpoint advances on each calculate
    ///
    /// Units: seconds
    period_s: f64,

    setpoint: ProfileState,
    goal: ProfileState,

    /// Input range, if continuous input is enabled
    continuous: Option<(f64, f64)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProfiledPidController {
    pub fn new(preset: &ControllerPreset, period_s: f64) -> Self {
        Self {
            pid: PidController::new(preset.k_p, preset.k_i, preset.k_d, period_s),
            constraints: Constraints::new(preset.max_vel, preset.max_accel),
            period_s,
            setpoint: ProfileState::default(),
            goal: ProfileState::default(),
            continuous: None,
        }
    }

    pub fn goal(&self) -> ProfileState {
        self.goal
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// True if the setpoint has reached the goal.
    pub fn at_goal(&self) -> bool {
        self.setpoint == self.goal
    }
}

impl MotionController for ProfiledPidController {
    fn calculate(&mut self, measurement: f64, goal: f64) -> f64 {
        self.goal = ProfileState::new(goal, 0.0);

        // Express the goal and setpoint as the shortest way round from the
        // measurement.
        if let Some((min, max)) = self.continuous {
            let bound = 0.5 * (max - min);

            let goal_dist = input_modulus(self.goal.position - measurement, -bound, bound);
            let setpoint_dist = input_modulus(self.setpoint.position - measurement, -bound, bound);

            self.goal.position = measurement + goal_dist;
            self.setpoint.position = measurement + setpoint_dist;
        }

        let profile = TrapezoidProfile::new(self.constraints, self.goal, self.setpoint);
        self.setpoint = profile.calculate(self.period_s);

        trace!(
            "Profile setpoint: {:.04} at {:.04}/s",
            self.setpoint.position,
            self.setpoint.velocity
        );

        self.pid.calculate(measurement, self.setpoint.position)
    }

    fn reset(&mut self, position: f64, velocity: f64) {
        self.pid.reset();
        self.setpoint = ProfileState::new(position, velocity);
    }

    fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.pid.enable_continuous_input(min, max);
        self.continuous = Some((min, max));
    }

    fn setpoint(&self) -> ProfileState {
        self.setpoint
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_setpoint_advances_one_period() {
        let preset = ControllerPreset::new(3.0, 0.0, 0.0, 1.0, 10.0);
        let mut ctrl = ProfiledPidController::new(&preset, 0.05);
        ctrl.reset(0.0, 0.0);

        // First period is all acceleration: v = 10 * 0.05, p = 0.5 * 10 * 0.05^2
        let out = ctrl.calculate(0.0, 5.0);
        assert_relative_eq!(ctrl.setpoint().velocity, 0.5, epsilon = 1e-12);
        assert_relative_eq!(ctrl.setpoint().position, 0.0125, epsilon = 1e-12);
        assert_relative_eq!(out, 3.0 * 0.0125, epsilon = 1e-12);

        // The velocity limit holds
        for _ in 0..20 {
            ctrl.calculate(ctrl.setpoint().position, 5.0);
        }
        assert_relative_eq!(ctrl.setpoint().velocity, 1.0, epsilon = 1e-12);
        assert!(!ctrl.at_goal());
    }

    #[test]
    fn test_reaches_goal() {
        let preset = ControllerPreset::new(1.0, 0.0, 0.0, 5.0, 10.0);
        let mut ctrl = ProfiledPidController::new(&preset, 0.05);
        ctrl.reset(0.0, 0.0);

        for _ in 0..100 {
            ctrl.calculate(ctrl.setpoint().position, 1.0);
        }

        assert!(ctrl.at_goal());
        assert_eq!(ctrl.calculate(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_continuous_takes_short_way() {
        let preset = ControllerPreset::default_heading();
        let mut ctrl = ProfiledPidController::new(&preset, 0.05);
        ctrl.enable_continuous_input(0.0, 360.0);
        ctrl.reset(350.0, 0.0);

        // Goal at 10 degrees is reached by increasing the heading through 360
        let out = ctrl.calculate(350.0, 10.0);
        assert!(out > 0.0);
        assert!(ctrl.setpoint().velocity > 0.0);
        assert_relative_eq!(ctrl.goal().position, 370.0, epsilon = 1e-9);
    }
}

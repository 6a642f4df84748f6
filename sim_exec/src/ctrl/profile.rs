//! # Trapezoidal motion profile
//!
//! Generates a time parameterised position and velocity between a start state
//! and a goal state, limited by a maximum velocity and acceleration. The
//! profile accelerates, cruises at the maximum velocity (if there is room) and
//! then decelerates onto the goal.
//!
//! A profile is rebuilt from the current setpoint every control cycle, so only
//! the first period of each profile is ever sampled.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ProfileState;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity and acceleration limits of a profile.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub max_vel: f64,
    pub max_accel: f64,
}

/// A trapezoidal profile between two states.
#[derive(Debug, Copy, Clone)]
pub struct TrapezoidProfile {
    constraints: Constraints,

    /// +1 or -1, profiles that move backwards are solved as forward profiles
    /// and flipped on output
    direction: f64,

    initial: ProfileState,
    goal: ProfileState,

    /// Time at which acceleration ends
    end_accel_s: f64,

    /// Time at which cruising at full speed ends
    end_full_speed_s: f64,

    /// Time at which deceleration ends
    end_decel_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Constraints {
    pub fn new(max_vel: f64, max_accel: f64) -> Self {
        Self { max_vel, max_accel }
    }
}

impl TrapezoidProfile {
    pub fn new(constraints: Constraints, goal: ProfileState, initial: ProfileState) -> Self {
        let direction = if initial.position > goal.position { -1.0 } else { 1.0 };

        let mut initial = directed(direction, initial);
        let goal = directed(direction, goal);

        if initial.velocity > constraints.max_vel {
            initial.velocity = constraints.max_vel;
        }

        let max_vel = constraints.max_vel;
        let max_accel = constraints.max_accel;

        // Treat the profile as a full trapezoid starting and ending at rest,
        // and cut off the parts already covered by the initial and goal
        // velocities.
        let cutoff_begin = initial.velocity / max_accel;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_accel / 2.0;

        let cutoff_end = goal.velocity / max_accel;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_accel / 2.0;

        let full_trapezoid_dist =
            cutoff_dist_begin + (goal.position - initial.position) + cutoff_dist_end;
        let mut accel_time = max_vel / max_accel;

        let mut full_speed_dist = full_trapezoid_dist - accel_time * accel_time * max_accel;

        // Triangle profile, max velocity is never reached
        if full_speed_dist < 0.0 {
            accel_time = (full_trapezoid_dist / max_accel).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel_s = accel_time - cutoff_begin;
        let end_full_speed_s = end_accel_s + full_speed_dist / max_vel;
        let end_decel_s = end_full_speed_s + accel_time - cutoff_end;

        Self {
            constraints,
            direction,
            initial,
            goal,
            end_accel_s,
            end_full_speed_s,
            end_decel_s,
        }
    }

    /// State of the profile `t` seconds after its start.
    pub fn calculate(&self, t: f64) -> ProfileState {
        let max_vel = self.constraints.max_vel;
        let max_accel = self.constraints.max_accel;
        let mut result = self.initial;

        if t < self.end_accel_s {
            result.velocity += t * max_accel;
            result.position += (self.initial.velocity + t * max_accel / 2.0) * t;
        } else if t < self.end_full_speed_s {
            result.velocity = max_vel;
            result.position += (self.initial.velocity + self.end_accel_s * max_accel / 2.0)
                * self.end_accel_s
                + max_vel * (t - self.end_accel_s);
        } else if t <= self.end_decel_s {
            let time_left = self.end_decel_s - t;
            result.velocity = self.goal.velocity + time_left * max_accel;
            result.position =
                self.goal.position - (self.goal.velocity + time_left * max_accel / 2.0) * time_left;
        } else {
            result = self.goal;
        }

        directed(self.direction, result)
    }

    /// Total duration of the profile.
    ///
    /// Units: seconds
    pub fn total_time(&self) -> f64 {
        self.end_decel_s
    }

    pub fn is_finished(&self, t: f64) -> bool {
        t >= self.total_time()
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn directed(direction: f64, state: ProfileState) -> ProfileState {
    ProfileState::new(state.position * direction, state.velocity * direction)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_full_trapezoid() {
        // Accelerate for 1 s (0.5 m), cruise for 1 s (1 m), decelerate for 1 s (0.5 m)
        let profile = TrapezoidProfile::new(
            Constraints::new(1.0, 1.0),
            ProfileState::new(2.0, 0.0),
            ProfileState::default(),
        );

        assert_relative_eq!(profile.total_time(), 3.0, epsilon = 1e-12);

        let s = profile.calculate(0.5);
        assert_relative_eq!(s.velocity, 0.5, epsilon = 1e-12);
        assert_relative_eq!(s.position, 0.125, epsilon = 1e-12);

        let s = profile.calculate(1.5);
        assert_relative_eq!(s.velocity, 1.0, epsilon = 1e-12);
        assert_relative_eq!(s.position, 1.0, epsilon = 1e-12);

        let s = profile.calculate(2.5);
        assert_relative_eq!(s.velocity, 0.5, epsilon = 1e-12);
        assert_relative_eq!(s.position, 1.875, epsilon = 1e-12);

        assert!(profile.is_finished(3.5));
        assert_eq!(profile.calculate(3.5), ProfileState::new(2.0, 0.0));
    }

    #[test]
    fn test_triangle() {
        // Too short to reach max velocity
        let profile = TrapezoidProfile::new(
            Constraints::new(10.0, 1.0),
            ProfileState::new(1.0, 0.0),
            ProfileState::default(),
        );

        assert_relative_eq!(profile.total_time(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(profile.calculate(1.0).velocity, 1.0, epsilon = 1e-12);
        assert_relative_eq!(profile.calculate(1.0).position, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_reverse() {
        let profile = TrapezoidProfile::new(
            Constraints::new(1.0, 1.0),
            ProfileState::new(-2.0, 0.0),
            ProfileState::default(),
        );

        let s = profile.calculate(0.5);
        assert_relative_eq!(s.velocity, -0.5, epsilon = 1e-12);
        assert_relative_eq!(s.position, -0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_initial_velocity_clamped() {
        let profile = TrapezoidProfile::new(
            Constraints::new(1.0, 1.0),
            ProfileState::new(10.0, 0.0),
            ProfileState::new(0.0, 5.0),
        );

        // Already at max velocity so it cruises straight away
        let s = profile.calculate(0.1);
        assert_relative_eq!(s.velocity, 1.0, epsilon = 1e-12);
        assert_relative_eq!(s.position, 0.1, epsilon = 1e-12);
    }
}

//! # PID controller
//!
//! Fixed period PID controller. The integral and derivative terms use the
//! configured control period rather than the time between calls.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use util::maths::input_modulus;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Control period
    ///
    /// Units: seconds
    period_s: f64,

    /// Input range used to wrap the error, if continuous input is enabled
    continuous: Option<(f64, f64)>,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, period_s: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            period_s,
            continuous: None,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Get the value of the controller for the given measurement and
    /// setpoint.
    pub fn calculate(&mut self, measurement: f64, setpoint: f64) -> f64 {
        let error = self.error(measurement, setpoint);

        if self.k_i != 0.0 {
            self.integral += error * self.period_s;
        }

        // No derivative on the first call
        let deriv = match self.prev_error {
            Some(e) => (error - e) / self.period_s,
            None => 0f64,
        };

        self.prev_error = Some(error);

        self.k_p * error + self.k_i * self.integral + self.k_d * deriv
    }

    /// Clear the integral and the previous error.
    pub fn reset(&mut self) {
        self.prev_error = None;
        self.integral = 0f64;
    }

    /// Wrap errors into half the range either side of zero.
    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.continuous = Some((min, max));
    }

    pub fn disable_continuous_input(&mut self) {
        self.continuous = None;
    }

    pub fn is_continuous_input_enabled(&self) -> bool {
        self.continuous.is_some()
    }

    /// The last error seen by the controller, if any.
    pub fn prev_error(&self) -> Option<f64> {
        self.prev_error
    }

    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    fn error(&self, measurement: f64, setpoint: f64) -> f64 {
        match self.continuous {
            Some((min, max)) => {
                let bound = 0.5 * (max - min);
                input_modulus(setpoint - measurement, -bound, bound)
            }
            None => setpoint - measurement,
        }
    }
}

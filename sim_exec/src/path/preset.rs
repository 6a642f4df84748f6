//! # Path presets and path specifications
//!
//! A [`PathSpec`] is how a path is described in a parameter file. It either
//! names one of the built in [`PathPreset`]s or gives a custom curve.
//!
//! ```toml
//! [path]
//! source = "preset"
//! preset = "bezier_curve"
//! ```
//!
//! ```toml
//! [path]
//! source = "custom"
//! curve = "waypoint_segment"
//! constants = { max_vel_ms = 3.0, max_accel_mss = 2.0, error_corrector_weight = 0.5 }
//! waypoints = [
//!     { position_m = [0.0, 0.0], movement_angle_deg = 0.0 },
//!     { position_m = [4.0, 2.0], heading_deg = 90.0, movement_angle_deg = 90.0 },
//! ]
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{CurveKind, Path, PathConstants, PathError, Waypoint, DEFAULT_DX};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Constants used by both presets.
pub const PRESET_CONSTANTS: PathConstants = PathConstants {
    max_vel_ms: 4.5,
    max_accel_mss: 4.5,
    error_corrector_weight: 0.5,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Built in demonstration paths.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPreset {
    /// Six point polynomial blend which crosses back over itself
    BezierCurve,

    /// Two point waypoint segment curve along +X
    Quintic,
}

/// Description of a path as found in a parameter file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PathSpec {
    Preset {
        preset: PathPreset,
    },

    Custom {
        curve: CurveKind,

        #[serde(default = "default_dx")]
        dx: f64,

        constants: PathConstants,

        waypoints: Vec<Waypoint>,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathPreset {
    pub fn build(self) -> Result<Path, PathError> {
        match self {
            PathPreset::BezierCurve => Path::polynomial_blend(
                PRESET_CONSTANTS,
                vec![
                    Vector2::new(2.0, -3.0),
                    Vector2::new(-5.0, 2.0),
                    Vector2::new(-2.0, 1.0),
                    Vector2::new(-6.0, -2.0),
                    Vector2::new(3.0, 3.0),
                    Vector2::new(7.0, -1.0),
                ],
            ),
            PathPreset::Quintic => Path::waypoint_segment(
                PRESET_CONSTANTS,
                vec![
                    Waypoint::new(0.0, 0.0, 0.0, 0.0),
                    Waypoint::new(1.0, 0.0, 0.0, 0.0),
                ],
            ),
        }
    }
}

impl PathSpec {
    pub fn build(&self) -> Result<Path, PathError> {
        match self {
            PathSpec::Preset { preset } => preset.build(),
            PathSpec::Custom {
                curve,
                dx,
                constants,
                waypoints,
            } => Path::new(*curve, *constants, *dx, waypoints.clone()),
        }
    }
}

impl From<PathPreset> for PathSpec {
    fn from(preset: PathPreset) -> Self {
        PathSpec::Preset { preset }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_dx() -> f64 {
    DEFAULT_DX
}

//! Simulator executable parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    follower::FollowerParams,
    path::{PathPreset, PathSpec},
    robot::RobotParams,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulator executable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExecParams {
    /// Target period of one cycle
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of cycles to run before exiting
    pub num_cycles: u64,

    /// Robot model parameters
    pub robot: RobotParams,

    /// Follower parameters
    pub follower: FollowerParams,

    /// The path to follow
    pub path: PathSpec,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.05,
            num_cycles: 400,
            robot: RobotParams {
                max_speed_ms: 5.0,
                period_s: 0.05,
            },
            follower: FollowerParams::default(),
            path: PathPreset::BezierCurve.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ctrl::ControllerPreset;

    #[test]
    fn test_shipped_params_parse() {
        let params: SimExecParams =
            util::params::from_str(include_str!("../../params/sim_exec.toml")).unwrap();

        assert_eq!(params.cycle_period_s, 0.05);
        assert_eq!(params.robot.max_speed_ms, 5.0);
        assert_eq!(params.follower.end_heading_deg, 270.0);
        assert_eq!(params.follower.distance_ctrl, ControllerPreset::default_distance());
        assert_eq!(params.follower.heading_ctrl, ControllerPreset::default_heading());
        assert_eq!(params.follower.search_window, 0.3);

        match params.path {
            PathSpec::Preset { preset } => assert_eq!(preset, PathPreset::BezierCurve),
            s => panic!("Expected a preset path, got {:?}", s),
        }
    }
}

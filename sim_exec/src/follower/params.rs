//! Follower parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::ctrl::ControllerPreset;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default half width of the closest point search window.
pub const DEFAULT_SEARCH_WINDOW: f64 = 0.3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the path follower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Heading the robot is set to on reset
    ///
    /// Units: degrees
    pub start_heading_deg: f64,

    /// Heading the heading controller drives towards
    ///
    /// Units: degrees
    pub end_heading_deg: f64,

    /// Gains and limits of the distance along path controller
    pub distance_ctrl: ControllerPreset,

    /// Gains and limits of the heading controller
    pub heading_ctrl: ControllerPreset,

    /// Period the controllers' profiles advance by on each update
    ///
    /// Units: seconds
    pub period_s: f64,

    /// After the first update the closest point is only searched for within
    /// this distance in `t` of the previous closest point.
    #[serde(default = "default_search_window")]
    pub search_window: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            start_heading_deg: 0.0,
            end_heading_deg: 270.0,
            distance_ctrl: ControllerPreset::default_distance(),
            heading_ctrl: ControllerPreset::default_heading(),
            period_s: 0.05,
            search_window: DEFAULT_SEARCH_WINDOW,
        }
    }
}

fn default_search_window() -> f64 {
    DEFAULT_SEARCH_WINDOW
}

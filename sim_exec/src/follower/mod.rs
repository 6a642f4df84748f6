//! # Path follower module
//!
//! The follower keeps the robot on a path. On every update it:
//!
//! 1. Finds the closest point on the path to the robot. The first search
//!    covers the whole path, later searches only look within a window around
//!    the previous closest point.
//! 2. Runs the distance controller on the arc length travelled against the
//!    total path length, giving a speed demand.
//! 3. Runs the heading controller on the robot heading against the end
//!    heading, giving a heading rate demand.
//! 4. Asks the path for a velocity command, which blends the path tangent with
//!    a correction back onto the path and slows down for tight curves.
//! 5. Limits the change in speed using the path's maximum acceleration and
//!    the wall clock time since the last update.
//! 6. Drives the robot.
//!
//! When the follower is not running only step 1 is carried out, so the closest
//! point is still tracked but the robot doesn't move.
//!
//! The follower doesn't own the path or the robot, both are passed into every
//! call. This lets the path be edited between updates without any shared
//! ownership.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use params::Params;
pub use params::Params as FollowerParams;
pub use state::*;

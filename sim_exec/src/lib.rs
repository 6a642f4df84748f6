//! # Path following simulator library.
//!
//! This library allows the simulator executable, tests and benchmarks to
//! access the path following components.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Motion controllers - profiled PID control of a single axis
pub mod ctrl;

/// Follower - closes the loop between a path and a robot
pub mod follower;

/// Geometry - poses and velocities on the field
pub mod geom;

/// Simulator executable parameters
pub mod params;

/// Paths - parametric curves the robot follows
pub mod path;

/// Robot - kinematic model of the simulated robot
pub mod robot;

/// Simulation - wires a path, robot and follower together
pub mod sim;

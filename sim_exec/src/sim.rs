//! # Simulation
//!
//! Wires a path, a robot and a follower together and steps them once per
//! control cycle. Each step produces a flat [`TelemetryRecord`] which is
//! archived to CSV if an archive has been set up.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

// Internal
use crate::{
    follower::{Follower, FollowerError},
    geom::Pose2,
    params::SimExecParams,
    path::{CurveKind, Path, PathError},
    robot::Robot,
};
use util::{
    archive::{Archived, Archiver},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Simulation {
    path: Path,
    robot: Robot,
    follower: Follower,

    /// Telemetry archive, inactive unless `archive_to` is called
    arch: Archiver,

    /// Number of steps taken
    ticks: u64,

    last_record: Option<TelemetryRecord>,

    /// Highest robot speed seen
    max_speed_ms: f64,

    /// Number of steps in which the acceleration limit engaged
    num_accel_limited: u64,
}

/// One row of simulation telemetry.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct TelemetryRecord {
    pub tick: u64,

    /// Parameter of the closest point on the path
    pub t: f64,

    pub pos_x_m: f64,
    pub pos_y_m: f64,
    pub heading_deg: f64,

    pub speed_ms: f64,
    pub rate_degs: f64,

    /// Wall clock acceleration estimate of the robot
    pub accel_mss: f64,

    /// Arc length travelled, empty when idle
    pub distance_m: Option<f64>,

    /// Total path length, empty when idle
    pub path_length_m: Option<f64>,

    /// Signed radius of curvature at the closest point
    pub curvature_radius_m: f64,

    pub accel_limited: bool,
    pub running: bool,
}

/// End of run summary.
#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    pub ticks: u64,
    pub curve: CurveKind,
    pub num_waypoints: usize,
    pub waypoints_version: u64,
    pub path_length_m: f64,
    pub final_t: f64,
    pub final_position_m: [f64; 2],
    pub final_heading_deg: f64,
    pub max_speed_ms: f64,
    pub num_accel_limited: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid path: {0}")]
    PathError(#[from] PathError),

    #[error("Invalid follower: {0}")]
    FollowerError(#[from] FollowerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Simulation {
    /// Build the simulation from the executable parameters.
    ///
    /// The robot starts at rest at the first waypoint, facing +X, and the
    /// follower controllers are seeded from there.
    pub fn new(params: &SimExecParams) -> Result<Self, SimError> {
        let path = params.path.build()?;
        let robot = Robot::new(Pose2::new(path.start_point(), 0.0), params.robot);
        let mut follower = Follower::new(params.follower.clone())?;

        follower.start(&path, &robot);

        info!(
            "Simulation built: {:?} curve with {} waypoints, {:.03} m long",
            path.kind(),
            path.waypoints().len(),
            path.path_length()
        );

        Ok(Self {
            path,
            robot,
            follower,
            arch: Archiver::default(),
            ticks: 0,
            last_record: None,
            max_speed_ms: 0.0,
            num_accel_limited: 0,
        })
    }

    /// Archive telemetry into the given session.
    pub fn archive_to(&mut self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        self.arch = Archiver::from_path(session, "sim/telemetry.csv")?;
        Ok(())
    }

    /// Step the simulation once.
    pub fn step(&mut self) -> TelemetryRecord {
        self.step_at(Instant::now())
    }

    /// Step the simulation once, with the wall clock time given explicitly.
    pub fn step_at(&mut self, now: Instant) -> TelemetryRecord {
        let report = self.follower.update_at(&self.path, &mut self.robot, now);

        let pose = self.robot.pose();
        let velocity = self.robot.velocity();

        let record = TelemetryRecord {
            tick: self.ticks,
            t: report.t,
            pos_x_m: pose.position_m[0],
            pos_y_m: pose.position_m[1],
            heading_deg: pose.heading_deg(),
            speed_ms: velocity.speed_ms(),
            rate_degs: velocity.rate_degs,
            accel_mss: self.robot.acceleration(),
            distance_m: report.distance_m,
            path_length_m: report.path_length_m,
            curvature_radius_m: self.path.curvature_radius(report.t),
            accel_limited: report.accel_limited,
            running: self.follower.is_running(),
        };

        self.ticks += 1;
        self.max_speed_ms = self.max_speed_ms.max(record.speed_ms);
        if record.accel_limited {
            self.num_accel_limited += 1;
        }
        self.last_record = Some(record);

        record
    }

    /// Put the robot back at the start of the path.
    pub fn reset(&mut self) {
        self.follower.reset(&self.path, &mut self.robot);
    }

    pub fn set_running(&mut self, running: bool) {
        self.follower.set_running(running);
    }

    pub fn summary(&self) -> SimSummary {
        let pose = self.robot.pose();

        SimSummary {
            ticks: self.ticks,
            curve: self.path.kind(),
            num_waypoints: self.path.waypoints().len(),
            waypoints_version: self.path.waypoints_version(),
            path_length_m: self.path.path_length(),
            final_t: self.follower.state().t,
            final_position_m: [pose.position_m[0], pose.position_m[1]],
            final_heading_deg: pose.heading_deg(),
            max_speed_ms: self.max_speed_ms,
            num_accel_limited: self.num_accel_limited,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutable access to the path, for editing waypoints between steps.
    pub fn path_mut(&mut self) -> &mut Path {
        &mut self.path
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn follower(&self) -> &Follower {
        &self.follower
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_record(&self) -> Option<&TelemetryRecord> {
        self.last_record.as_ref()
    }
}

impl Archived for Simulation {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(record) = self.last_record {
            self.arch.serialise(record)?;
        } else {
            debug!("No telemetry to archive yet");
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::PathPreset;
    use std::time::Duration;

    fn params() -> SimExecParams {
        let mut params = SimExecParams::default();
        params.path = PathPreset::BezierCurve.into();
        params
    }

    #[test]
    fn test_new_places_robot_at_start() {
        let sim = Simulation::new(&params()).unwrap();
        assert_eq!(sim.robot().pose().position_m, sim.path().start_point());
        assert_eq!(sim.ticks(), 0);
        assert!(sim.last_record().is_none());
    }

    #[test]
    fn test_step() {
        let mut sim = Simulation::new(&params()).unwrap();
        let t0 = Instant::now();

        let mut record = TelemetryRecord::default();
        for i in 0..20 {
            record = sim.step_at(t0 + Duration::from_millis(50 * i));
        }

        assert_eq!(record.tick, 19);
        assert_eq!(sim.ticks(), 20);
        assert!(record.running);
        assert!(record.distance_m.is_some());
        assert!(record.speed_ms <= sim.robot().params().max_speed_ms + 1e-9);

        // Archiving without a session is a no-op
        assert!(sim.write().is_ok());

        let summary = sim.summary();
        assert_eq!(summary.ticks, 20);
        assert_eq!(summary.num_waypoints, 6);
        assert!(summary.max_speed_ms > 0.0);
    }

    #[test]
    fn test_idle_records() {
        let mut sim = Simulation::new(&params()).unwrap();
        sim.set_running(false);

        let start = sim.robot().pose().position_m;
        let record = sim.step();

        assert!(!record.running);
        assert!(record.distance_m.is_none());
        assert_eq!(sim.robot().pose().position_m, start);
    }

    #[test]
    fn test_edit_path_between_steps() {
        let mut sim = Simulation::new(&params()).unwrap();
        sim.step();

        sim.path_mut()
            .set_waypoint(5, nalgebra::Vector2::new(8.0, 0.0))
            .unwrap();
        sim.step();

        assert_eq!(sim.summary().waypoints_version, 1);
        assert_eq!(sim.path().location(1.0), nalgebra::Vector2::new(8.0, 0.0));
    }
}

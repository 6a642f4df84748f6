//! End to end path following tests

use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use nalgebra::Vector2;

use sim_lib::{
    follower::{Follower, FollowerParams},
    geom::{Pose2, Twist},
    params::SimExecParams,
    path::{CurveKind, Path, PathConstants, PathPreset, PathSpec, Waypoint},
    robot::{Robot, RobotParams},
    sim::Simulation,
};

const CONSTANTS: PathConstants = PathConstants {
    max_vel_ms: 5.0,
    max_accel_mss: 5.0,
    error_corrector_weight: 0.0,
};

const ROBOT: RobotParams = RobotParams {
    max_speed_ms: 5.0,
    period_s: 0.05,
};

/// Run the simulation for a number of ticks spaced one cycle apart.
fn run(sim: &mut Simulation, ticks: u64) {
    let t0 = Instant::now();
    for i in 0..ticks {
        sim.step_at(t0 + Duration::from_millis(50 * i));
    }
}

#[test]
fn test_straight_line_geometry() {
    let path = Path::polynomial_blend(
        CONSTANTS,
        vec![Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0)],
    )
    .unwrap();

    assert_eq!(path.location(0.5), Vector2::new(5.0, 0.0));
    assert_relative_eq!(path.path_length(), 10.0, epsilon = 1e-6);
}

#[test]
fn test_robot_clamps_speed() {
    let mut robot = Robot::new(Pose2::default(), ROBOT);
    robot.drive(Twist::new(Vector2::new(20.0, 0.0), 0.0));

    assert_eq!(robot.velocity().speed_ms(), 5.0);
    assert_eq!(robot.velocity().linear_ms, Vector2::new(5.0, 0.0));
}

#[test]
fn test_idle_follower_does_not_move_robot() {
    let path = PathPreset::BezierCurve.build().unwrap();
    let mut robot = Robot::new(Pose2::new(Vector2::new(0.0, 0.0), 0.0), ROBOT);
    let mut follower = Follower::new(FollowerParams::default()).unwrap();
    follower.set_running(false);

    let mut ts = Vec::new();
    for _ in 0..3 {
        ts.push(follower.update(&path, &mut robot).t);
    }

    assert_eq!(robot.pose().position_m, Vector2::new(0.0, 0.0));
    assert!(follower.state().is_located());
    assert!(ts.iter().all(|t| (0.0..=1.0).contains(t)));
}

#[test]
fn test_follows_segment_curve_to_end() {
    let params = SimExecParams {
        path: PathSpec::Custom {
            curve: CurveKind::WaypointSegment,
            dx: 0.001,
            constants: PathConstants {
                max_vel_ms: 4.5,
                max_accel_mss: 4.5,
                error_corrector_weight: 0.5,
            },
            waypoints: vec![
                Waypoint::new(0.0, 0.0, 0.0, 0.0),
                Waypoint::new(1.0, 0.0, 0.0, 0.0),
            ],
        },
        ..Default::default()
    };

    let mut sim = Simulation::new(&params).unwrap();
    run(&mut sim, 80);

    let summary = sim.summary();
    assert_eq!(summary.ticks, 80);
    assert!(summary.final_t > 0.8, "final t = {}", summary.final_t);
    assert!((summary.final_position_m[0] - 1.0).abs() < 0.2);
    assert!(summary.final_position_m[1].abs() < 0.1);
    assert!(summary.max_speed_ms <= ROBOT.max_speed_ms + 1e-9);
}

#[test]
fn test_follows_bezier_preset() {
    let mut sim = Simulation::new(&SimExecParams::default()).unwrap();
    run(&mut sim, 100);

    let record = sim.last_record().copied().unwrap();
    assert!(record.t > 0.05, "t = {}", record.t);
    assert!(record.distance_m.unwrap() > 0.5);
    assert!(record.distance_m.unwrap() < record.path_length_m.unwrap());

    // The robot stays near the path
    let closest = sim.path().closest_point(sim.robot().pose());
    assert!(closest.pose.distance_to(sim.robot().pose()) < 1.0);
}

#[test]
fn test_follows_quintic_preset() {
    let params = SimExecParams {
        path: PathPreset::Quintic.into(),
        ..Default::default()
    };
    let mut sim = Simulation::new(&params).unwrap();
    run(&mut sim, 40);

    let record = sim.last_record().copied().unwrap();
    assert_eq!(record.path_length_m, Some(sim.path().path_length()));
    assert!(record.t > 0.1, "t = {}", record.t);
    assert!(record.pos_y_m.abs() < 0.1);
}

#[test]
fn test_reset_returns_to_start() {
    let mut sim = Simulation::new(&SimExecParams::default()).unwrap();
    run(&mut sim, 20);
    assert!(sim.robot().pose().position_m != sim.path().start_point());

    sim.reset();

    assert_eq!(sim.robot().pose().position_m, sim.path().start_point());
    assert_eq!(sim.robot().velocity().speed_ms(), 0.0);
    assert_eq!(sim.follower().state().t, 0.0);
}

//! # Path module
//!
//! A path is a parametric curve over a normalised parameter `t` in [0, 1],
//! defined by an ordered list of waypoints. Two kinds of curve are supported:
//!
//! - [`CurveKind::PolynomialBlend`] - the waypoints are the control points of
//!   a Bezier curve, evaluated by repeated linear interpolation.
//! - [`CurveKind::WaypointSegment`] - the curve passes through every waypoint,
//!   with each segment traced by two heading-rate-limited cursors (see
//!   [`segment`]).
//!
//! The segment traces and the total length are derived from the waypoints and
//! rebuilt on every edit, so an edit made with [`Path::set_waypoint`] is seen
//! by the very next query. Everything else is evaluated per query.
//!
//! Derivatives are computed by central differences with the path's fixed `dx`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod blend;
pub mod preset;
pub mod segment;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// Internal
use crate::geom::{angle_of, Pose2, Twist};
pub use preset::{PathPreset, PathSpec};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default derivative step for both curve kinds.
pub const DEFAULT_DX: f64 = 0.0001;

/// Number of closest-point samples per waypoint, i.e. `dt = 0.01 / n`.
pub const SAMPLES_PER_WAYPOINT: usize = 100;

/// Upper limit on the speed reduction applied for curvature.
///
/// Units: meters/second
pub const MAX_CURVATURE_COMPENSATION: f64 = 3.5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tuning values shared by all curve kinds.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConstants {
    /// Maximum linear speed along the path
    ///
    /// Units: meters/second
    pub max_vel_ms: f64,

    /// Maximum linear acceleration along the path
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Weight in [0, 1] of the cross-track correction when building the
    /// velocity direction. The remainder goes to the path tangent.
    pub error_corrector_weight: f64,
}

/// A path control point.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position in the field frame
    pub position_m: Vector2<f64>,

    /// Desired robot heading when at this waypoint.
    ///
    /// Units: degrees
    #[serde(default)]
    pub heading_deg: f64,

    /// Direction of travel when leaving (or arriving at) this waypoint. Only
    /// used by the waypoint segment curve.
    ///
    /// Units: degrees
    #[serde(default)]
    pub movement_angle_deg: f64,
}

/// The waypoint list of a path.
///
/// Edits always replace the whole list and bump the version, so a reader
/// never observes a half-edited curve.
#[derive(Debug, Clone)]
pub struct Waypoints {
    points: Vec<Waypoint>,
    version: u64,
}

/// The closest point found on a path, and the parameter it was found at.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathState {
    pub pose: Pose2,
    pub t: f64,
}

/// A parametric path.
#[derive(Debug, Clone)]
pub struct Path {
    kind: CurveKind,
    constants: PathConstants,
    dx: f64,
    waypoints: Waypoints,

    /// Cursor traces of each segment, empty for polynomial blends
    traces: Vec<segment::SegmentTrace>,

    /// Total length for the current waypoints
    length_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The kind of curve a path evaluates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    PolynomialBlend,
    WaypointSegment,
}

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("A path needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("The derivative step must be positive and finite, got {0}")]
    InvalidDx(f64),

    #[error("Waypoint index {index} is out of range for a path with {len} waypoints")]
    WaypointIndexOutOfRange { index: usize, len: usize },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    pub fn new(x: f64, y: f64, heading_deg: f64, movement_angle_deg: f64) -> Self {
        Self {
            position_m: Vector2::new(x, y),
            heading_deg,
            movement_angle_deg,
        }
    }
}

impl From<Vector2<f64>> for Waypoint {
    fn from(position_m: Vector2<f64>) -> Self {
        Self {
            position_m,
            heading_deg: 0.0,
            movement_angle_deg: 0.0,
        }
    }
}

impl Waypoints {
    pub fn new(points: Vec<Waypoint>) -> Result<Self, PathError> {
        validate(&points)?;

        Ok(Self { points, version: 0 })
    }

    pub fn as_slice(&self) -> &[Waypoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of edits made since construction.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the whole list.
    pub fn replace(&mut self, points: Vec<Waypoint>) -> Result<(), PathError> {
        validate(&points)?;

        self.points = points;
        self.version += 1;

        Ok(())
    }

    /// Move a single waypoint, keeping its heading constraints.
    pub fn set(&mut self, index: usize, position_m: Vector2<f64>) -> Result<(), PathError> {
        let mut points = self.points.clone();

        match points.get_mut(index) {
            Some(w) => w.position_m = position_m,
            None => {
                return Err(PathError::WaypointIndexOutOfRange {
                    index,
                    len: self.points.len(),
                })
            }
        }

        self.replace(points)
    }
}

impl PathState {
    /// Parameter value meaning "no closest point has been found yet".
    pub const UNLOCATED_T: f64 = -1.0;

    pub fn new(pose: Pose2, t: f64) -> Self {
        Self { pose, t }
    }

    /// The state before any closest point search.
    pub fn unlocated() -> Self {
        Self::new(Pose2::default(), Self::UNLOCATED_T)
    }

    pub fn is_located(&self) -> bool {
        self.t >= 0.0
    }
}

impl Path {
    /// Create a new path.
    pub fn new(
        kind: CurveKind,
        constants: PathConstants,
        dx: f64,
        waypoints: Vec<Waypoint>,
    ) -> Result<Self, PathError> {
        if !(dx.is_finite() && dx > 0.0) {
            return Err(PathError::InvalidDx(dx));
        }

        let mut path = Self {
            kind,
            constants,
            dx,
            waypoints: Waypoints::new(waypoints)?,
            traces: Vec::new(),
            length_m: 0.0,
        };
        path.rebuild();

        Ok(path)
    }

    /// Create a polynomial blend (Bezier) curve with the default `dx`.
    pub fn polynomial_blend(
        constants: PathConstants,
        control_points: Vec<Vector2<f64>>,
    ) -> Result<Self, PathError> {
        Self::new(
            CurveKind::PolynomialBlend,
            constants,
            DEFAULT_DX,
            control_points.into_iter().map(Waypoint::from).collect(),
        )
    }

    /// Create a waypoint segment curve with the default `dx`.
    pub fn waypoint_segment(
        constants: PathConstants,
        waypoints: Vec<Waypoint>,
    ) -> Result<Self, PathError> {
        Self::new(CurveKind::WaypointSegment, constants, DEFAULT_DX, waypoints)
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn constants(&self) -> &PathConstants {
        &self.constants
    }

    /// The derivative step.
    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        self.waypoints.as_slice()
    }

    pub fn waypoints_version(&self) -> u64 {
        self.waypoints.version()
    }

    /// Move the waypoint at `index` to a new position.
    pub fn set_waypoint(&mut self, index: usize, position_m: Vector2<f64>) -> Result<(), PathError> {
        self.waypoints.set(index, position_m)?;
        self.rebuild();

        Ok(())
    }

    /// Replace all waypoints at once.
    pub fn replace_waypoints(&mut self, waypoints: Vec<Waypoint>) -> Result<(), PathError> {
        self.waypoints.replace(waypoints)?;
        self.rebuild();

        Ok(())
    }

    /// Location of the first waypoint.
    pub fn start_point(&self) -> Vector2<f64> {
        self.waypoints()[0].position_m
    }

    /// Number of intervals in the closest point sampling grid.
    pub fn num_samples(&self) -> usize {
        SAMPLES_PER_WAYPOINT * self.waypoints.len()
    }

    /// Step between closest point samples, `0.01 / n`.
    pub fn t_step(&self) -> f64 {
        1.0 / self.num_samples() as f64
    }

    /// The closest point sampling grid, from 0 to 1 inclusive.
    pub fn sample_ts(&self) -> impl Iterator<Item = f64> {
        let n = self.num_samples();
        (0..=n).map(move |i| i as f64 / n as f64)
    }

    /// Location of the curve at `t`.
    pub fn location(&self, t: f64) -> Vector2<f64> {
        match self.kind {
            CurveKind::PolynomialBlend => blend::location(self.waypoints(), t),
            CurveKind::WaypointSegment => segment::location(&self.traces, self.dx, t),
        }
    }

    /// Direction of travel at `t`.
    pub fn heading(&self, t: f64) -> Rotation2<f64> {
        let delta = self.location(t + self.dx) - self.location(t - self.dx);
        Rotation2::new(angle_of(&delta))
    }

    /// Location and direction of travel at `t`.
    pub fn position(&self, t: f64) -> Pose2 {
        Pose2 {
            position_m: self.location(t),
            heading: self.heading(t),
        }
    }

    /// First derivative of the location with respect to `t`.
    pub fn derivative(&self, t: f64) -> Vector2<f64> {
        (self.location(t + self.dx) - self.location(t - self.dx)) / (2.0 * self.dx)
    }

    /// Second derivative of the location with respect to `t`.
    pub fn second_derivative(&self, t: f64) -> Vector2<f64> {
        (self.derivative(t + self.dx) - self.derivative(t - self.dx)) / (2.0 * self.dx)
    }

    pub fn x_derivative(&self, t: f64) -> f64 {
        self.derivative(t)[0]
    }

    pub fn y_derivative(&self, t: f64) -> f64 {
        self.derivative(t)[1]
    }

    pub fn x_second_derivative(&self, t: f64) -> f64 {
        self.second_derivative(t)[0]
    }

    pub fn y_second_derivative(&self, t: f64) -> f64 {
        self.second_derivative(t)[1]
    }

    /// Signed radius of curvature at `t`. Positive radii turn left.
    ///
    /// On a straight section the denominator is zero and the radius is
    /// infinite (or NaN on a zero length path). Callers must treat very large
    /// or non-finite radii as straight.
    pub fn curvature_radius(&self, t: f64) -> f64 {
        let d1 = self.derivative(t);
        let d2 = self.second_derivative(t);

        (d1[0].powi(2) + d1[1].powi(2)).powf(1.5) / (d1[0] * d2[1] - d1[1] * d2[0])
    }

    /// Arc length between two parameters.
    ///
    /// Trapezoidal integration of the speed `|d(location)/dt|` in steps of
    /// `dx` starting from `t1`, with a shorter final step to land on `t2`. If
    /// `t2 < t1` the result is negative.
    pub fn arc_length(&self, t1: f64, t2: f64) -> f64 {
        if t2 < t1 {
            return -self.arc_length(t2, t1);
        }

        let num_steps = ((t2 - t1) / self.dx).floor() as usize;

        let mut length = 0f64;
        let mut prev_t = t1;
        let mut prev_speed = self.derivative(t1).norm();

        for i in 1..=num_steps {
            let t = t1 + i as f64 * self.dx;
            let speed = self.derivative(t).norm();
            length += 0.5 * (prev_speed + speed) * (t - prev_t);
            prev_t = t;
            prev_speed = speed;
        }

        // Final partial step
        if t2 - prev_t > 0.0 {
            let speed = self.derivative(t2).norm();
            length += 0.5 * (prev_speed + speed) * (t2 - prev_t);
        }

        length
    }

    /// Total length of the path, `arc_length(0, 1)` for the current waypoints.
    pub fn path_length(&self) -> f64 {
        self.length_m
    }

    /// Brute force search for the point on the path closest to the given pose.
    ///
    /// Samples every `t` in [`Path::sample_ts`]. Ties go to the lowest `t`.
    pub fn closest_point(&self, pose: &Pose2) -> PathState {
        let mut min_t = 0f64;
        let mut min_dist = std::f64::MAX;

        for t in self.sample_ts() {
            let dist = (self.location(t) - pose.position_m).norm();
            if dist < min_dist {
                min_dist = dist;
                min_t = t;
            }
        }

        PathState::new(self.position(min_t), min_t)
    }

    /// Intermediate points of the Bezier reduction after `times` rounds.
    ///
    /// Returns `None` for curves which are not polynomial blends.
    pub fn bezier_points(&self, t: f64, times: usize) -> Option<Vec<Vector2<f64>>> {
        match self.kind {
            CurveKind::PolynomialBlend => Some(blend::bezier_points(self.waypoints(), t, times)),
            CurveKind::WaypointSegment => None,
        }
    }

    /// The robot heading the waypoints ask for at `t`.
    ///
    /// Only waypoint segment curves carry heading targets, for other curves
    /// `None` is returned.
    pub fn target_heading_deg(&self, t: f64) -> Option<f64> {
        match self.kind {
            CurveKind::PolynomialBlend => None,
            CurveKind::WaypointSegment => {
                Some(segment::target_heading_deg(self.waypoints(), self.dx, t))
            }
        }
    }

    /// Build the velocity command for a robot near the path.
    ///
    /// The direction blends the path tangent at `state.t` with the vector from
    /// the robot to the closest point, weighted by the error corrector weight.
    /// The speed is the lower of `speed_ms` and the maximum speed reduced by
    /// the local curvature (capped at [`MAX_CURVATURE_COMPENSATION`]).
    pub fn velocity_command(
        &self,
        state: &PathState,
        robot: &Pose2,
        speed_ms: f64,
        rate_degs: f64,
    ) -> Twist {
        let weight = self.constants.error_corrector_weight;

        let tangent_rad = self.heading(state.t).angle();
        let tangent = Vector2::new(tangent_rad.cos(), tangent_rad.sin());
        let correction = state.pose.position_m - robot.position_m;
        let direction = tangent * (1.0 - weight) + correction * weight;

        let mut curvature = 1.0 / self.curvature_radius(state.t).abs();
        if !curvature.is_finite() {
            curvature = 0.0;
        }

        let speed_ms = speed_ms
            .min(self.constants.max_vel_ms - curvature.min(MAX_CURVATURE_COMPENSATION));

        Twist::from_polar(speed_ms, angle_of(&direction), rate_degs)
    }

    /// Recompute everything derived from the waypoints.
    fn rebuild(&mut self) {
        self.traces = match self.kind {
            CurveKind::PolynomialBlend => Vec::new(),
            CurveKind::WaypointSegment => segment::trace_all(self.waypoints(), self.dx),
        };
        self.length_m = self.arc_length(0.0, 1.0);

        trace!(
            "Path rebuilt at waypoints version {}, length {:.04} m",
            self.waypoints_version(),
            self.length_m
        );
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn validate(points: &[Waypoint]) -> Result<(), PathError> {
    if points.len() < 2 {
        Err(PathError::TooFewWaypoints(points.len()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    const CONSTANTS: PathConstants = PathConstants {
        max_vel_ms: 5.0,
        max_accel_mss: 5.0,
        error_corrector_weight: 0.0,
    };

    fn line() -> Path {
        Path::polynomial_blend(CONSTANTS, vec![Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0)])
            .unwrap()
    }

    fn arch() -> Path {
        Path::polynomial_blend(
            CONSTANTS,
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(0.0, 4.0),
                Vector2::new(4.0, 4.0),
                Vector2::new(4.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_construction() {
        match Path::polynomial_blend(CONSTANTS, vec![Vector2::new(1.0, 1.0)]) {
            Err(PathError::TooFewWaypoints(1)) => (),
            r => panic!("Expected TooFewWaypoints, got {:?}", r),
        }

        match Path::new(CurveKind::PolynomialBlend, CONSTANTS, 0.0, vec![Waypoint::new(0.0, 0.0, 0.0, 0.0); 2]) {
            Err(PathError::InvalidDx(_)) => (),
            r => panic!("Expected InvalidDx, got {:?}", r),
        }

        let path = line();
        assert_eq!(path.kind(), CurveKind::PolynomialBlend);
        assert_eq!(path.dx(), DEFAULT_DX);
        assert_eq!(path.start_point(), Vector2::new(0.0, 0.0));
    }

    #[test]
    fn test_line_scenario() {
        let path = line();

        assert_eq!(path.location(0.5), Vector2::new(5.0, 0.0));
        assert_relative_eq!(path.path_length(), 10.0, epsilon = 1e-6);
        assert_relative_eq!(path.x_derivative(0.3), 10.0, epsilon = 1e-6);
        assert_relative_eq!(path.y_derivative(0.3), 0.0, epsilon = 1e-9);
        assert_relative_eq!(path.heading(0.5).angle(), 0.0, epsilon = 1e-9);

        // A straight line has no curvature, so the radius is not finite
        assert!(!path.curvature_radius(0.5).is_finite());
    }

    #[test]
    fn test_endpoints_exact() {
        let path = arch();
        assert_eq!(path.location(0.0), Vector2::new(0.0, 0.0));
        assert_eq!(path.location(1.0), Vector2::new(4.0, 0.0));
    }

    #[test]
    fn test_arc_length_monotonic() {
        let path = arch();

        let mut prev = 0f64;
        for i in 0..=20 {
            let len = path.arc_length(0.0, i as f64 / 20.0);
            assert!(len >= prev, "arc length decreased at t = {}", i as f64 / 20.0);
            prev = len;
        }

        // Total is at least the chord between the ends
        assert!(path.path_length() >= 4.0);

        // Reversed bounds give a negative length
        assert_relative_eq!(path.arc_length(0.5, 0.25), -path.arc_length(0.25, 0.5));
        assert_eq!(path.arc_length(0.3, 0.3), 0.0);
    }

    #[test]
    fn test_curvature_sign() {
        // The arch turns right (clockwise) at its apex
        let path = arch();
        assert!(path.curvature_radius(0.5) < 0.0);

        // Mirrored in X it turns left
        let path = Path::polynomial_blend(
            CONSTANTS,
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(0.0, 4.0),
                Vector2::new(-4.0, 4.0),
                Vector2::new(-4.0, 0.0),
            ],
        )
        .unwrap();
        assert!(path.curvature_radius(0.5) > 0.0);
    }

    #[test]
    fn test_curvature_radius_of_parabola() {
        // x = 2t - 1, y = (x^2 + 1) / 2, radius 1 at the vertex
        let path = Path::polynomial_blend(
            CONSTANTS,
            vec![Vector2::new(-1.0, 1.0), Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)],
        )
        .unwrap();
        assert_relative_eq!(path.curvature_radius(0.5), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_derivative_accuracy_scales_with_dx() {
        // y = 4t^3 (cubic Bezier with control points 0, 0, 0, 4)
        let points = vec![
            Waypoint::new(0.0, 0.0, 0.0, 0.0),
            Waypoint::new(1.0 / 3.0, 0.0, 0.0, 0.0),
            Waypoint::new(2.0 / 3.0, 0.0, 0.0, 0.0),
            Waypoint::new(1.0, 4.0, 0.0, 0.0),
        ];
        let exact = 12.0 * 0.5f64.powi(2);

        let coarse = Path::new(CurveKind::PolynomialBlend, CONSTANTS, 0.01, points.clone()).unwrap();
        let fine = Path::new(CurveKind::PolynomialBlend, CONSTANTS, 0.001, points).unwrap();

        let coarse_err = (coarse.y_derivative(0.5) - exact).abs();
        let fine_err = (fine.y_derivative(0.5) - exact).abs();
        assert!(fine_err < coarse_err);

        // The second derivative of a cubic is linear, so central differences are exact
        assert_relative_eq!(coarse.y_second_derivative(0.5), 12.0, epsilon = 1e-6);
        assert_relative_eq!(coarse.x_second_derivative(0.5), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_closest_point() {
        let path = arch();
        let query = Pose2::new(Vector2::new(2.0, 5.0), 0.0);
        let closest = path.closest_point(&query);

        // No grid sample is strictly closer
        let best = (closest.pose.position_m - query.position_m).norm();
        for t in path.sample_ts() {
            assert!((path.location(t) - query.position_m).norm() >= best);
        }

        // By symmetry the closest point is the apex
        assert_relative_eq!(closest.t, 0.5, epsilon = path.t_step());
        assert_eq!(closest.pose.position_m, path.location(closest.t));
    }

    #[test]
    fn test_closest_point_tie_breaks_low() {
        // Every sample of a zero length path is equally close
        let path = Path::polynomial_blend(
            CONSTANTS,
            vec![Vector2::new(1.0, 1.0), Vector2::new(1.0, 1.0)],
        )
        .unwrap();
        let state = path.closest_point(&Pose2::default());
        assert_eq!(state.t, 0.0);
        assert_eq!(state.pose.position_m, Vector2::new(1.0, 1.0));
    }

    #[test]
    fn test_sampling_grid() {
        let path = arch();
        assert_relative_eq!(path.t_step(), 0.01 / 4.0);

        let ts: Vec<f64> = path.sample_ts().collect();
        assert_eq!(ts.len(), 401);
        assert_eq!(ts[0], 0.0);
        assert_eq!(*ts.last().unwrap(), 1.0);
    }

    #[test]
    fn test_waypoint_edit() {
        let mut path = line();
        assert_eq!(path.waypoints_version(), 0);

        path.set_waypoint(1, Vector2::new(0.0, 10.0)).unwrap();
        assert_eq!(path.waypoints_version(), 1);
        assert_eq!(path.location(0.5), Vector2::new(0.0, 5.0));

        match path.set_waypoint(2, Vector2::zeros()) {
            Err(PathError::WaypointIndexOutOfRange { index: 2, len: 2 }) => (),
            r => panic!("Expected WaypointIndexOutOfRange, got {:?}", r),
        }

        // A failed replace leaves the path untouched
        assert!(path.replace_waypoints(vec![]).is_err());
        assert_eq!(path.waypoints().len(), 2);
        assert_eq!(path.waypoints_version(), 1);
    }

    #[test]
    fn test_velocity_command() {
        let path = line();
        let state = path.closest_point(&Pose2::new(Vector2::new(5.0, 1.0), 0.0));
        let robot = Pose2::new(Vector2::new(5.0, 1.0), 0.0);

        // Pure tangent following heads along +X
        let cmd = path.velocity_command(&state, &robot, 2.0, 15.0);
        assert_relative_eq!(cmd.linear_ms, Vector2::new(2.0, 0.0), epsilon = 1e-9);
        assert_eq!(cmd.rate_degs, 15.0);

        // Speed is capped at the maximum
        let cmd = path.velocity_command(&state, &robot, 20.0, 0.0);
        assert_relative_eq!(cmd.speed_ms(), 5.0, epsilon = 1e-9);

        // Full error correction heads straight for the path
        let mut constants = CONSTANTS;
        constants.error_corrector_weight = 1.0;
        let path = Path::polynomial_blend(
            constants,
            vec![Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0)],
        )
        .unwrap();
        let cmd = path.velocity_command(&state, &robot, 1.0, 0.0);
        assert_relative_eq!(cmd.linear_ms, Vector2::new(0.0, -1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_edit_refreshes_length_and_traces() {
        let mut path = Path::new(
            CurveKind::WaypointSegment,
            CONSTANTS,
            0.001,
            vec![Waypoint::new(0.0, 0.0, 0.0, 0.0), Waypoint::new(2.0, 0.0, 0.0, 0.0)],
        )
        .unwrap();
        // The ends are clamped inside [dx/2, 1 - dx/2]
        assert_relative_eq!(path.path_length(), 2.0, epsilon = 1e-2);

        path.set_waypoint(1, Vector2::new(4.0, 0.0)).unwrap();
        assert_relative_eq!(path.path_length(), 4.0, epsilon = 2e-2);
        assert_relative_eq!(path.location(0.5), Vector2::new(2.0, 0.0), epsilon = 1e-6);

        path.replace_waypoints(vec![
            Waypoint::new(0.0, 0.0, 0.0, 0.0),
            Waypoint::new(1.0, 0.0, 0.0, 0.0),
            Waypoint::new(1.0, 1.0, 0.0, 90.0),
        ])
        .unwrap();
        assert_eq!(path.location(0.5), Vector2::new(1.0, 0.0));
        assert_eq!(path.path_length(), path.arc_length(0.0, 1.0));
    }

    #[test]
    fn test_segment_curve_has_curvature() {
        // Leave along +X, arrive along +Y
        let path = Path::new(
            CurveKind::WaypointSegment,
            CONSTANTS,
            0.001,
            vec![Waypoint::new(0.0, 0.0, 0.0, 0.0), Waypoint::new(2.0, 2.0, 0.0, 90.0)],
        )
        .unwrap();

        let curved = (1..200)
            .map(|i| path.curvature_radius(i as f64 / 200.0))
            .filter(|r| r.is_finite() && *r > 0.0 && *r < 10.0)
            .count();
        assert!(curved >= 15, "only {} curved samples", curved);

        // The turn slows the commanded speed
        let state = PathState::new(path.position(0.05), 0.05);
        let cmd = path.velocity_command(&state, &state.pose, 10.0, 0.0);
        assert!(cmd.speed_ms() < CONSTANTS.max_vel_ms - 0.1);
    }

    #[test]
    fn test_velocity_command_slows_for_curvature() {
        // Tight parabola, radius 1 at the vertex, so speed drops by 1
        let path = Path::polynomial_blend(
            CONSTANTS,
            vec![Vector2::new(-1.0, 1.0), Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)],
        )
        .unwrap();
        let state = PathState::new(path.position(0.5), 0.5);
        let cmd = path.velocity_command(&state, &state.pose, 10.0, 0.0);
        assert_relative_eq!(cmd.speed_ms(), 4.0, epsilon = 1e-3);
    }

    #[test]
    fn test_velocity_command_curvature_reduction_capped() {
        // Hairpin y = 100x^2, radius 0.005 at the vertex
        let path = Path::polynomial_blend(
            CONSTANTS,
            vec![Vector2::new(-0.1, 1.0), Vector2::new(0.0, -1.0), Vector2::new(0.1, 1.0)],
        )
        .unwrap();
        assert_relative_eq!(path.curvature_radius(0.5), 0.005, epsilon = 1e-6);

        let state = PathState::new(path.position(0.5), 0.5);
        let cmd = path.velocity_command(&state, &state.pose, 10.0, 0.0);
        assert_relative_eq!(
            cmd.speed_ms(),
            CONSTANTS.max_vel_ms - MAX_CURVATURE_COMPENSATION,
            epsilon = 1e-9
        );
        assert_relative_eq!(cmd.linear_ms[1], 0.0, epsilon = 1e-9);
    }
}

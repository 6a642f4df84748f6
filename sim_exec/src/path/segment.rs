//! # Waypoint segment curve
//!
//! The curve passes through every waypoint. The parameter picks the active
//! segment, `floor(t * (n - 1))`, and is then remapped into [0, 1] along that
//! segment.
//!
//! Inside a segment the shape is traced by two cursors. One leaves the start
//! waypoint along its movement angle, the other leaves the end waypoint
//! backwards along the end movement angle. On every nudge each cursor turns
//! towards the other by at most [`MAX_TURN_PER_NUDGE_RAD`] and steps forward.
//! Tracing stops once the cursors are within `3 * dx` of each other, where the
//! two trails are joined at their midpoint.
//!
//! The joined trail is evaluated as a cubic Hermite spline over its chord
//! length, so the curve has a continuous tangent and a non-zero second
//! derivative wherever the cursors turned. The tangents at the waypoints are
//! their movement angles.
//!
//! Tracing is done once per segment by [`trace_all`], evaluation only
//! interpolates the stored trails.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use nalgebra::Vector2;

use util::maths::{get_ang_dist_2pi, input_modulus, lin_map};

use super::Waypoint;
use crate::geom::angle_of;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest heading change a cursor can make in one nudge.
pub const MAX_TURN_PER_NUDGE_RAD: f64 = 5.0 * std::f64::consts::PI / 180.0;

/// Cursor step as a fraction of the segment's straight line length.
pub const NUDGE_FRACTION: f64 = 0.01;

/// Cursors stop once closer than this many `dx`.
pub const MEET_DISTANCE_DX: f64 = 3.0;

/// Safety limit on the number of nudges in one trace.
pub const MAX_NUDGES: usize = 1000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The joined trails of the two cursors across one segment.
#[derive(Debug, Clone)]
pub struct SegmentTrace {
    /// Trail points from the start waypoint to the end waypoint
    points: Vec<Vector2<f64>>,

    /// Unit tangent of the curve at each trail point
    tangents: Vec<Vector2<f64>>,

    /// Chord length from the start waypoint to each trail point
    knots_m: Vec<f64>,

    /// Number of nudges made by each cursor
    nudges: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SegmentTrace {
    /// Trace the segment between two waypoints.
    pub fn build(start: &Waypoint, end: &Waypoint, dx: f64) -> Self {
        let step_m = NUDGE_FRACTION * (end.position_m - start.position_m).norm();
        let meet_m = MEET_DISTANCE_DX * dx;

        let mut p1 = start.position_m;
        let mut p2 = end.position_m;
        let mut h1 = start.movement_angle_deg.to_radians();
        let mut h2 = end.movement_angle_deg.to_radians() + std::f64::consts::PI;

        let mut forward = vec![p1];
        let mut backward = vec![p2];
        let mut nudges = 0;

        while nudges < MAX_NUDGES {
            let gap = p2 - p1;
            let gap_m = gap.norm();
            if gap_m <= meet_m {
                break;
            }

            let bearing = angle_of(&gap);
            h1 = limit_turn(h1, bearing, MAX_TURN_PER_NUDGE_RAD);
            h2 = limit_turn(h2, bearing + std::f64::consts::PI, MAX_TURN_PER_NUDGE_RAD);

            let step = step_m.min(0.5 * gap_m);
            p1 += unit(h1) * step;
            p2 += unit(h2) * step;

            forward.push(p1);
            backward.push(p2);
            nudges += 1;
        }

        if nudges == MAX_NUDGES {
            warn!(
                "Segment cursors still {:.06} m apart after {} nudges",
                (p2 - p1).norm(),
                MAX_NUDGES
            );
        }

        // Join the trails, replacing the two meeting cursors by their midpoint
        let mut points = forward;
        if nudges > 0 && (p2 - p1).norm() <= meet_m {
            let last = points.len() - 1;
            points[last] = (p1 + p2) * 0.5;
            backward.pop();
        }
        points.extend(backward.into_iter().rev());

        let num_points = points.len();
        let mut tangents = Vec::with_capacity(num_points);
        tangents.push(unit(start.movement_angle_deg.to_radians()));
        for i in 1..num_points - 1 {
            let prev = tangents[i - 1];
            tangents.push(
                (points[i + 1] - points[i - 1])
                    .try_normalize(std::f64::EPSILON)
                    .unwrap_or(prev),
            );
        }
        tangents.push(unit(end.movement_angle_deg.to_radians()));

        let mut knots_m = Vec::with_capacity(num_points);
        let mut length_m = 0.0;
        knots_m.push(length_m);
        for pair in points.windows(2) {
            length_m += (pair[1] - pair[0]).norm();
            knots_m.push(length_m);
        }

        Self {
            points,
            tangents,
            knots_m,
            nudges,
        }
    }

    /// Position at a local parameter in [0, 1].
    ///
    /// The local parameter is proportional to the chord length along the
    /// joined trail.
    pub fn at(&self, local: f64) -> Vector2<f64> {
        let length_m = self.length_m();
        if length_m <= 0.0 {
            return self.points[0];
        }

        let s_m = local.max(0.0).min(1.0) * length_m;
        let last = self.points.len() - 1;
        let i = self.knots_m.partition_point(|&k| k <= s_m).max(1).min(last) - 1;

        let chord_m = self.knots_m[i + 1] - self.knots_m[i];
        if chord_m <= 0.0 {
            return self.points[i];
        }

        hermite(
            self.points[i],
            self.tangents[i] * chord_m,
            self.points[i + 1],
            self.tangents[i + 1] * chord_m,
            (s_m - self.knots_m[i]) / chord_m,
        )
    }

    /// Number of nudges made by each cursor.
    pub fn num_nudges(&self) -> usize {
        self.nudges
    }

    /// Length of the joined trail.
    pub fn length_m(&self) -> f64 {
        self.knots_m[self.knots_m.len() - 1]
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Trace every segment of a waypoint list.
pub fn trace_all(points: &[Waypoint], dx: f64) -> Vec<SegmentTrace> {
    points
        .windows(2)
        .map(|pair| SegmentTrace::build(&pair[0], &pair[1], dx))
        .collect()
}

/// Location of the curve at `t`, given the traces of all segments.
pub fn location(traces: &[SegmentTrace], dx: f64, t: f64) -> Vector2<f64> {
    let (index, local) = locate(traces.len() + 1, dx, t);

    traces[index].at(local)
}

/// Target robot heading at `t`, interpolated along the shortest arc between
/// the headings of the active segment's waypoints.
///
/// Units: degrees, in [0, 360)
pub fn target_heading_deg(points: &[Waypoint], dx: f64, t: f64) -> f64 {
    let (index, local) = locate(points.len(), dx, t);

    let from = points[index].heading_deg.to_radians();
    let to = points[index + 1].heading_deg.to_radians();
    let heading = lin_map((0.0, 1.0), (from, from + get_ang_dist_2pi(from, to)), local);

    input_modulus(heading.to_degrees(), 0.0, 360.0)
}

/// Find the active segment index and the local parameter within it.
///
/// `t` is first clamped to `[dx/2, 1 - dx/2]` so derivatives are never taken
/// exactly at the ends of the curve. Requires at least two points.
pub fn locate(num_points: usize, dx: f64, t: f64) -> (usize, f64) {
    let t = t.max(0.5 * dx).min(1.0 - 0.5 * dx);
    let num_segments = (num_points - 1) as f64;

    let index = ((t * num_segments).floor() as usize).min(num_points - 2);
    let local = t * num_segments - index as f64;

    (index, local)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Turn `current` towards `target` by no more than `max`.
fn limit_turn(current: f64, target: f64, max: f64) -> f64 {
    let turn = get_ang_dist_2pi(current, target);
    current + turn.max(-max).min(max)
}

/// Unit vector along an angle.
fn unit(angle_rad: f64) -> Vector2<f64> {
    Vector2::new(angle_rad.cos(), angle_rad.sin())
}

/// Cubic Hermite interpolation between two points with the given end
/// derivatives, `f` in [0, 1].
fn hermite(
    p0: Vector2<f64>,
    m0: Vector2<f64>,
    p1: Vector2<f64>,
    m1: Vector2<f64>,
    f: f64,
) -> Vector2<f64> {
    let f2 = f * f;
    let f3 = f2 * f;

    p0 * (2.0 * f3 - 3.0 * f2 + 1.0)
        + m0 * (f3 - 2.0 * f2 + f)
        + p1 * (3.0 * f2 - 2.0 * f3)
        + m1 * (f3 - f2)
}

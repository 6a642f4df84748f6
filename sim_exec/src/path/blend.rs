//! # Polynomial blend curve
//!
//! Evaluates a Bezier curve by repeatedly interpolating adjacent control
//! points until a single point remains. Nothing is cached, every call starts
//! again from the control points.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use super::Waypoint;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Location of the curve at `t`.
pub fn location(points: &[Waypoint], t: f64) -> Vector2<f64> {
    let mut reduced = positions(points);

    while reduced.len() > 1 {
        reduced = reduce(&reduced, t);
    }

    reduced.first().copied().unwrap_or_else(Vector2::zeros)
}

/// The point set left after `times` reduction rounds.
///
/// Reduction stops early once a single point is left, so any `times` of at
/// least `n - 1` gives the curve location.
pub fn bezier_points(points: &[Waypoint], t: f64, times: usize) -> Vec<Vector2<f64>> {
    let mut reduced = positions(points);

    for _ in 0..times {
        if reduced.len() <= 1 {
            break;
        }
        reduced = reduce(&reduced, t);
    }

    reduced
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn positions(points: &[Waypoint]) -> Vec<Vector2<f64>> {
    points.iter().map(|w| w.position_m).collect()
}

/// One round of linear interpolation between neighbouring points.
fn reduce(points: &[Vector2<f64>], t: f64) -> Vec<Vector2<f64>> {
    points
        .windows(2)
        .map(|pair| pair[0] * (1.0 - t) + pair[1] * t)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn points() -> Vec<Waypoint> {
        vec![
            Waypoint::new(2.0, -3.0, 0.0, 0.0),
            Waypoint::new(-5.0, 2.0, 0.0, 0.0),
            Waypoint::new(-2.0, 1.0, 0.0, 0.0),
            Waypoint::new(-6.0, -2.0, 0.0, 0.0),
            Waypoint::new(3.0, 3.0, 0.0, 0.0),
            Waypoint::new(7.0, -1.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_endpoints() {
        let points = points();
        assert_eq!(location(&points, 0.0), Vector2::new(2.0, -3.0));
        assert_eq!(location(&points, 1.0), Vector2::new(7.0, -1.0));
    }

    #[test]
    fn test_quadratic() {
        let points = vec![
            Waypoint::new(0.0, 0.0, 0.0, 0.0),
            Waypoint::new(1.0, 2.0, 0.0, 0.0),
            Waypoint::new(2.0, 0.0, 0.0, 0.0),
        ];

        // B(t) = (2t, 4t(1 - t))
        for &t in &[0.1, 0.25, 0.5, 0.8] {
            let p = location(&points, t);
            assert_relative_eq!(p[0], 2.0 * t, epsilon = 1e-12);
            assert_relative_eq!(p[1], 4.0 * t * (1.0 - t), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bezier_points() {
        let points = points();

        assert_eq!(bezier_points(&points, 0.5, 0).len(), 6);

        let first = bezier_points(&points, 0.5, 1);
        assert_eq!(first.len(), 5);
        assert_eq!(first[0], Vector2::new(-1.5, -0.5));

        // Running out of points saturates at the curve location
        let last = bezier_points(&points, 0.3, 5);
        assert_eq!(last, vec![location(&points, 0.3)]);
        assert_eq!(bezier_points(&points, 0.3, 50), last);
    }
}

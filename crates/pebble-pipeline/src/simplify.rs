//! Polygon approximation using the Ramer-Douglas-Peucker algorithm.
//!
//! The filter pipeline does not use the approximated outline as geometry.
//! It only counts the surviving vertices: a natural stone silhouette keeps
//! more vertices at a perimeter-proportional tolerance than a blobby
//! fragment does.

use crate::types::{Contour, Point};

/// Simplify an open polyline using the Ramer-Douglas-Peucker algorithm.
///
/// Points within `tolerance` pixels of the line between their endpoints
/// are removed. A tolerance of 0.0 preserves all points. Inputs with
/// fewer than 3 points are returned unchanged.
#[must_use = "returns the simplified points"]
pub fn simplify_open(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    rdp_recurse(points, 0, points.len() - 1, tolerance, &mut kept);

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Approximate a closed contour with fewer vertices.
///
/// The ring is split at two mutually distant points (the point farthest
/// from the first point, then the point farthest from that one) and each
/// arc is simplified independently, so the result does not depend on
/// where the tracer happened to start.
#[must_use = "returns the approximated contour"]
pub fn approximate_closed(contour: &Contour, tolerance: f64) -> Contour {
    let points = contour.points();
    let n = points.len();
    if n < 3 {
        return contour.clone();
    }

    let b = farthest_from(points, points[0]);
    let a = farthest_from(points, points[b]);
    if a == b {
        // Every point coincides.
        return Contour::new(vec![points[0]]);
    }

    // Arc a -> b and arc b -> a, both walking forward around the ring.
    let arc = |from: usize, to: usize| -> Vec<Point> {
        let len = (to + n - from) % n + 1;
        (0..len).map(|k| points[(from + k) % n]).collect()
    };
    let first = simplify_open(&arc(a, b), tolerance);
    let second = simplify_open(&arc(b, a), tolerance);

    // Each arc ends where the other begins; drop the shared end points.
    let mut vertices = Vec::with_capacity(first.len() + second.len());
    vertices.extend_from_slice(&first[..first.len() - 1]);
    vertices.extend_from_slice(&second[..second.len() - 1]);
    Contour::new(vertices)
}

/// Index of the point farthest from `origin` (first wins ties).
fn farthest_from(points: &[Point], origin: Point) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance_squared(origin);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

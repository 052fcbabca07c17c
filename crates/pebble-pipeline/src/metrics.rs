//! Shape descriptors for a single contour.
//!
//! Every function here is pure and deterministic. Hull-based descriptors
//! need a hull with at least three vertices and non-zero area; anything
//! less yields [`ShapeMetrics::Degenerate`] instead of an error, so one
//! malformed mask can never abort a batch.

use geo::{Area, ConvexHull, Coord, LineString, MultiPoint, Polygon};
use serde::{Deserialize, Serialize};

use crate::simplify::approximate_closed;
use crate::types::{Contour, Point};

/// Guard added to ratio denominators.
pub const RATIO_EPSILON: f64 = 1e-6;

/// Enclosed area of a closed polygon (shoelace, always non-negative).
///
/// Fewer than three points enclose nothing.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let ring: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(LineString::from(ring), vec![]).unsigned_area()
}

/// Length of a closed polyline, including the closing segment.
#[must_use]
pub fn closed_perimeter(points: &[Point]) -> f64 {
    match points {
        [] | [_] => 0.0,
        [.., last] => {
            let open: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
            open + last.distance(points[0])
        }
    }
}

/// Convex hull vertices of a point set, without the closing repeat.
#[must_use]
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let cloud: MultiPoint<f64> = points.iter().map(|p| geo::Point::new(p.x, p.y)).collect();
    let hull = cloud.convex_hull();
    let mut vertices: Vec<Point> = hull
        .exterior()
        .coords()
        .map(|c| Point::new(c.x, c.y))
        .collect();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices.dedup();
    vertices
}

/// Isoperimetric ratio `4*pi*area / perimeter^2`.
///
/// 1.0 for a perfect circle, smaller for irregular shapes. Undefined when
/// either input is not positive.
#[must_use]
pub fn roundness(area: f64, perimeter: f64) -> Option<f64> {
    (area > 0.0 && perimeter > 0.0)
        .then(|| 4.0 * std::f64::consts::PI * area / (perimeter * perimeter))
}

/// How far a contour departs from its convex hull.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HullDeficit {
    /// Area enclosed by the contour.
    pub contour_area: f64,
    /// Closed length of the contour.
    pub contour_perimeter: f64,
    /// Area enclosed by the convex hull.
    pub hull_area: f64,
    /// Closed length of the convex hull.
    pub hull_perimeter: f64,
    /// `max(hull_area - contour_area, 0)`.
    pub defect_area: f64,
    /// `defect_area / (hull_area + eps)`.
    pub defect_ratio: f64,
    /// `contour_perimeter - hull_perimeter`.
    pub perimeter_difference: f64,
    /// `perimeter_difference / (hull_perimeter + eps)`.
    pub perimeter_defect_ratio: f64,
}

impl HullDeficit {
    /// Compare a contour with its convex hull.
    ///
    /// Returns `None` when the hull has fewer than three vertices or
    /// encloses no area (empty, single-point or collinear contours).
    #[must_use]
    pub fn measure(contour: &Contour) -> Option<Self> {
        let hull = convex_hull(contour.points());
        if hull.len() < 3 {
            return None;
        }
        let hull_area = polygon_area(&hull);
        if hull_area <= 0.0 {
            return None;
        }

        let contour_area = polygon_area(contour.points());
        let contour_perimeter = closed_perimeter(contour.points());
        let hull_perimeter = closed_perimeter(&hull);

        let defect_area = (hull_area - contour_area).max(0.0);
        let perimeter_difference = contour_perimeter - hull_perimeter;
        Some(Self {
            contour_area,
            contour_perimeter,
            hull_area,
            hull_perimeter,
            defect_area,
            defect_ratio: defect_area / (hull_area + RATIO_EPSILON),
            perimeter_difference,
            perimeter_defect_ratio: perimeter_difference / (hull_perimeter + RATIO_EPSILON),
        })
    }

    /// `contour_area / (hull_area + eps)`.
    #[must_use]
    pub fn solidity(&self) -> f64 {
        self.contour_area / (self.hull_area + RATIO_EPSILON)
    }
}

/// Complexity of a contour after polygon approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
    /// Closed length of the contour.
    pub perimeter: f64,
    /// Approximation tolerance, `epsilon_factor * perimeter`.
    pub epsilon: f64,
    /// Vertices left after approximation.
    pub vertex_count: usize,
}

impl Complexity {
    /// Approximate `contour` with a tolerance proportional to its perimeter.
    #[must_use]
    pub fn measure(contour: &Contour, epsilon_factor: f64) -> Self {
        let perimeter = closed_perimeter(contour.points());
        let epsilon = epsilon_factor * perimeter;
        Self {
            perimeter,
            epsilon,
            vertex_count: approximate_closed(contour, epsilon).len(),
        }
    }
}

/// Full set of descriptors for a contour with a usable convex hull.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    /// Enclosed contour area in square pixels.
    pub area: f64,
    /// Closed contour length in pixels.
    pub perimeter: f64,
    /// Convex hull area.
    pub convex_hull_area: f64,
    /// Convex hull perimeter.
    pub convex_hull_perimeter: f64,
    /// Hull area not covered by the contour.
    pub hull_defect_area: f64,
    /// Hull defect area relative to hull area.
    pub hull_defect_ratio: f64,
    /// Contour perimeter minus hull perimeter.
    pub perimeter_difference: f64,
    /// Perimeter difference relative to hull perimeter.
    pub perimeter_defect_ratio: f64,
    /// Contour area relative to hull area, in `[0, 1]`.
    pub solidity: f64,
    /// Isoperimetric ratio, `None` when undefined.
    pub roundness: Option<f64>,
    /// Vertex count after polygon approximation.
    pub approximated_vertex_count: usize,
}

/// What can still be said about a contour without a usable hull.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegenerateShape {
    /// Enclosed contour area in square pixels.
    pub area: f64,
    /// Closed contour length in pixels.
    pub perimeter: f64,
    /// Isoperimetric ratio, `None` when undefined.
    pub roundness: Option<f64>,
    /// Vertex count after polygon approximation.
    pub approximated_vertex_count: usize,
}

/// Shape descriptors of one candidate's representative contour.
///
/// `Degenerate` separates "unmeasurable" from "measured and poor": a
/// degenerate shape fails every hull-based acceptance test regardless of
/// thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeMetrics {
    /// The convex hull is a proper polygon.
    Measured(Measurements),
    /// The convex hull has fewer than three vertices or no area.
    Degenerate(DegenerateShape),
}

impl ShapeMetrics {
    /// Compute every descriptor for `contour`.
    ///
    /// `epsilon_factor` scales the polygon approximation tolerance with
    /// the contour perimeter.
    #[must_use]
    pub fn measure(contour: &Contour, epsilon_factor: f64) -> Self {
        let complexity = Complexity::measure(contour, epsilon_factor);
        match HullDeficit::measure(contour) {
            Some(hull) => Self::Measured(Measurements {
                area: hull.contour_area,
                perimeter: hull.contour_perimeter,
                convex_hull_area: hull.hull_area,
                convex_hull_perimeter: hull.hull_perimeter,
                hull_defect_area: hull.defect_area,
                hull_defect_ratio: hull.defect_ratio,
                perimeter_difference: hull.perimeter_difference,
                perimeter_defect_ratio: hull.perimeter_defect_ratio,
                solidity: hull.solidity(),
                roundness: roundness(hull.contour_area, hull.contour_perimeter),
                approximated_vertex_count: complexity.vertex_count,
            }),
            None => {
                let area = polygon_area(contour.points());
                Self::Degenerate(DegenerateShape {
                    area,
                    perimeter: complexity.perimeter,
                    roundness: roundness(area, complexity.perimeter),
                    approximated_vertex_count: complexity.vertex_count,
                })
            }
        }
    }

    /// Enclosed contour area.
    #[must_use]
    pub const fn area(&self) -> f64 {
        match self {
            Self::Measured(m) => m.area,
            Self::Degenerate(d) => d.area,
        }
    }

    /// Closed contour length.
    #[must_use]
    pub const fn perimeter(&self) -> f64 {
        match self {
            Self::Measured(m) => m.perimeter,
            Self::Degenerate(d) => d.perimeter,
        }
    }

    /// Solidity, reported as 0 for a degenerate shape.
    #[must_use]
    pub const fn solidity(&self) -> f64 {
        match self {
            Self::Measured(m) => m.solidity,
            Self::Degenerate(_) => 0.0,
        }
    }

    /// Hull defect ratio, `None` for a degenerate shape.
    #[must_use]
    pub const fn hull_defect_ratio(&self) -> Option<f64> {
        match self {
            Self::Measured(m) => Some(m.hull_defect_ratio),
            Self::Degenerate(_) => None,
        }
    }

    /// Isoperimetric ratio, `None` when undefined.
    #[must_use]
    pub const fn roundness(&self) -> Option<f64> {
        match self {
            Self::Measured(m) => m.roundness,
            Self::Degenerate(d) => d.roundness,
        }
    }

    /// Vertex count after polygon approximation.
    #[must_use]
    pub const fn approximated_vertex_count(&self) -> usize {
        match self {
            Self::Measured(m) => m.approximated_vertex_count,
            Self::Degenerate(d) => d.approximated_vertex_count,
        }
    }

    /// Whether the hull-based descriptors are unavailable.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate(_))
    }
}

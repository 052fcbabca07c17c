//! Contour tracing: extract the outer boundaries of a binary mask.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! tracing strategies and the [`ContourTracerKind`] enum for selecting
//! which strategy to use at runtime, plus the representative-contour
//! selection applied to every candidate mask.
//!
//! Only external borders are reported. Holes inside a pebble mask do not
//! change its outline and are ignored.

use imageproc::contours::BorderType;
use serde::{Deserialize, Serialize};

use crate::mask::Mask;
use crate::metrics::polygon_area;
use crate::types::{Contour, GrayImage, Point};

/// Selects how boundary pixels are encoded into contour points.
///
/// The point count of the representative contour is thresholded by the
/// filter pipeline, so the encoding is part of the measurement method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourTracerKind {
    /// Border following with straight horizontal, vertical and diagonal
    /// runs compressed to their end points.
    #[default]
    SimpleChain,
    /// Border following keeping every boundary pixel.
    FullChain,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary mask. Output: one closed contour per external border.
pub trait ContourTracer {
    /// Trace the external contours of `mask`.
    fn trace(&self, mask: &Mask) -> Vec<Contour>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, mask: &Mask) -> Vec<Contour> {
        let borders = trace_external_borders(mask);
        match *self {
            Self::SimpleChain => borders.into_iter().map(compress_chain).collect(),
            Self::FullChain => borders.into_iter().map(Contour::new).collect(),
        }
    }
}

/// Suzuki-Abe border following via `imageproc::contours::find_contours`,
/// keeping outer borders that have no enclosing border.
///
/// imageproc only starts an outer border at `x > 0`, so a region whose
/// first pixel lies in column 0 would come back as a hole. Tracing runs
/// on a copy framed by one background pixel and the points are shifted
/// back.
fn trace_external_borders(mask: &Mask) -> Vec<Vec<Point>> {
    let src = mask.as_image();
    let mut framed = GrayImage::new(
        src.width().saturating_add(2),
        src.height().saturating_add(2),
    );
    image::imageops::replace(&mut framed, src, 1, 1);
    let contours: Vec<imageproc::contours::Contour<i32>> =
        imageproc::contours::find_contours(&framed);

    contours
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter(|c| !c.points.is_empty())
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x - 1), f64::from(p.y - 1)))
                .collect()
        })
        .collect()
}

/// Drop every point that continues the step direction of its predecessor.
///
/// Boundary pixels are 8-connected, so consecutive points differ by at
/// most one pixel per axis and step directions compare exactly.
fn compress_chain(points: Vec<Point>) -> Contour {
    let n = points.len();
    if n < 3 {
        return Contour::new(points);
    }

    let step = |a: Point, b: Point| (b.x - a.x, b.y - a.y);
    let kept: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            step(prev, cur) != step(cur, next)
        })
        .map(|i| points[i])
        .collect();

    // A closed straight run has no turning point; keep its ends.
    if kept.is_empty() {
        Contour::new(vec![points[0], points[n - 1]])
    } else {
        Contour::new(kept)
    }
}

/// Select the representative contour of one mask.
///
/// Picks the contour enclosing the largest area. Returns `None` when
/// there are no contours or the largest one has fewer than `min_points`
/// points, which screens out small or noisy fragments.
#[must_use]
pub fn select_representative(contours: Vec<Contour>, min_points: usize) -> Option<Contour> {
    let mut best: Option<(f64, Contour)> = None;
    for contour in contours {
        let area = polygon_area(contour.points());
        // First contour wins ties.
        if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
            best = Some((area, contour));
        }
    }

    let (_, contour) = best?;
    (contour.len() >= min_points).then_some(contour)
}

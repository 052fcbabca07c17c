//! Per-mask records for diagnostic display and point lookup.
//!
//! Records are rebuilt from a set of masks (usually the accepted ones)
//! with the default contour minimum and occlusion thresholds, so the
//! numbers shown for a mask do not depend on how it was filtered.

use std::hash::Hasher;

use siphasher::sip::SipHasher13;

use crate::config::FilterConfig;
use crate::contour::{ContourTracer, ContourTracerKind, select_representative};
use crate::mask::{Mask, MaskId, RawMask};
use crate::metrics::ShapeMetrics;
use crate::occlusion::{OcclusionOutcome, OcclusionThresholds, OcclusionTracker};
use crate::types::{BoundingBox, Contour, Dimensions, PipelineError};

/// Keys for the display colour hash. Fixed so colours are stable across
/// runs.
const COLOR_KEYS: (u64, u64) = (12345, 0);

/// Display colour channels fall in `COLOR_MIN..COLOR_MAX`.
const COLOR_MIN: u8 = 90;
const COLOR_MAX: u8 = 255;

/// Deterministic display colour for the record at `ordinal`.
#[must_use]
pub fn display_color(ordinal: usize) -> [u8; 3] {
    let mut hasher = SipHasher13::new_with_keys(COLOR_KEYS.0, COLOR_KEYS.1);
    hasher.write_usize(ordinal);
    let bytes = hasher.finish().to_le_bytes();
    let span = COLOR_MAX - COLOR_MIN;
    [
        COLOR_MIN + bytes[0] % span,
        COLOR_MIN + bytes[1] % span,
        COLOR_MIN + bytes[2] % span,
    ]
}

/// Everything shown for one mask.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRecord {
    /// One-based position among the records.
    pub ordinal: usize,
    /// Handle of the source mask.
    pub id: MaskId,
    /// Pixel membership.
    pub mask: Mask,
    /// Bounding box of the representative contour.
    pub bounding_box: BoundingBox,
    /// Display colour.
    pub color: [u8; 3],
    /// Representative contour.
    pub contour: Contour,
    /// Shape metrics of the contour.
    pub metrics: ShapeMetrics,
    /// Polygon approximation tolerance used for the vertex count.
    pub epsilon: f64,
    /// Occlusion against the records before this one.
    pub occlusion: OcclusionOutcome,
}

impl InspectionRecord {
    /// Number of points in the representative contour.
    #[must_use]
    pub const fn contour_points(&self) -> usize {
        self.contour.len()
    }

    /// Text lines pairing each metric with its threshold in `config`.
    #[must_use]
    pub fn annotations(&self, config: &FilterConfig) -> Vec<String> {
        let m = &self.metrics;
        let (perimeter_difference, hull_defect_area) = match m {
            ShapeMetrics::Measured(measured) => (
                format!("{:.1}", measured.perimeter_difference),
                format!("{:.1}", measured.hull_defect_area),
            ),
            ShapeMetrics::Degenerate(_) => ("n/a".to_string(), "n/a".to_string()),
        };
        let hull_ratio = m
            .hull_defect_ratio()
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.3}"));
        let roundness = m
            .roundness()
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.3}"));

        vec![
            format!("Mask #{} ({})", self.ordinal, self.id),
            format!(
                "Contour points: {} (>= {})",
                self.contour_points(),
                config.min_contour_points
            ),
            String::new(),
            format!("Area: {:.1} px^2 (> {})", m.area(), config.min_area),
            format!(
                "Solidity: {:.3} (>= {:.2})",
                m.solidity(),
                config.min_solidity
            ),
            format!(
                "Perimeter diff: {perimeter_difference} (<= {})",
                config.max_perimeter_difference
            ),
            format!(
                "Hull diff ratio: {hull_ratio} (<= {:.3})",
                config.max_hull_diff_ratio
            ),
            format!("Hull area diff: {hull_defect_area} px^2"),
            format!("Roundness: {roundness} (> {:.2})", config.min_roundness),
            "Occluded:".to_string(),
            format!(
                " iou: {:.2} (> {:.2})",
                self.occlusion.iou, config.occlusion.iou
            ),
            format!(
                " overlap_self: {:.2} (> {:.2})",
                self.occlusion.overlap_self, config.occlusion.overlap_self
            ),
            "Complexity:".to_string(),
            format!(" perimeter: {:.2}", m.perimeter()),
            format!(" epsilon: {:.2}", self.epsilon),
            format!(
                " vertices: {} (> {})",
                m.approximated_vertex_count(),
                config.min_vertices
            ),
        ]
    }
}

/// Ordered collection of inspection records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionRecords {
    records: Vec<InspectionRecord>,
}

impl InspectionRecords {
    /// Records in build order.
    #[must_use]
    pub fn as_slice(&self) -> &[InspectionRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recently added record whose mask contains `(x, y)`.
    #[must_use]
    pub fn pick(&self, x: u32, y: u32) -> Option<&InspectionRecord> {
        self.records.iter().rev().find(|r| r.mask.contains(x, y))
    }
}

/// Build one record per mask that has a representative contour.
///
/// Uses the default contour minimum, approximation factor and occlusion
/// thresholds with a fresh tracker. Masks without a contour are skipped.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if a mask is not
/// `dimensions` in size.
pub fn build_records<'a>(
    dimensions: Dimensions,
    masks: impl IntoIterator<Item = &'a RawMask>,
) -> Result<InspectionRecords, PipelineError> {
    let tracer = ContourTracerKind::default();
    let mut tracker = OcclusionTracker::new(dimensions);
    let mut records = Vec::new();

    for raw in masks {
        let contours = tracer.trace(&raw.segmentation);
        let Some(contour) = select_representative(contours, FilterConfig::DEFAULT_MIN_CONTOUR_POINTS)
        else {
            tracing::debug!(mask = %raw.id, "no representative contour, not inspectable");
            continue;
        };
        let Some(bounding_box) = contour.bounding_box() else {
            continue;
        };

        let (occlusion, next) =
            tracker.evaluate(&raw.segmentation, OcclusionThresholds::default())?;
        tracker = next;

        let metrics = ShapeMetrics::measure(&contour, FilterConfig::DEFAULT_EPSILON_FACTOR);
        let ordinal = records.len() + 1;
        records.push(InspectionRecord {
            ordinal,
            id: raw.id,
            mask: raw.segmentation.clone(),
            bounding_box,
            color: display_color(ordinal),
            epsilon: FilterConfig::DEFAULT_EPSILON_FACTOR * metrics.perimeter(),
            contour,
            metrics,
            occlusion,
        });
    }

    Ok(InspectionRecords { records })
}

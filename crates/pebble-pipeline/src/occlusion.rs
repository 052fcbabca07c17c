//! Pairwise occlusion tracking within one image.
//!
//! The tracker owns the union of every pixel claimed so far. Each
//! evaluation consumes the tracker and hands back its successor, so the
//! claimed set can only grow along one sequential chain of candidates.

use serde::{Deserialize, Serialize};

use crate::mask::Mask;
use crate::metrics::RATIO_EPSILON;
use crate::types::{Dimensions, PipelineError};

/// Overlap limits above which a candidate counts as occluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcclusionThresholds {
    /// Maximum intersection-over-union with the claimed pixels.
    pub iou: f64,
    /// Maximum fraction of the candidate already claimed.
    pub overlap_self: f64,
}

impl OcclusionThresholds {
    /// Default intersection-over-union limit.
    pub const DEFAULT_IOU: f64 = 0.5;
    /// Default self-overlap limit.
    pub const DEFAULT_OVERLAP_SELF: f64 = 0.15;
}

impl Default for OcclusionThresholds {
    fn default() -> Self {
        Self {
            iou: Self::DEFAULT_IOU,
            overlap_self: Self::DEFAULT_OVERLAP_SELF,
        }
    }
}

/// Result of testing one candidate against the claimed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcclusionOutcome {
    /// Whether either overlap limit was exceeded.
    pub occluded: bool,
    /// Intersection over union with the claimed pixels.
    pub iou: f64,
    /// Fraction of the candidate already claimed.
    pub overlap_self: f64,
}

/// Accumulated union of pixels claimed by earlier candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcclusionTracker {
    claimed: Mask,
    claimed_area: u64,
}

impl OcclusionTracker {
    /// A tracker with nothing claimed yet.
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            claimed: Mask::empty(dimensions),
            claimed_area: 0,
        }
    }

    /// The claimed pixels.
    #[must_use]
    pub const fn claimed(&self) -> &Mask {
        &self.claimed
    }

    /// Number of claimed pixels.
    #[must_use]
    pub const fn claimed_area(&self) -> u64 {
        self.claimed_area
    }

    /// Test `candidate` against the claimed pixels.
    ///
    /// A candidate that is not occluded is unioned into the claimed set;
    /// an occluded one leaves the tracker unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DimensionMismatch`] if `candidate` is not
    /// the same size as the tracker's grid.
    pub fn evaluate(
        mut self,
        candidate: &Mask,
        thresholds: OcclusionThresholds,
    ) -> Result<(OcclusionOutcome, Self), PipelineError> {
        let expected = self.claimed.dimensions();
        let found = candidate.dimensions();
        if expected != found {
            return Err(PipelineError::DimensionMismatch { expected, found });
        }

        let intersection = candidate.intersection_count(&self.claimed);
        let candidate_area = candidate.pixel_count();

        if intersection == 0 {
            self.claim(candidate, candidate_area);
            return Ok((
                OcclusionOutcome {
                    occluded: false,
                    iou: 0.0,
                    overlap_self: 0.0,
                },
                self,
            ));
        }

        #[allow(clippy::cast_precision_loss)]
        let (inter, union, cand) = (
            intersection as f64,
            (candidate_area + self.claimed_area - intersection) as f64,
            candidate_area as f64,
        );
        let iou = inter / (union + RATIO_EPSILON);
        let overlap_self = inter / (cand + RATIO_EPSILON);
        let occluded = iou > thresholds.iou || overlap_self > thresholds.overlap_self;

        if !occluded {
            self.claim(candidate, candidate_area - intersection);
        }
        Ok((
            OcclusionOutcome {
                occluded,
                iou,
                overlap_self,
            },
            self,
        ))
    }

    fn claim(&mut self, candidate: &Mask, new_pixels: u64) {
        self.claimed.union_with(candidate);
        self.claimed_area += new_pixels;
    }
}

//! The mask filter pipeline: turn raw segmentation proposals into
//! countable pebbles.
//!
//! Candidates are scanned smallest first. Each one gets a representative
//! contour and its shape metrics, then runs through the enabled
//! [`Stage`]s in fixed order until one fails. One [`OcclusionTracker`]
//! is threaded through the scan, so the result depends on scan order.
//!
//! A candidate that passes [`Stage::Occluded`] claims its pixels at that
//! point. If a later stage rejects it, the claim stays and can still
//! occlude subsequent overlapping candidates.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::{FilterConfig, ParamOverride, Stage};
use crate::contour::{ContourTracer, select_representative};
use crate::diagnostics::{FilterDiagnostics, RejectionCounts};
use crate::mask::{MaskId, RawMask};
use crate::metrics::ShapeMetrics;
use crate::occlusion::{OcclusionOutcome, OcclusionTracker};
use crate::types::{Contour, Dimensions, PipelineError};

/// Why a candidate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// No contour long enough to represent the mask.
    NoContour,
    /// The named stage failed.
    Stage(Stage),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoContour => f.write_str("no contour"),
            Self::Stage(stage) => std::fmt::Display::fmt(stage, f),
        }
    }
}

/// Outcome for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Passed every enabled stage.
    Accepted,
    /// Failed for the given reason.
    Rejected(RejectReason),
}

/// Per-candidate record, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDecision {
    /// Candidate handle.
    pub id: MaskId,
    /// Reported area of the candidate.
    pub area: u64,
    /// Accepted or the first failing reason.
    pub verdict: Verdict,
}

/// A candidate that passed every enabled stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedPebble {
    /// The raw mask, moved out of the input list.
    pub mask: RawMask,
    /// Representative contour.
    pub contour: Contour,
    /// Shape metrics of the representative contour.
    pub metrics: ShapeMetrics,
    /// Occlusion test result, `None` when the stage was disabled.
    pub occlusion: Option<OcclusionOutcome>,
}

/// Compact per-pebble record consumed by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PebbleSummary {
    /// Reported pixel area.
    pub area: u64,
    /// Solidity of the representative contour.
    pub solidity: f64,
}

/// Everything produced by one filter run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Accepted pebbles in acceptance order.
    pub accepted: Vec<AcceptedPebble>,
    /// One summary per accepted pebble, same order.
    pub summaries: Vec<PebbleSummary>,
    /// One decision per candidate, in scan order.
    pub decisions: Vec<FilterDecision>,
    /// Counts and timing.
    pub diagnostics: FilterDiagnostics,
}

impl FilterOutcome {
    /// Ids of the accepted pebbles, in acceptance order.
    #[must_use]
    pub fn accepted_ids(&self) -> Vec<MaskId> {
        self.accepted.iter().map(|p| p.mask.id).collect()
    }

    /// The decision recorded for `id`, if it was a candidate.
    #[must_use]
    pub fn decision(&self, id: MaskId) -> Option<&FilterDecision> {
        self.decisions.iter().find(|d| d.id == id)
    }
}

/// A configured chain of acceptance stages.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPipeline {
    config: FilterConfig,
    stages: Vec<Stage>,
}

impl FilterPipeline {
    /// Build a pipeline running `stages` with the thresholds in `config`.
    ///
    /// Stage order and duplicates in `stages` are irrelevant: enabled
    /// stages always run once each, in [`Stage::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `config` fails
    /// [`FilterConfig::validate`].
    pub fn new(
        config: FilterConfig,
        stages: impl IntoIterator<Item = Stage>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let mut stages: Vec<Stage> = stages.into_iter().collect();
        stages.sort_unstable();
        stages.dedup();
        Ok(Self { config, stages })
    }

    /// Build a pipeline with every stage enabled.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_all_stages(config: FilterConfig) -> Result<Self, PipelineError> {
        Self::new(config, Stage::ALL)
    }

    /// The thresholds in use.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Enabled stages in evaluation order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Filter one image's raw masks.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DimensionMismatch`] if any mask is not
    /// `dimensions` in size. Nothing is filtered in that case.
    pub fn apply(
        &self,
        dimensions: Dimensions,
        mut masks: Vec<RawMask>,
    ) -> Result<FilterOutcome, PipelineError> {
        let start = Instant::now();

        if let Some(bad) = masks
            .iter()
            .find(|m| m.segmentation.dimensions() != dimensions)
        {
            return Err(PipelineError::DimensionMismatch {
                expected: dimensions,
                found: bad.segmentation.dimensions(),
            });
        }

        // Stable: equal areas keep their input order.
        masks.sort_by_key(|m| m.area);

        let candidates = masks.len();
        let mut tracker = OcclusionTracker::new(dimensions);
        let mut accepted = Vec::new();
        let mut summaries = Vec::new();
        let mut decisions = Vec::with_capacity(candidates);
        let mut rejections = RejectionCounts::default();

        for mask in masks {
            let contours = self.config.contour_tracer.trace(&mask.segmentation);
            let Some(contour) = select_representative(contours, self.config.min_contour_points)
            else {
                reject(&mut decisions, &mut rejections, &mask, RejectReason::NoContour);
                continue;
            };
            let metrics = ShapeMetrics::measure(&contour, self.config.epsilon_factor);

            let mut occlusion = None;
            let mut failed = None;
            for &stage in &self.stages {
                let passed = match stage {
                    Stage::Occluded => {
                        let (outcome, next) =
                            tracker.evaluate(&mask.segmentation, self.config.occlusion)?;
                        tracker = next;
                        occlusion = Some(outcome);
                        !outcome.occluded
                    }
                    _ => self.passes(stage, dimensions, &mask, &metrics),
                };
                if !passed {
                    failed = Some(stage);
                    break;
                }
            }

            if let Some(stage) = failed {
                reject(&mut decisions, &mut rejections, &mask, RejectReason::Stage(stage));
                continue;
            }

            decisions.push(FilterDecision {
                id: mask.id,
                area: mask.area,
                verdict: Verdict::Accepted,
            });
            summaries.push(PebbleSummary {
                area: mask.area,
                solidity: metrics.solidity(),
            });
            accepted.push(AcceptedPebble {
                mask,
                contour,
                metrics,
                occlusion,
            });
        }

        let diagnostics = FilterDiagnostics {
            dimensions,
            stages: self.stages.clone(),
            candidates,
            accepted: accepted.len(),
            rejections,
            duration: start.elapsed(),
        };
        tracing::debug!(
            candidates,
            accepted = accepted.len(),
            claimed = tracker.claimed_area(),
            "filtered masks for {dimensions} image"
        );

        Ok(FilterOutcome {
            accepted,
            summaries,
            decisions,
            diagnostics,
        })
    }

    /// Evaluate every stage except [`Stage::Occluded`], which needs the
    /// tracker.
    fn passes(
        &self,
        stage: Stage,
        dimensions: Dimensions,
        mask: &RawMask,
        metrics: &ShapeMetrics,
    ) -> bool {
        let c = &self.config;
        match stage {
            Stage::MinimumSize => mask.area > c.min_area && metrics.perimeter() > 0.0,
            // An empty mask has no box and counts as touching.
            Stage::TouchingEdges => mask
                .segmentation
                .bounding_box()
                .is_some_and(|b| !b.near_edge(dimensions, c.border_buffer)),
            Stage::Occluded => true,
            Stage::Wholeness => !metrics.is_degenerate() && metrics.solidity() >= c.min_solidity,
            Stage::ConvexHull => metrics
                .hull_defect_ratio()
                .is_some_and(|r| r <= c.max_hull_diff_ratio),
            Stage::Complexity => metrics.approximated_vertex_count() > c.min_vertices,
            Stage::Roundish => metrics.roundness().is_some_and(|r| r > c.min_roundness),
        }
    }
}

fn reject(
    decisions: &mut Vec<FilterDecision>,
    rejections: &mut RejectionCounts,
    mask: &RawMask,
    reason: RejectReason,
) {
    tracing::debug!(mask = %mask.id, area = mask.area, %reason, "mask rejected");
    rejections.record(reason);
    decisions.push(FilterDecision {
        id: mask.id,
        area: mask.area,
        verdict: Verdict::Rejected(reason),
    });
}

/// One row of a threshold sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow<T> {
    /// Parameter value tried.
    pub value: T,
    /// Number of pebbles accepted with it.
    pub accepted: usize,
    /// Full filter result.
    pub outcome: FilterOutcome,
}

/// Re-run `pipeline` over the same masks once per value.
///
/// `make_override` turns each value into the override applied on top of
/// the pipeline's own config; the enabled stages stay the same.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if an overridden config is
/// invalid, or any error from [`FilterPipeline::apply`].
pub fn sweep<T: Copy>(
    pipeline: &FilterPipeline,
    dimensions: Dimensions,
    masks: &[RawMask],
    values: impl IntoIterator<Item = T>,
    make_override: impl Fn(T) -> ParamOverride,
) -> Result<Vec<SweepRow<T>>, PipelineError> {
    values
        .into_iter()
        .map(|value| {
            let config = pipeline.config.with_overrides(&[make_override(value)]);
            let variant = FilterPipeline::new(config, pipeline.stages.iter().copied())?;
            let outcome = variant.apply(dimensions, masks.to_vec())?;
            Ok(SweepRow {
                value,
                accepted: outcome.accepted.len(),
                outcome,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::contour::ContourTracerKind;
    use crate::mask::Mask;

    const DIMS: Dimensions = Dimensions {
        width: 300,
        height: 200,
    };

    fn disc(id: usize, cx: f64, cy: f64, r: f64) -> RawMask {
        RawMask::from_mask(
            MaskId(id),
            Mask::from_fn(DIMS, |x, y| {
                let dx = f64::from(x) - cx;
                let dy = f64::from(y) - cy;
                dx.mul_add(dx, dy * dy) <= r * r
            }),
        )
    }

    fn ellipse(id: usize, cx: f64, cy: f64, a: f64, b: f64) -> RawMask {
        RawMask::from_mask(
            MaskId(id),
            Mask::from_fn(DIMS, |x, y| {
                let dx = (f64::from(x) - cx) / a;
                let dy = (f64::from(y) - cy) / b;
                dx.mul_add(dx, dy * dy) <= 1.0
            }),
        )
    }

    fn shape(id: usize, inside: impl Fn(u32, u32) -> bool) -> RawMask {
        RawMask::from_mask(MaskId(id), Mask::from_fn(DIMS, inside))
    }

    fn full_chain() -> FilterConfig {
        FilterConfig {
            contour_tracer: ContourTracerKind::FullChain,
            ..FilterConfig::default()
        }
    }

    fn verdict(outcome: &FilterOutcome, id: usize) -> Verdict {
        outcome.decision(MaskId(id)).unwrap().verdict
    }

    fn rejected_at(stage: Stage) -> Verdict {
        Verdict::Rejected(RejectReason::Stage(stage))
    }

    /// Edge-touching disc, interior pebble, near-duplicate of the pebble.
    fn scenario_masks() -> Vec<RawMask> {
        vec![
            disc(1, 30.0, 100.0, 40.0),
            disc(2, 150.0, 100.0, 40.0),
            disc(3, 152.0, 100.0, 42.0),
        ]
    }

    #[test]
    fn scenario_accepts_only_interior_pebble() {
        let pipeline = FilterPipeline::new(
            FilterConfig::default(),
            [
                Stage::MinimumSize,
                Stage::TouchingEdges,
                Stage::Occluded,
                Stage::Wholeness,
                Stage::Roundish,
            ],
        )
        .unwrap();
        let outcome = pipeline.apply(DIMS, scenario_masks()).unwrap();

        assert_eq!(outcome.accepted_ids(), vec![MaskId(2)]);
        assert_eq!(verdict(&outcome, 1), rejected_at(Stage::TouchingEdges));
        assert_eq!(verdict(&outcome, 3), rejected_at(Stage::Occluded));

        let pebble = &outcome.accepted[0];
        assert!(pebble.metrics.solidity() > 0.9);
        assert!(pebble.metrics.roundness().unwrap() > 0.8);
        assert!(!pebble.occlusion.unwrap().occluded);
    }

    #[test]
    fn all_stages_accept_interior_disc() {
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let outcome = pipeline.apply(DIMS, scenario_masks()).unwrap();
        assert_eq!(outcome.accepted_ids(), vec![MaskId(2)]);
        assert_eq!(outcome.diagnostics.rejected(), 2);
    }

    #[test]
    fn candidates_are_scanned_smallest_first() {
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let outcome = pipeline.apply(DIMS, scenario_masks()).unwrap();
        let areas: Vec<u64> = outcome.decisions.iter().map(|d| d.area).collect();
        let mut sorted = areas.clone();
        sorted.sort_unstable();
        assert_eq!(areas, sorted);
        assert_eq!(outcome.decisions.len(), 3);
    }

    #[test]
    fn larger_duplicate_loses_to_smaller() {
        // The near-duplicate is listed first but has the larger area.
        let masks = vec![disc(3, 152.0, 100.0, 42.0), disc(2, 150.0, 100.0, 40.0)];
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let outcome = pipeline.apply(DIMS, masks).unwrap();
        assert_eq!(outcome.accepted_ids(), vec![MaskId(2)]);
        let occlusion = outcome.accepted[0].occlusion.unwrap();
        assert!(occlusion.iou.abs() < f64::EPSILON);
    }

    #[test]
    fn small_mask_has_no_contour() {
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let outcome = pipeline
            .apply(DIMS, vec![disc(9, 150.0, 100.0, 12.6)])
            .unwrap();
        assert!(outcome.accepted.is_empty());
        assert_eq!(verdict(&outcome, 9), Verdict::Rejected(RejectReason::NoContour));
        assert_eq!(outcome.diagnostics.rejections.no_contour, 1);
    }

    #[test]
    fn short_contour_passes_with_lower_minimum() {
        let config = FilterConfig::default().with_overrides(&[
            ParamOverride::MinimumContour {
                min_points: Some(10),
            },
            ParamOverride::MinimumSize {
                min_area: Some(100),
            },
        ]);
        let pipeline = FilterPipeline::new(config, [Stage::MinimumSize, Stage::TouchingEdges])
            .unwrap();
        let outcome = pipeline
            .apply(DIMS, vec![disc(9, 150.0, 100.0, 12.6)])
            .unwrap();
        assert_eq!(outcome.accepted_ids(), vec![MaskId(9)]);
    }

    #[test]
    fn minimum_size_uses_reported_area() {
        let mut mask = disc(4, 150.0, 100.0, 40.0);
        mask.area = 500;
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let outcome = pipeline.apply(DIMS, vec![mask]).unwrap();
        assert_eq!(verdict(&outcome, 4), rejected_at(Stage::MinimumSize));
    }

    #[test]
    fn edge_disc_rejected_only_when_stage_enabled() {
        let pipeline = FilterPipeline::new(FilterConfig::default(), [Stage::TouchingEdges]).unwrap();
        let outcome = pipeline.apply(DIMS, vec![disc(1, 30.0, 100.0, 40.0)]).unwrap();
        assert_eq!(verdict(&outcome, 1), rejected_at(Stage::TouchingEdges));

        let pipeline = FilterPipeline::new(FilterConfig::default(), [Stage::Roundish]).unwrap();
        let outcome = pipeline.apply(DIMS, vec![disc(1, 30.0, 100.0, 40.0)]).unwrap();
        assert_eq!(outcome.accepted_ids(), vec![MaskId(1)]);
    }

    #[test]
    fn disc_centred_on_left_edge_keeps_its_contour() {
        let half_disc = || disc(1, 0.0, 100.0, 70.0);

        let pipeline =
            FilterPipeline::new(FilterConfig::default(), [Stage::MinimumSize, Stage::Roundish])
                .unwrap();
        let outcome = pipeline.apply(DIMS, vec![half_disc()]).unwrap();
        assert_eq!(outcome.accepted_ids(), vec![MaskId(1)]);
        let bbox = outcome.accepted[0].contour.bounding_box().unwrap();
        assert_eq!(bbox.x, 0);

        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let outcome = pipeline.apply(DIMS, vec![half_disc()]).unwrap();
        assert_eq!(verdict(&outcome, 1), rejected_at(Stage::TouchingEdges));
    }

    #[test]
    fn square_fails_complexity() {
        // Every boundary pixel is kept, so the contour is long enough, but
        // it approximates to four corners.
        let square = shape(5, |x, y| (100..160).contains(&x) && (70..130).contains(&y));
        let pipeline = FilterPipeline::with_all_stages(full_chain()).unwrap();
        let outcome = pipeline.apply(DIMS, vec![square]).unwrap();
        assert_eq!(verdict(&outcome, 5), rejected_at(Stage::Complexity));
        assert_eq!(outcome.diagnostics.rejections.complexity, 1);
    }

    #[test]
    fn thin_arch_fails_wholeness() {
        // Two legs joined by a bar: a small area inside a wide hull.
        let arch = shape(6, |x, y| {
            let bar = (20..280).contains(&x) && (20..28).contains(&y);
            let legs = ((20..28).contains(&x) || (272..280).contains(&x))
                && (20..180).contains(&y);
            bar || legs
        });
        assert_eq!(arch.area, 4512);
        let pipeline = FilterPipeline::with_all_stages(full_chain()).unwrap();
        let outcome = pipeline.apply(DIMS, vec![arch]).unwrap();
        assert_eq!(verdict(&outcome, 6), rejected_at(Stage::Wholeness));
    }

    #[test]
    fn degenerate_line_fails_hull_based_stages() {
        let line = || shape(7, |x, y| y == 100 && (25..275).contains(&x));
        for stage in [Stage::Wholeness, Stage::ConvexHull, Stage::Roundish] {
            let pipeline = FilterPipeline::new(full_chain(), [stage]).unwrap();
            let outcome = pipeline.apply(DIMS, vec![line()]).unwrap();
            assert_eq!(verdict(&outcome, 7), rejected_at(stage), "{stage}");
        }
    }

    #[test]
    fn later_rejection_keeps_claimed_pixels() {
        // The flat ellipse is scanned first, claims its pixels at the
        // occlusion stage, then fails the hull test.
        let masks = vec![
            ellipse(1, 150.0, 100.0, 70.0, 15.0),
            disc(2, 150.0, 100.0, 40.0),
        ];
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let outcome = pipeline.apply(DIMS, masks).unwrap();

        assert_eq!(verdict(&outcome, 1), rejected_at(Stage::ConvexHull));
        assert_eq!(verdict(&outcome, 2), rejected_at(Stage::Occluded));
        assert!(outcome.accepted.is_empty());

        // Without the ellipse the disc is accepted.
        let outcome = pipeline
            .apply(DIMS, vec![disc(2, 150.0, 100.0, 40.0)])
            .unwrap();
        assert_eq!(outcome.accepted_ids(), vec![MaskId(2)]);
    }

    #[test]
    fn disabled_occlusion_accepts_overlaps() {
        let pipeline = FilterPipeline::new(
            FilterConfig::default(),
            [Stage::MinimumSize, Stage::TouchingEdges, Stage::Roundish],
        )
        .unwrap();
        let outcome = pipeline.apply(DIMS, scenario_masks()).unwrap();
        assert_eq!(outcome.accepted_ids(), vec![MaskId(2), MaskId(3)]);
        assert!(outcome.accepted.iter().all(|p| p.occlusion.is_none()));
    }

    #[test]
    fn summaries_align_with_accepted() {
        let pipeline = FilterPipeline::new(FilterConfig::default(), [Stage::Roundish]).unwrap();
        let outcome = pipeline.apply(DIMS, scenario_masks()).unwrap();
        assert_eq!(outcome.summaries.len(), outcome.accepted.len());
        for (summary, pebble) in outcome.summaries.iter().zip(&outcome.accepted) {
            assert_eq!(summary.area, pebble.mask.area);
            assert!((summary.solidity - pebble.metrics.solidity()).abs() < f64::EPSILON);
            assert!((0.0..=1.0).contains(&summary.solidity));
        }
    }

    #[test]
    fn apply_is_idempotent() {
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let masks = scenario_masks();
        let a = pipeline.apply(DIMS, masks.clone()).unwrap();
        let b = pipeline.apply(DIMS, masks).unwrap();
        assert_eq!(a.accepted, b.accepted);
        assert_eq!(a.summaries, b.summaries);
        assert_eq!(a.decisions, b.decisions);
    }

    #[test]
    fn empty_input_gives_empty_outcome() {
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let outcome = pipeline.apply(DIMS, vec![]).unwrap();
        assert!(outcome.accepted.is_empty());
        assert!(outcome.decisions.is_empty());
        assert_eq!(outcome.diagnostics.candidates, 0);
    }

    #[test]
    fn stage_order_and_duplicates_are_normalized() {
        let pipeline = FilterPipeline::new(
            FilterConfig::default(),
            [Stage::Roundish, Stage::MinimumSize, Stage::Roundish],
        )
        .unwrap();
        assert_eq!(pipeline.stages(), &[Stage::MinimumSize, Stage::Roundish]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FilterConfig {
            min_solidity: -1.0,
            ..FilterConfig::default()
        };
        assert!(FilterPipeline::with_all_stages(config).unwrap_err().is_fatal());
    }

    #[test]
    fn mismatched_mask_is_an_error() {
        let other = RawMask::from_mask(
            MaskId(0),
            Mask::empty(Dimensions {
                width: 10,
                height: 10,
            }),
        );
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let err = pipeline.apply(DIMS, vec![other]).unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { .. }));
    }

    #[test]
    fn roundish_sweep_is_monotone() {
        let masks = vec![
            disc(1, 150.0, 100.0, 40.0),
            ellipse(2, 150.0, 100.0, 70.0, 15.0),
        ];
        let pipeline = FilterPipeline::new(FilterConfig::default(), [Stage::Roundish]).unwrap();
        let rows = sweep(&pipeline, DIMS, &masks, [0.0, 0.5, 0.95], |v| {
            ParamOverride::Roundish {
                min_roundness: Some(v),
            }
        })
        .unwrap();
        let counts: Vec<usize> = rows.iter().map(|r| r.accepted).collect();
        assert_eq!(counts, vec![2, 1, 0]);
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(rows[1].outcome.accepted_ids(), vec![MaskId(1)]);
    }

    #[test]
    fn sweep_rejects_invalid_values() {
        let pipeline = FilterPipeline::with_all_stages(FilterConfig::default()).unwrap();
        let result = sweep(&pipeline, DIMS, &[], [-1.0], |v| ParamOverride::Wholeness {
            min_solidity: Some(v),
        });
        assert!(result.is_err());
    }
}

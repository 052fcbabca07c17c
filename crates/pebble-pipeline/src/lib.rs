//! pebble-pipeline: Pebble measurement from segmentation masks (sans-IO).
//!
//! Turns the raw masks a segmentation model proposes for one survey
//! photo into a set of countable pebbles, then into statistics:
//! contour tracing -> shape metrics -> filter stages (size, edges,
//! occlusion, wholeness, hull, complexity, roundness) -> averages.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! masks and JSON strings and returns structured data. All file-system
//! interaction lives in `pebble-survey`.
//!
//! ```rust
//! # use pebble_pipeline::{Dimensions, FilterConfig, Mask, MaskId, PipelineError, RawMask};
//! # fn run() -> Result<(), PipelineError> {
//! let dimensions = Dimensions { width: 200, height: 200 };
//! let disc = Mask::from_fn(dimensions, |x, y| {
//!     let (dx, dy) = (f64::from(x) - 100.0, f64::from(y) - 100.0);
//!     dx.mul_add(dx, dy * dy) <= 40.0 * 40.0
//! });
//! let masks = vec![RawMask::from_mask(MaskId(0), disc)];
//!
//! let outcome = pebble_pipeline::process(dimensions, masks, &FilterConfig::default())?;
//! assert_eq!(outcome.accepted.len(), 1);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

pub mod aggregate;
pub mod config;
pub mod contour;
pub mod diagnostics;
pub mod filter;
pub mod inspect;
pub mod mask;
pub mod metrics;
pub mod occlusion;
pub mod segment;
pub mod simplify;
pub mod survey;
pub mod types;

pub use aggregate::{
    Calibration, ImageStats, PebbleAverages, SurveyStats, pixel_area_to_physical,
    summarize_image, summarize_survey,
};
pub use config::{FilterConfig, ParamOverride, Stage};
pub use contour::{ContourTracer, ContourTracerKind};
pub use diagnostics::{FilterDiagnostics, RejectionCounts};
pub use filter::{
    AcceptedPebble, FilterDecision, FilterOutcome, FilterPipeline, PebbleSummary, RejectReason,
    SweepRow, Verdict, sweep,
};
pub use inspect::{InspectionRecord, InspectionRecords, build_records};
pub use mask::{Mask, MaskId, RawMask};
pub use metrics::ShapeMetrics;
pub use occlusion::{OcclusionOutcome, OcclusionThresholds, OcclusionTracker};
pub use survey::{MaskGenerator, SurveyImage, process_image, run_survey};
pub use types::{BoundingBox, Contour, Dimensions, GrayImage, PipelineError, Point};

/// Filter one image's masks with every stage enabled.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
/// Returns [`PipelineError::DimensionMismatch`] if a mask is not
/// `dimensions` in size.
pub fn process(
    dimensions: Dimensions,
    masks: Vec<RawMask>,
    config: &FilterConfig,
) -> Result<FilterOutcome, PipelineError> {
    FilterPipeline::with_all_stages(config.clone())?.apply(dimensions, masks)
}

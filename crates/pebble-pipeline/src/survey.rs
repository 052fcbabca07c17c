//! Batch survey runner: segment, filter and summarize a numbered list of
//! images.

use crate::aggregate::{Calibration, ImageStats, SurveyStats};
use crate::filter::{FilterOutcome, FilterPipeline};
use crate::mask::RawMask;
use crate::types::{Dimensions, PipelineError};

/// One cropped survey photo, as listed by the image source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyImage {
    /// Position in the survey, from 1.
    pub sequence: usize,
    /// File or display name.
    pub name: String,
    /// Pixel size of the cropped photo.
    pub dimensions: Dimensions,
}

/// Source of raw segmentation proposals for an image.
pub trait MaskGenerator {
    /// Produce every raw mask proposed for `image`.
    ///
    /// # Errors
    ///
    /// Returns an input error ([`PipelineError::MaskDecode`] or
    /// [`PipelineError::ImageLoad`]) to skip the image, or
    /// [`PipelineError::InvalidConfig`] to abort the survey.
    fn generate(&mut self, image: &SurveyImage) -> Result<Vec<RawMask>, PipelineError>;
}

impl<G: MaskGenerator + ?Sized> MaskGenerator for &mut G {
    fn generate(&mut self, image: &SurveyImage) -> Result<Vec<RawMask>, PipelineError> {
        (**self).generate(image)
    }
}

/// Segment, filter and summarize one image.
///
/// An image with no accepted pebbles yields zero-valued statistics and a
/// warning.
///
/// # Errors
///
/// Returns any error from the generator or from
/// [`FilterPipeline::apply`].
pub fn process_image(
    generator: &mut impl MaskGenerator,
    image: &SurveyImage,
    pipeline: &FilterPipeline,
    calibration: Calibration,
) -> Result<(ImageStats, FilterOutcome), PipelineError> {
    let masks = generator.generate(image)?;
    let outcome = pipeline.apply(image.dimensions, masks)?;
    if outcome.accepted.is_empty() {
        tracing::warn!(
            image = %image.name,
            candidates = outcome.diagnostics.candidates,
            "no pebbles accepted"
        );
    }
    let stats = ImageStats::from_summaries(
        image.sequence,
        image.name.clone(),
        &outcome.summaries,
        calibration,
    );
    tracing::info!(
        image = %image.name,
        pebbles = stats.pebble_count,
        average_pixel_area = stats.average_pixel_area,
        average_physical_area = stats.average_physical_area,
        "image measured"
    );
    Ok((stats, outcome))
}

/// Run the whole survey.
///
/// Images that fail to load, segment or filter are logged and left out
/// of the result.
///
/// # Errors
///
/// Returns the first fatal error ([`PipelineError::is_fatal`]).
pub fn run_survey(
    mut generator: impl MaskGenerator,
    images: impl IntoIterator<Item = Result<SurveyImage, PipelineError>>,
    pipeline: &FilterPipeline,
    calibration: Calibration,
) -> Result<SurveyStats, PipelineError> {
    let mut survey = SurveyStats::new();
    for image in images {
        let result = image.and_then(|image| {
            process_image(&mut generator, &image, pipeline, calibration).map(|(stats, _)| stats)
        });
        match result {
            Ok(stats) => survey.push(stats),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!(error = %e, "skipping image"),
        }
    }
    tracing::info!(
        images = survey.len(),
        pebbles = survey.total_pebbles(),
        "survey complete"
    );
    Ok(survey)
}

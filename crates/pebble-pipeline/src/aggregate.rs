//! Per-image and per-survey pebble statistics.

use serde::{Deserialize, Serialize};

use crate::filter::PebbleSummary;
use crate::types::PipelineError;

/// Count and averages over one image's accepted pebbles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PebbleAverages {
    /// Number of pebbles.
    pub count: usize,
    /// Mean reported pixel area.
    pub average_area: f64,
    /// Mean solidity.
    pub average_solidity: f64,
}

/// Average the summaries of one image. All zero for no pebbles.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_image(summaries: &[PebbleSummary]) -> PebbleAverages {
    if summaries.is_empty() {
        return PebbleAverages::default();
    }
    let n = summaries.len() as f64;
    let total_area: f64 = summaries.iter().map(|s| s.area as f64).sum();
    let total_solidity: f64 = summaries.iter().map(|s| s.solidity).sum();
    PebbleAverages {
        count: summaries.len(),
        average_area: total_area / n,
        average_solidity: total_solidity / n,
    }
}

/// Convert an area in square pixels to square units of length.
#[must_use]
pub fn pixel_area_to_physical(pixel_area: f64, pixels_per_unit_length: f64) -> f64 {
    pixel_area / (pixels_per_unit_length * pixels_per_unit_length)
}

/// Scale of the cropped survey images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Calibration {
    pixels_per_unit: f64,
}

impl Calibration {
    /// Default scale: 75 pixels per centimetre.
    pub const DEFAULT_PIXELS_PER_UNIT: f64 = 75.0;

    /// A calibration of `pixels_per_unit` pixels per unit length.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] unless `pixels_per_unit`
    /// is finite and positive.
    pub fn new(pixels_per_unit: f64) -> Result<Self, PipelineError> {
        if pixels_per_unit.is_finite() && pixels_per_unit > 0.0 {
            Ok(Self { pixels_per_unit })
        } else {
            Err(PipelineError::InvalidConfig(format!(
                "pixels per unit length must be positive, got {pixels_per_unit}"
            )))
        }
    }

    /// Pixels per unit length.
    #[must_use]
    pub const fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }

    /// Convert a pixel area with this calibration.
    #[must_use]
    pub fn to_physical(&self, pixel_area: f64) -> f64 {
        pixel_area_to_physical(pixel_area, self.pixels_per_unit)
    }
}

impl TryFrom<f64> for Calibration {
    type Error = PipelineError;

    fn try_from(pixels_per_unit: f64) -> Result<Self, Self::Error> {
        Self::new(pixels_per_unit)
    }
}

impl From<Calibration> for f64 {
    fn from(calibration: Calibration) -> Self {
        calibration.pixels_per_unit
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixels_per_unit: Self::DEFAULT_PIXELS_PER_UNIT,
        }
    }
}

/// Statistics for one survey image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    /// Position of the image in the survey, from 1.
    pub sequence: usize,
    /// Image name.
    pub name: String,
    /// Accepted pebbles.
    pub pebble_count: usize,
    /// Mean pebble area in pixels.
    pub average_pixel_area: f64,
    /// Mean pebble area in square units.
    pub average_physical_area: f64,
    /// Mean solidity.
    pub average_solidity: f64,
}

impl ImageStats {
    /// Build the statistics of one image from its pebble summaries.
    #[must_use]
    pub fn from_summaries(
        sequence: usize,
        name: impl Into<String>,
        summaries: &[PebbleSummary],
        calibration: Calibration,
    ) -> Self {
        let averages = summarize_image(summaries);
        Self {
            sequence,
            name: name.into(),
            pebble_count: averages.count,
            average_pixel_area: averages.average_area,
            average_physical_area: calibration.to_physical(averages.average_area),
            average_solidity: averages.average_solidity,
        }
    }
}

/// Ordered, append-only sequence of per-image statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyStats {
    images: Vec<ImageStats>,
}

impl SurveyStats {
    /// An empty survey.
    #[must_use]
    pub const fn new() -> Self {
        Self { images: Vec::new() }
    }

    /// Append one image's statistics.
    pub fn push(&mut self, stats: ImageStats) {
        self.images.push(stats);
    }

    /// Images in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageStats> {
        self.images.iter()
    }

    /// Images as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ImageStats] {
        &self.images
    }

    /// Number of images.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no image has been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Total accepted pebbles over all images.
    #[must_use]
    pub fn total_pebbles(&self) -> usize {
        self.images.iter().map(|s| s.pebble_count).sum()
    }
}

impl<'a> IntoIterator for &'a SurveyStats {
    type Item = &'a ImageStats;
    type IntoIter = std::slice::Iter<'a, ImageStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}

impl FromIterator<ImageStats> for SurveyStats {
    fn from_iter<I: IntoIterator<Item = ImageStats>>(iter: I) -> Self {
        Self {
            images: iter.into_iter().collect(),
        }
    }
}

/// Collect per-image statistics in input order.
#[must_use]
pub fn summarize_survey(images: impl IntoIterator<Item = ImageStats>) -> SurveyStats {
    images.into_iter().collect()
}

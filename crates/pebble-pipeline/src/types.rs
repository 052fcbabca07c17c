//! Shared types for the pebble measurement pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can build masks without
/// depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in image coordinates.
///
/// Contour points produced by the tracer are always integer-valued; the
/// `f64` representation lets the same type flow through the area,
/// perimeter and hull computations without casts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// The closed outer boundary of one connected mask region.
///
/// The last point connects back to the first; the closing point is not
/// repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a new contour from a vector of boundary points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the contour and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Tight axis-aligned bounding box of the contour points.
    ///
    /// Width and height count pixels inclusively, so a single-point
    /// contour has a 1x1 box. Returns `None` for an empty contour.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.0.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.0[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        // Tracer coordinates are non-negative integers.
        Some(BoundingBox {
            x: min_x.max(0.0) as u32,
            y: min_y.max(0.0) as u32,
            width: (max_x - min_x) as u32 + 1,
            height: (max_y - min_y) as u32 + 1,
        })
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned pixel bounding box, `(x, y)` is the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left-most column.
    pub x: u32,
    /// Top-most row.
    pub y: u32,
    /// Number of columns covered.
    pub width: u32,
    /// Number of rows covered.
    pub height: u32,
}

impl BoundingBox {
    /// Whether the box comes within `buffer` pixels of any image edge.
    #[must_use]
    pub fn near_edge(&self, dimensions: Dimensions, buffer: u32) -> bool {
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        self.x < buffer
            || self.y < buffer
            || right > u64::from(dimensions.width.saturating_sub(buffer))
            || bottom > u64::from(dimensions.height.saturating_sub(buffer))
    }
}

/// Errors that can occur while measuring pebbles.
///
/// `InvalidConfig` is fatal for a whole survey run. The remaining variants
/// describe a problem with one image and only cause that image to be
/// skipped. Degenerate geometry is never an error.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration (calibration, thresholds, segmentation source) is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// An individual survey image could not be loaded or decoded.
    #[error("failed to load image {name}: {reason}")]
    ImageLoad {
        /// Image name as listed by the image source.
        name: String,
        /// Human-readable cause.
        reason: String,
    },

    /// Segmentation output for an image could not be decoded.
    #[error("failed to decode segmentation masks: {0}")]
    MaskDecode(String),

    /// A mask does not match the image it belongs to.
    #[error("mask dimensions {found} do not match image dimensions {expected}")]
    DimensionMismatch {
        /// Dimensions of the image being filtered.
        expected: Dimensions,
        /// Dimensions of the offending mask.
        found: Dimensions,
    },
}

impl PipelineError {
    /// Whether this error must abort a survey run rather than skip one image.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

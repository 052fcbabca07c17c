//! Filter configuration: thresholds, stage selection and overrides.

use serde::{Deserialize, Serialize};

use crate::contour::ContourTracerKind;
use crate::occlusion::OcclusionThresholds;
use crate::types::PipelineError;

/// One acceptance test of the filter pipeline.
///
/// Enabled stages always run in the order of [`Stage::ALL`], whatever
/// order the caller lists them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Reported area above the minimum and a non-zero perimeter.
    MinimumSize,
    /// Pixel bounding box clear of the image border.
    TouchingEdges,
    /// Not hidden behind pixels claimed by earlier candidates.
    Occluded,
    /// Solidity above the minimum.
    Wholeness,
    /// Hull defect ratio below the maximum.
    ConvexHull,
    /// Enough vertices after polygon approximation.
    Complexity,
    /// Roundness above the minimum.
    Roundish,
}

impl Stage {
    /// Every stage in evaluation order.
    pub const ALL: [Self; 7] = [
        Self::MinimumSize,
        Self::TouchingEdges,
        Self::Occluded,
        Self::Wholeness,
        Self::ConvexHull,
        Self::Complexity,
        Self::Roundish,
    ];

    /// Short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MinimumSize => "minimum size",
            Self::TouchingEdges => "touching edges",
            Self::Occluded => "occluded",
            Self::Wholeness => "wholeness",
            Self::ConvexHull => "convex hull",
            Self::Complexity => "complexity",
            Self::Roundish => "roundish",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Thresholds for every filter stage.
///
/// Values are fixed for the lifetime of a [`FilterPipeline`](crate::FilterPipeline);
/// use [`with_overrides`](Self::with_overrides) to derive a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum point count of the representative contour.
    pub min_contour_points: usize,

    /// How contour points are encoded. Changes the point count tested
    /// against `min_contour_points`.
    pub contour_tracer: ContourTracerKind,

    /// Reported area must exceed this many pixels.
    pub min_area: u64,

    /// Distance in pixels the bounding box must keep from every edge.
    pub border_buffer: u32,

    /// Overlap limits against already claimed pixels.
    pub occlusion: OcclusionThresholds,

    /// Solidity below this is a fragment.
    pub min_solidity: f64,

    /// Hull defect ratio above this is too concave.
    pub max_hull_diff_ratio: f64,

    /// Perimeter difference shown next to the hull metrics. Not used for
    /// acceptance.
    pub max_perimeter_difference: f64,

    /// Polygon approximation tolerance as a fraction of the perimeter.
    pub epsilon_factor: f64,

    /// Approximated vertex count must exceed this.
    pub min_vertices: usize,

    /// Roundness must exceed this.
    pub min_roundness: f64,
}

impl FilterConfig {
    /// Default minimum representative contour length.
    pub const DEFAULT_MIN_CONTOUR_POINTS: usize = 85;
    /// Default minimum reported area in pixels.
    pub const DEFAULT_MIN_AREA: u64 = 3000;
    /// Default border buffer in pixels.
    pub const DEFAULT_BORDER_BUFFER: u32 = 5;
    /// Default minimum solidity.
    pub const DEFAULT_MIN_SOLIDITY: f64 = 0.15;
    /// Default maximum hull defect ratio.
    pub const DEFAULT_MAX_HULL_DIFF_RATIO: f64 = 0.030;
    /// Default displayed perimeter difference limit.
    pub const DEFAULT_MAX_PERIMETER_DIFFERENCE: f64 = 24.0;
    /// Default approximation tolerance factor.
    pub const DEFAULT_EPSILON_FACTOR: f64 = 0.02;
    /// Default minimum approximated vertex count.
    pub const DEFAULT_MIN_VERTICES: usize = 7;
    /// Default minimum roundness.
    pub const DEFAULT_MIN_ROUNDNESS: f64 = 0.35;

    /// Check that every threshold is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when a ratio threshold is
    /// negative or not finite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let ratios = [
            ("occlusion.iou", self.occlusion.iou),
            ("occlusion.overlap_self", self.occlusion.overlap_self),
            ("min_solidity", self.min_solidity),
            ("max_hull_diff_ratio", self.max_hull_diff_ratio),
            ("max_perimeter_difference", self.max_perimeter_difference),
            ("epsilon_factor", self.epsilon_factor),
            ("min_roundness", self.min_roundness),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// A copy of this config with every override applied in order.
    ///
    /// Fields an override leaves as `None`, and stages no override
    /// names, keep their current values.
    #[must_use]
    pub fn with_overrides(&self, overrides: &[ParamOverride]) -> Self {
        let mut config = self.clone();
        for o in overrides {
            o.apply_to(&mut config);
        }
        config
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_contour_points: Self::DEFAULT_MIN_CONTOUR_POINTS,
            contour_tracer: ContourTracerKind::default(),
            min_area: Self::DEFAULT_MIN_AREA,
            border_buffer: Self::DEFAULT_BORDER_BUFFER,
            occlusion: OcclusionThresholds::default(),
            min_solidity: Self::DEFAULT_MIN_SOLIDITY,
            max_hull_diff_ratio: Self::DEFAULT_MAX_HULL_DIFF_RATIO,
            max_perimeter_difference: Self::DEFAULT_MAX_PERIMETER_DIFFERENCE,
            epsilon_factor: Self::DEFAULT_EPSILON_FACTOR,
            min_vertices: Self::DEFAULT_MIN_VERTICES,
            min_roundness: Self::DEFAULT_MIN_ROUNDNESS,
        }
    }
}

/// Partial replacement of one stage's thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage")]
pub enum ParamOverride {
    /// Representative contour selection.
    MinimumContour {
        /// Replaces `min_contour_points`.
        min_points: Option<usize>,
    },
    /// [`Stage::MinimumSize`].
    MinimumSize {
        /// Replaces `min_area`.
        min_area: Option<u64>,
    },
    /// [`Stage::TouchingEdges`].
    TouchingEdges {
        /// Replaces `border_buffer`.
        buffer: Option<u32>,
    },
    /// [`Stage::Occluded`].
    Occluded {
        /// Replaces `occlusion.iou`.
        iou: Option<f64>,
        /// Replaces `occlusion.overlap_self`.
        overlap_self: Option<f64>,
    },
    /// [`Stage::Wholeness`].
    Wholeness {
        /// Replaces `min_solidity`.
        min_solidity: Option<f64>,
    },
    /// [`Stage::ConvexHull`].
    ConvexHull {
        /// Replaces `max_hull_diff_ratio`.
        max_hull_diff_ratio: Option<f64>,
        /// Replaces `max_perimeter_difference`.
        max_perimeter_difference: Option<f64>,
    },
    /// [`Stage::Complexity`].
    Complexity {
        /// Replaces `epsilon_factor`.
        epsilon_factor: Option<f64>,
        /// Replaces `min_vertices`.
        min_vertices: Option<usize>,
    },
    /// [`Stage::Roundish`].
    Roundish {
        /// Replaces `min_roundness`.
        min_roundness: Option<f64>,
    },
}

impl ParamOverride {
    fn apply_to(self, config: &mut FilterConfig) {
        fn set<T>(field: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *field = v;
            }
        }

        match self {
            Self::MinimumContour { min_points } => set(&mut config.min_contour_points, min_points),
            Self::MinimumSize { min_area } => set(&mut config.min_area, min_area),
            Self::TouchingEdges { buffer } => set(&mut config.border_buffer, buffer),
            Self::Occluded { iou, overlap_self } => {
                set(&mut config.occlusion.iou, iou);
                set(&mut config.occlusion.overlap_self, overlap_self);
            }
            Self::Wholeness { min_solidity } => set(&mut config.min_solidity, min_solidity),
            Self::ConvexHull {
                max_hull_diff_ratio,
                max_perimeter_difference,
            } => {
                set(&mut config.max_hull_diff_ratio, max_hull_diff_ratio);
                set(
                    &mut config.max_perimeter_difference,
                    max_perimeter_difference,
                );
            }
            Self::Complexity {
                epsilon_factor,
                min_vertices,
            } => {
                set(&mut config.epsilon_factor, epsilon_factor);
                set(&mut config.min_vertices, min_vertices);
            }
            Self::Roundish { min_roundness } => set(&mut config.min_roundness, min_roundness),
        }
    }
}

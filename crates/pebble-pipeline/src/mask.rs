//! Binary masks and the raw segmentation proposals built on them.
//!
//! A [`Mask`] is a [`GrayImage`] where any non-zero pixel is foreground.
//! Masks produced inside this crate always use 255 for foreground so they
//! can be handed straight to `imageproc` contour tracing.

use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, Dimensions, GrayImage};

/// Foreground value written by this crate.
const FOREGROUND: u8 = 255;

/// A per-pixel boolean indicator of one object's extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// An all-background mask of the given size.
    #[must_use]
    pub fn empty(dimensions: Dimensions) -> Self {
        Self {
            image: GrayImage::new(dimensions.width, dimensions.height),
        }
    }

    /// Wrap an existing grayscale image; any non-zero pixel is foreground.
    #[must_use]
    pub const fn from_image(image: GrayImage) -> Self {
        Self { image }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel.
    #[must_use]
    pub fn from_fn(dimensions: Dimensions, f: impl Fn(u32, u32) -> bool) -> Self {
        let image = GrayImage::from_fn(dimensions.width, dimensions.height, |x, y| {
            image::Luma([if f(x, y) { FOREGROUND } else { 0 }])
        });
        Self { image }
    }

    /// Size of the mask grid.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.image.width(),
            height: self.image.height(),
        }
    }

    /// The backing grayscale image.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// Whether pixel `(x, y)` is foreground. Out-of-range pixels are not.
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.image.width() && y < self.image.height() && self.image.get_pixel(x, y).0[0] != 0
    }

    /// Set pixel `(x, y)` to foreground. Out-of-range pixels are ignored.
    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, image::Luma([FOREGROUND]));
        }
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        self.image.as_raw().iter().map(|&v| u64::from(v != 0)).sum()
    }

    /// Number of pixels that are foreground in both masks.
    ///
    /// Both masks must share the same dimensions; extra pixels of the
    /// larger buffer are ignored.
    #[must_use]
    pub fn intersection_count(&self, other: &Self) -> u64 {
        self.image
            .as_raw()
            .iter()
            .zip(other.image.as_raw())
            .map(|(&a, &b)| u64::from(a != 0 && b != 0))
            .sum()
    }

    /// Add every foreground pixel of `other` to this mask.
    pub fn union_with(&mut self, other: &Self) {
        for (dst, &src) in self.image.iter_mut().zip(other.image.as_raw()) {
            if src != 0 {
                *dst = FOREGROUND;
            }
        }
    }

    /// Tight bounding box of the foreground pixels, `None` when empty.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut extent: Option<(u32, u32, u32, u32)> = None;
        for (x, y, p) in self.image.enumerate_pixels() {
            if p.0[0] == 0 {
                continue;
            }
            extent = Some(match extent {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            });
        }
        extent.map(|(min_x, min_y, max_x, max_y)| BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    /// Copy of this mask with every foreground pixel normalised to 255.
    #[must_use]
    pub fn normalized(&self) -> GrayImage {
        let mut image = self.image.clone();
        for v in image.iter_mut() {
            if *v != 0 {
                *v = FOREGROUND;
            }
        }
        image
    }
}

/// Opaque handle identifying a raw mask within one image's proposal set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaskId(pub usize);

impl std::fmt::Display for MaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One segmentation proposal: pixel membership plus the area the
/// segmentation model reported for it.
///
/// The reported area drives the scan order and the size filter; it is
/// kept separate from the mask's own pixel count because the model may
/// compute it differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMask {
    /// Handle assigned by the segmentation collaborator.
    pub id: MaskId,
    /// Pixel membership.
    pub segmentation: Mask,
    /// Reported area in pixels.
    pub area: u64,
}

impl RawMask {
    /// Build a raw mask whose reported area is its own pixel count.
    #[must_use]
    pub fn from_mask(id: MaskId, segmentation: Mask) -> Self {
        let area = segmentation.pixel_count();
        Self {
            id,
            segmentation,
            area,
        }
    }
}

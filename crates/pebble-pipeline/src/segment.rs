//! Decoding and encoding of segmentation model output.
//!
//! The segmentation model dumps one JSON list per image. Each record
//! carries the reported `area` and a `segmentation` that is either an
//! uncompressed run-length encoding or a plain grid of booleans:
//!
//! ```json
//! [{"area": 3, "segmentation": {"size": [2, 3], "counts": [1, 3, 2]}}]
//! ```
//!
//! Run lengths walk the grid column by column (top to bottom, then left
//! to right) and alternate background and foreground, starting with
//! background. Other record fields (boxes, scores, ...) are ignored.

use serde::{Deserialize, Serialize};

use crate::mask::{Mask, MaskId, RawMask};
use crate::types::{Dimensions, PipelineError};

/// Uncompressed column-major run-length encoding of one mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLength {
    /// `[height, width]`.
    pub size: [u32; 2],
    /// Alternating background/foreground run lengths.
    pub counts: Vec<u64>,
}

impl RunLength {
    /// Encode `mask`.
    #[must_use]
    pub fn encode(mask: &Mask) -> Self {
        let Dimensions { width, height } = mask.dimensions();
        let mut counts = Vec::new();
        let mut current = false;
        let mut run = 0_u64;
        for x in 0..width {
            for y in 0..height {
                if mask.contains(x, y) == current {
                    run += 1;
                } else {
                    counts.push(run);
                    current = !current;
                    run = 1;
                }
            }
        }
        counts.push(run);
        Self {
            size: [height, width],
            counts,
        }
    }

    /// Decode into a mask.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MaskDecode`] when the runs do not cover
    /// exactly `height * width` pixels.
    pub fn decode(&self) -> Result<Mask, PipelineError> {
        let [height, width] = self.size;
        let expected = u64::from(height) * u64::from(width);
        let total = self
            .counts
            .iter()
            .try_fold(0_u64, |acc, &run| acc.checked_add(run))
            .ok_or_else(|| PipelineError::MaskDecode("run lengths overflow".to_string()))?;
        if total != expected {
            return Err(PipelineError::MaskDecode(format!(
                "run lengths cover {total} pixels, expected {height}x{width} = {expected}"
            )));
        }

        let mut mask = Mask::empty(Dimensions { width, height });
        let mut index = 0_u64;
        let mut foreground = false;
        for &run in &self.counts {
            if foreground {
                for i in index..index + run {
                    // Column-major: consecutive indices walk down a column.
                    let (x, y) = (i / u64::from(height), i % u64::from(height));
                    #[allow(clippy::cast_possible_truncation)]
                    mask.set(x as u32, y as u32);
                }
            }
            index += run;
            foreground = !foreground;
        }
        Ok(mask)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Segmentation {
    RunLength(RunLength),
    Grid(Vec<Vec<bool>>),
}

#[derive(Debug, Deserialize)]
struct MaskRecord {
    area: u64,
    segmentation: Segmentation,
}

#[derive(Debug, Serialize)]
struct EncodedRecord {
    id: MaskId,
    area: u64,
    segmentation: RunLength,
}

fn decode_grid(rows: &[Vec<bool>]) -> Result<Mask, PipelineError> {
    let width = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != width) {
        return Err(PipelineError::MaskDecode(
            "boolean grid rows differ in length".to_string(),
        ));
    }
    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(rows.len())) else {
        return Err(PipelineError::MaskDecode(
            "boolean grid is too large".to_string(),
        ));
    };
    Ok(Mask::from_fn(Dimensions { width, height }, |x, y| {
        rows[y as usize][x as usize]
    }))
}

/// Decode the segmentation model's JSON dump for one image.
///
/// Masks get ids in file order, starting at 0.
///
/// # Errors
///
/// Returns [`PipelineError::MaskDecode`] if the JSON does not match the
/// expected shape or a run-length encoding is malformed.
pub fn parse_masks(json: &str) -> Result<Vec<RawMask>, PipelineError> {
    let records: Vec<MaskRecord> =
        serde_json::from_str(json).map_err(|e| PipelineError::MaskDecode(e.to_string()))?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let segmentation = match &record.segmentation {
                Segmentation::RunLength(rle) => rle.decode(),
                Segmentation::Grid(rows) => decode_grid(rows),
            }
            .map_err(|e| match e {
                PipelineError::MaskDecode(msg) => PipelineError::MaskDecode(format!("mask {i}: {msg}")),
                other => other,
            })?;
            Ok(RawMask {
                id: MaskId(i),
                segmentation,
                area: record.area,
            })
        })
        .collect()
}

/// Encode masks in the same run-length form [`parse_masks`] reads.
///
/// # Errors
///
/// Returns [`PipelineError::MaskDecode`] if serialization fails.
pub fn encode_masks<'a>(
    masks: impl IntoIterator<Item = &'a RawMask>,
) -> Result<String, PipelineError> {
    let records: Vec<EncodedRecord> = masks
        .into_iter()
        .map(|m| EncodedRecord {
            id: m.id,
            area: m.area,
            segmentation: RunLength::encode(&m.segmentation),
        })
        .collect();
    serde_json::to_string(&records).map_err(|e| PipelineError::MaskDecode(e.to_string()))
}

//! File-system adapters: the numbered image list and mask sidecar files.
//!
//! Survey photos live in one directory. Each photo `img_12.png` has its
//! segmentation dump in `img_12.masks.json`, either next to it or in a
//! separate masks directory.

use std::path::{Path, PathBuf};

use pebble_pipeline::segment::parse_masks;
use pebble_pipeline::{Dimensions, MaskGenerator, PipelineError, RawMask, SurveyImage};

/// File extensions treated as survey photos.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Suffix replacing the image extension in sidecar file names.
const SIDECAR_SUFFIX: &str = ".masks.json";

/// Whether `path` names a survey photo, by extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// First run of ASCII digits in `name`.
pub fn first_number(name: &str) -> Option<u64> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = name[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Survey order: numbered names by number, then unnumbered ones, ties by name.
fn sort_key(name: &str) -> (bool, Option<u64>, String) {
    let number = first_number(name);
    (number.is_none(), number, name.to_string())
}

/// List the survey photos in `dir`, in survey order.
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be read.
pub fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort_by_cached_key(|p| sort_key(&file_name(p)));
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read the pixel size of the photo at `path` without decoding it fully.
///
/// # Errors
///
/// Returns [`PipelineError::ImageLoad`] if the header cannot be read.
pub fn load_image(sequence: usize, path: &Path) -> Result<SurveyImage, PipelineError> {
    let name = file_name(path);
    let (width, height) =
        image::image_dimensions(path).map_err(|e| PipelineError::ImageLoad {
            name: name.clone(),
            reason: e.to_string(),
        })?;
    Ok(SurveyImage {
        sequence,
        name,
        dimensions: Dimensions { width, height },
    })
}

/// Survey images from `paths`, numbered from 1.
pub fn survey_images(
    paths: &[PathBuf],
) -> impl Iterator<Item = Result<SurveyImage, PipelineError>> + '_ {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| load_image(i + 1, path))
}

/// Sidecar file holding the masks of the image named `image_name`.
pub fn sidecar_path(dir: &Path, image_name: &str) -> PathBuf {
    let stem = Path::new(image_name)
        .file_stem()
        .map_or_else(|| image_name.to_string(), |s| s.to_string_lossy().into_owned());
    dir.join(format!("{stem}{SIDECAR_SUFFIX}"))
}

/// Read and decode one sidecar file.
///
/// # Errors
///
/// Returns [`PipelineError::MaskDecode`] if the file is missing,
/// unreadable or malformed.
pub fn read_masks(path: &Path) -> Result<Vec<RawMask>, PipelineError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::MaskDecode(format!("{}: {e}", path.display())))?;
    parse_masks(&json).map_err(|e| match e {
        PipelineError::MaskDecode(msg) => {
            PipelineError::MaskDecode(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// [`MaskGenerator`] backed by precomputed sidecar files.
#[derive(Debug, Clone)]
pub struct SidecarMasks {
    dir: PathBuf,
}

impl SidecarMasks {
    /// Read sidecars from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `dir` is not a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(PipelineError::InvalidConfig(format!(
                "masks directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }
}

impl MaskGenerator for SidecarMasks {
    fn generate(&mut self, image: &SurveyImage) -> Result<Vec<RawMask>, PipelineError> {
        let path = sidecar_path(&self.dir, &image.name);
        tracing::debug!(image = %image.name, sidecar = %path.display(), "reading masks");
        read_masks(&path)
    }
}

//! Batch orchestration: collaborator seams and the pipeline stages.
//!
//! Stages wire injected models to the consolidation core and the catalog.
//! Model inference stays outside the crate; a stage accepts anything that
//! implements the matching trait. Per-unit failures (one image, one region)
//! warn and skip, structurally invalid input aborts the stage.

pub mod detect;
pub mod extract;
pub mod ingest;
pub mod query;

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::detect::{DetectorOutput, ImageDetections};
use crate::util::{GarmatchError, GarmatchResult};

#[cfg(feature = "rayon")]
pub use detect::{consolidate_precomputed_par, detect_directory_par};
pub use detect::{consolidate_precomputed, detect_directory};
pub use extract::{extract_regions, ExtractReport};
pub use ingest::ingest_directory;
#[cfg(feature = "rayon")]
pub use query::query_all_par;
pub use query::{query_all, QueryReport};

/// Produces raw detections for one image.
///
/// Implementations wrap external detection models. A per-image failure is
/// non-fatal in batch stages: the image is skipped with a warning.
pub trait Detector {
    fn detect(&self, image: &RgbImage) -> GarmatchResult<DetectorOutput>;
}

/// Produces a fixed-length embedding vector for one region image.
///
/// A per-region failure is non-fatal in the ingestion stage; a vector whose
/// length differs from earlier ones in the same run is a structural error.
pub trait Embedder {
    fn embed(&self, region: &RgbImage) -> GarmatchResult<Vec<f32>>;
}

/// Precomputed detector output, loaded from the raw-detections interchange
/// file: `[{"filename": ..., "detections": {"scores", "label_ids",
/// "boxes"}}]`.
///
/// Lets the consolidation stage run from a file instead of a live model.
#[derive(Debug, Clone, Default)]
pub struct JsonDetections {
    entries: Vec<ImageDetections>,
}

impl JsonDetections {
    /// Wraps in-memory interchange entries.
    pub fn from_entries(entries: Vec<ImageDetections>) -> Self {
        Self { entries }
    }

    /// Loads interchange entries from JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> GarmatchResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| GarmatchError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let entries = serde_json::from_str(&text).map_err(|err| GarmatchError::MalformedJson {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { entries })
    }

    /// Entries in file order.
    pub fn entries(&self) -> &[ImageDetections] {
        &self.entries
    }

    /// Detector output for one filename, if present.
    pub fn get(&self, filename: &str) -> Option<&DetectorOutput> {
        self.entries
            .iter()
            .find(|entry| entry.filename == filename)
            .map(|entry| &entry.detections)
    }

    /// Number of images covered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no images are covered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads an image from disk as RGB.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> GarmatchResult<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|err| GarmatchError::ImageIo {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    Ok(img.to_rgb8())
}

/// Image files (`jpg`/`jpeg`/`png`, case-insensitive) in `dir`, sorted by
/// filename so batch runs are reproducible.
pub fn list_image_files<P: AsRef<Path>>(dir: P) -> GarmatchResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let read = fs::read_dir(dir).map_err(|err| GarmatchError::Io {
        path: dir.display().to_string(),
        reason: err.to_string(),
    })?;
    let mut files = Vec::new();
    for entry in read {
        let entry = entry.map_err(|err| GarmatchError::Io {
            path: dir.display().to_string(),
            reason: err.to_string(),
        })?;
        let path = entry.path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("jpg")
            || ext.eq_ignore_ascii_case("jpeg")
            || ext.eq_ignore_ascii_case("png")
    )
}

/// Filename without its final extension, as recorded in region keys.
pub(crate) fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_match_case_insensitively() {
        assert!(is_image_file(Path::new("a.jpg")));
        assert!(is_image_file(Path::new("b.JPEG")));
        assert!(is_image_file(Path::new("c.Png")));
        assert!(!is_image_file(Path::new("d.gif")));
        assert!(!is_image_file(Path::new("jpg")));
    }

    #[test]
    fn stems_drop_only_the_final_extension() {
        assert_eq!(file_stem("16.jpg"), "16");
        assert_eq!(file_stem("a.b.png"), "a.b");
        assert_eq!(file_stem("noext"), "noext");
    }
}

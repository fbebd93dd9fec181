//! Region extraction: the segmentation seam, masked cutouts, and file naming.
//!
//! One accepted detection becomes one region file: the segmenter turns the
//! record's box into a foreground mask, the cutout blacks out the background
//! and crops to the box, and the namer assigns a collision-free filename.

pub mod cutout;
pub mod mask;
pub mod naming;

use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::detect::{BoundingBox, DetectionRecord};
use crate::util::{GarmatchError, GarmatchResult};

pub use cutout::masked_crop;
pub use mask::Mask;
pub use naming::{RegionNamer, RegionNaming};

/// Produces a foreground mask for a box prompt on one image.
///
/// Implementations wrap external segmentation models and may fail per call;
/// the extraction stage treats such failures as non-fatal and skips the
/// region. The returned mask must match the image dimensions.
pub trait Segmenter {
    fn segment(&self, image: &RgbImage, bbox: &BoundingBox) -> GarmatchResult<Mask>;
}

/// Reference segmenter that treats the whole prompt box as foreground.
///
/// Makes the extraction stage usable without a model: the cutout degrades to
/// a plain crop of the box.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxSegmenter;

impl Segmenter for BoxSegmenter {
    fn segment(&self, image: &RgbImage, bbox: &BoundingBox) -> GarmatchResult<Mask> {
        Ok(Mask::from_box(image.width(), image.height(), bbox))
    }
}

/// Parameters of the extraction stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Regions with either dimension below this many pixels are skipped.
    pub min_region_px: u32,
    /// Filename scheme for the run.
    pub naming: RegionNaming,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            min_region_px: 10,
            naming: RegionNaming::PerImageLabel,
        }
    }
}

/// Cuts one record's region out of its source image and persists it as PNG.
///
/// Owns the run-wide filename state, so one extractor must serve an entire
/// extraction run for the collision-free guarantee to hold.
pub struct RegionExtractor<'a> {
    segmenter: &'a dyn Segmenter,
    output_dir: PathBuf,
    min_region_px: u32,
    namer: RegionNamer,
}

impl<'a> RegionExtractor<'a> {
    /// Creates an extractor writing into `output_dir`.
    pub fn new(segmenter: &'a dyn Segmenter, output_dir: &Path, config: &RegionConfig) -> Self {
        Self {
            segmenter,
            output_dir: output_dir.to_path_buf(),
            min_region_px: config.min_region_px,
            namer: RegionNamer::new(config.naming),
        }
    }

    /// Extracts and writes `record`'s region from `image`.
    ///
    /// `stem` is the source image's filename without extension. Returns the
    /// written path, or `None` when the cutout falls under the minimum-size
    /// gate. Segmentation, crop, and encode failures are errors; the caller
    /// decides whether they skip the region or abort.
    pub fn extract(
        &mut self,
        image: &RgbImage,
        stem: &str,
        record: &DetectionRecord,
    ) -> GarmatchResult<Option<PathBuf>> {
        let mask = self.segmenter.segment(image, &record.bbox)?;
        let cutout = masked_crop(image, &mask, &record.bbox)?;
        if cutout.width() < self.min_region_px || cutout.height() < self.min_region_px {
            return Ok(None);
        }

        let name = self.namer.next_name(stem, &record.label);
        let path = self.output_dir.join(name);
        cutout.save(&path).map_err(|err| GarmatchError::ImageIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        self.namer.confirm_written();
        Ok(Some(path))
    }
}

/// Integer pixel bounds of `bbox` inside a `width`×`height` frame.
///
/// Corners truncate toward zero and clamp to the frame, mirroring the crop
/// arithmetic applied to persisted record boxes.
pub(crate) fn pixel_bounds(bbox: &BoundingBox, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let x0 = (bbox.x0.max(0.0) as u32).min(width);
    let y0 = (bbox.y0.max(0.0) as u32).min(height);
    let x1 = (bbox.x1.max(0.0) as u32).min(width);
    let y1 = (bbox.y1.max(0.0) as u32).min(height);
    (x0, y0, x1, y1)
}

//! Extraction stage: detection records and source images to region files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::detect::{group_by_filename, DetectionRecord};
use crate::pipeline::{file_stem, load_rgb_image};
use crate::region::{RegionConfig, RegionExtractor, Segmenter};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{GarmatchError, GarmatchResult};

/// Outputs and skip counters of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractReport {
    /// Region files written, in processing order.
    pub written: Vec<PathBuf>,
    /// Source images that could not be read; their whole group was skipped.
    pub unreadable_images: usize,
    /// Regions under the minimum-size gate.
    pub undersized_regions: usize,
    /// Regions lost to a segmentation, crop, or encode failure.
    pub failed_regions: usize,
}

/// Writes one masked region file per record.
///
/// Records are grouped by filename in first-appearance order; each group's
/// source image is read from `image_dir` and every record in the group
/// becomes a PNG in `output_dir`. A missing or unreadable source image skips
/// its whole group; an undersized region or a per-region failure skips that
/// region. Skips are counted in the report, never fatal. This stage stays
/// serial: the namer's counters are shared across the whole run.
pub fn extract_regions(
    segmenter: &dyn Segmenter,
    records: &[DetectionRecord],
    image_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &RegionConfig,
) -> GarmatchResult<ExtractReport> {
    let image_dir = image_dir.as_ref();
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir).map_err(|err| GarmatchError::Io {
        path: output_dir.display().to_string(),
        reason: err.to_string(),
    })?;

    let groups = group_by_filename(records);
    let _span = trace_span!("extract_regions", images = groups.len(), records = records.len())
        .entered();

    let mut extractor = RegionExtractor::new(segmenter, output_dir, config);
    let mut report = ExtractReport::default();

    for (filename, group) in groups {
        let image = match load_rgb_image(image_dir.join(filename)) {
            Ok(image) => image,
            Err(err) => {
                trace_warn!(
                    "skip_unreadable_image",
                    filename = filename,
                    regions = group.len(),
                    reason = err.to_string().as_str()
                );
                report.unreadable_images += 1;
                continue;
            }
        };

        let stem = file_stem(filename);
        for record in group {
            match extractor.extract(&image, stem, record) {
                Ok(Some(path)) => report.written.push(path),
                Ok(None) => {
                    trace_warn!("skip_undersized_region", filename = filename, label = record.label.as_str());
                    report.undersized_regions += 1;
                }
                Err(err) => {
                    trace_warn!(
                        "skip_failed_region",
                        filename = filename,
                        label = record.label.as_str(),
                        reason = err.to_string().as_str()
                    );
                    report.failed_regions += 1;
                }
            }
        }
    }

    trace_event!(
        "extract_regions_done",
        written = report.written.len(),
        unreadable = report.unreadable_images,
        undersized = report.undersized_regions,
        failed = report.failed_regions
    );
    Ok(report)
}

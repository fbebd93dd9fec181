//! Consolidation stage: batch runs over a directory or an interchange file.

use std::path::Path;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::detect::{Consolidator, DetectionRecord, ImageDetections};
use crate::pipeline::{list_image_files, load_rgb_image, Detector, JsonDetections};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::GarmatchResult;

/// Runs detection and consolidation over every image in `dir`.
///
/// Files are processed in sorted filename order. An unreadable image or a
/// failed detector call warns and skips that image; records from the
/// remaining images are returned in emission order.
pub fn detect_directory(
    detector: &dyn Detector,
    dir: impl AsRef<Path>,
    consolidator: &Consolidator,
) -> GarmatchResult<Vec<DetectionRecord>> {
    let files = list_image_files(dir)?;
    let _span = trace_span!("detect_directory", images = files.len()).entered();

    let mut records = Vec::new();
    for path in &files {
        records.extend(consolidate_image_file(detector, path, consolidator)?);
    }
    trace_event!("detect_directory_done", records = records.len());
    Ok(records)
}

/// Parallel variant of [`detect_directory`]; identical output.
#[cfg(feature = "rayon")]
pub fn detect_directory_par(
    detector: &(dyn Detector + Sync),
    dir: impl AsRef<Path>,
    consolidator: &Consolidator,
) -> GarmatchResult<Vec<DetectionRecord>> {
    let files = list_image_files(dir)?;
    let _span = trace_span!("detect_directory", images = files.len(), parallel = true).entered();

    let results: Vec<GarmatchResult<Vec<DetectionRecord>>> = files
        .par_iter()
        .map(|path| consolidate_image_file(detector, path, consolidator))
        .collect();

    let mut records = Vec::new();
    for result in results {
        records.extend(result?);
    }
    trace_event!("detect_directory_done", records = records.len());
    Ok(records)
}

fn consolidate_image_file(
    detector: &dyn Detector,
    path: &Path,
    consolidator: &Consolidator,
) -> GarmatchResult<Vec<DetectionRecord>> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let image = match load_rgb_image(path) {
        Ok(image) => image,
        Err(err) => {
            trace_warn!(
                "skip_unreadable_image",
                filename = filename.as_str(),
                reason = err.to_string().as_str()
            );
            return Ok(Vec::new());
        }
    };
    let output = match detector.detect(&image) {
        Ok(output) => output,
        Err(err) => {
            trace_warn!(
                "skip_detector_failure",
                filename = filename.as_str(),
                reason = err.to_string().as_str()
            );
            return Ok(Vec::new());
        }
    };

    let detections = consolidator.consolidate(&output)?;
    Ok(detections
        .iter()
        .map(|detection| DetectionRecord::new(&filename, detection))
        .collect())
}

/// Consolidates precomputed detector output, one interchange entry at a
/// time, in file order.
pub fn consolidate_precomputed(
    detections: &JsonDetections,
    consolidator: &Consolidator,
) -> GarmatchResult<Vec<DetectionRecord>> {
    let _span = trace_span!("consolidate_precomputed", images = detections.len()).entered();

    let mut records = Vec::new();
    for entry in detections.entries() {
        records.extend(consolidate_entry(entry, consolidator)?);
    }
    trace_event!("consolidate_precomputed_done", records = records.len());
    Ok(records)
}

/// Parallel variant of [`consolidate_precomputed`]; identical output.
#[cfg(feature = "rayon")]
pub fn consolidate_precomputed_par(
    detections: &JsonDetections,
    consolidator: &Consolidator,
) -> GarmatchResult<Vec<DetectionRecord>> {
    let _span = trace_span!(
        "consolidate_precomputed",
        images = detections.len(),
        parallel = true
    )
    .entered();

    let results: Vec<GarmatchResult<Vec<DetectionRecord>>> = detections
        .entries()
        .par_iter()
        .map(|entry| consolidate_entry(entry, consolidator))
        .collect();

    let mut records = Vec::new();
    for result in results {
        records.extend(result?);
    }
    trace_event!("consolidate_precomputed_done", records = records.len());
    Ok(records)
}

fn consolidate_entry(
    entry: &ImageDetections,
    consolidator: &Consolidator,
) -> GarmatchResult<Vec<DetectionRecord>> {
    let detections = consolidator.consolidate(&entry.detections)?;
    Ok(detections
        .iter()
        .map(|detection| DetectionRecord::new(&entry.filename, detection))
        .collect())
}

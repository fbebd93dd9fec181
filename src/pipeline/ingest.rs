//! Ingestion stage: region images to an embedding feature table.

use std::path::Path;

use crate::catalog::{FeatureEntry, FeatureTable};
use crate::pipeline::{file_stem, list_image_files, load_rgb_image, Embedder};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::GarmatchResult;

/// Embeds every region image in `dir` into a feature table.
///
/// Files are processed in sorted filename order; the table key is the file
/// stem. An unreadable file or a failed embed call warns and skips that
/// file. A repeated stem replaces the earlier entry in place; an embedding
/// whose length differs from earlier ones aborts the run.
pub fn ingest_directory(
    embedder: &dyn Embedder,
    dir: impl AsRef<Path>,
) -> GarmatchResult<FeatureTable> {
    let files = list_image_files(dir)?;
    let _span = trace_span!("ingest_directory", files = files.len()).entered();

    let mut table = FeatureTable::new();
    for path in &files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let image = match load_rgb_image(path) {
            Ok(image) => image,
            Err(err) => {
                trace_warn!(
                    "skip_unreadable_region",
                    filename = filename.as_str(),
                    reason = err.to_string().as_str()
                );
                continue;
            }
        };
        let feature = match embedder.embed(&image) {
            Ok(feature) => feature,
            Err(err) => {
                trace_warn!(
                    "skip_embed_failure",
                    filename = filename.as_str(),
                    reason = err.to_string().as_str()
                );
                continue;
            }
        };

        let key = file_stem(&filename).to_string();
        table.insert(key, FeatureEntry { filename, feature })?;
    }

    trace_event!("ingest_directory_done", entries = table.len());
    Ok(table)
}

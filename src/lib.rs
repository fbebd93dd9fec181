//! Garmatch consolidates noisy per-image object detections into one canonical
//! region per label and matches region embeddings against a reference catalog.
//!
//! The crate covers the algorithmic core: candidate filtering, greedy
//! conflict resolution, paired-label merging, masked region extraction, and
//! cosine top-K retrieval over an in-memory feature catalog. Model inference
//! (detection, segmentation, embedding) stays behind the [`pipeline::Detector`],
//! [`region::Segmenter`], and [`pipeline::Embedder`] seams; batch
//! orchestration can run in parallel via the `rayon` feature.

pub mod catalog;
pub mod detect;
pub mod label;
pub mod pipeline;
pub mod region;
mod trace;
pub mod util;

pub use catalog::{cosine_similarity, FeatureEntry, FeatureTable, MatchResult};
pub use detect::{
    filter_candidates, merge_pair_bucket, resolve_candidates, AcceptedSet, BoundingBox,
    ConsolidationConfig, Consolidator, Detection, DetectionRecord, DetectorOutput,
    ImageDetections, Resolution,
};
pub use label::{ConflictTable, LabelId, LabelVocabulary};
pub use pipeline::{Detector, Embedder};
pub use region::{BoxSegmenter, Mask, RegionConfig, RegionNaming, Segmenter};
pub use util::{GarmatchError, GarmatchResult};

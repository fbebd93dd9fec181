//! Merging the paired label's two best detections into one region.
//!
//! Footwear arrives as two independent boxes (left and right); downstream
//! stages want them as a single region.

use crate::detect::Detection;
use crate::label::LabelId;

/// Collapses the pair bucket into at most one synthetic detection.
///
/// Entries are sorted by score descending (stable); the two best merge into
/// their axis-aligned union with a fixed confidence of 1.0 and the canonical
/// label name. Fewer than two entries yield `None` — a lone candidate of the
/// paired label is dropped. Entries beyond the top two are discarded.
pub fn merge_pair_bucket(
    mut bucket: Vec<Detection>,
    paired_label: LabelId,
    canonical_name: &str,
) -> Option<Detection> {
    if bucket.len() < 2 {
        return None;
    }
    bucket.sort_by(|a, b| b.score.total_cmp(&a.score));
    let merged = bucket[0].bbox.union(&bucket[1].bbox);
    Some(Detection {
        label_id: paired_label,
        label_name: canonical_name.to_string(),
        score: 1.0,
        bbox: merged,
    })
}

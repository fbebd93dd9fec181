//! Detection types and the per-image consolidation pass.
//!
//! The pass runs filter → resolve → merge: raw detector output is narrowed to
//! an allowed label set and confidence floor, greedily reduced to at most one
//! detection per label under the conflict rules, and the paired label's two
//! best boxes are merged into one synthetic region.

pub mod filter;
pub mod pair;
pub mod record;
pub mod resolve;

use serde::{Deserialize, Serialize};

use crate::label::{ConflictTable, LabelId, LabelVocabulary};
use crate::util::{GarmatchError, GarmatchResult};

pub use filter::filter_candidates;
pub use pair::merge_pair_bucket;
pub use record::{group_by_filename, load_records, save_records, DetectionRecord};
pub use resolve::{resolve_candidates, AcceptedSet, Resolution};

/// Axis-aligned box in image pixel coordinates.
///
/// `(x0, y0)` is the top-left corner, `(x1, y1)` the bottom-right, with
/// `x0 < x1` and `y0 < y1`. Serialized as a 4-element array `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f32; 4]", try_from = "[f32; 4]")]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    /// Creates a box, rejecting degenerate or inverted corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> GarmatchResult<Self> {
        let bbox = Self { x0, y0, x1, y1 };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Checks the `x0 < x1, y0 < y1` invariant.
    pub fn validate(&self) -> GarmatchResult<()> {
        if self.x0 < self.x1 && self.y0 < self.y1 {
            Ok(())
        } else {
            Err(GarmatchError::InvalidBox {
                x0: self.x0,
                y0: self.y0,
                x1: self.x1,
                y1: self.y1,
            })
        }
    }

    /// Axis-aligned union of two boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Rounds all corners to two decimals, the persisted record precision.
    pub fn rounded(&self) -> Self {
        Self {
            x0: round2(self.x0),
            y0: round2(self.y0),
            x1: round2(self.x1),
            y1: round2(self.y1),
        }
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

impl From<BoundingBox> for [f32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x0, bbox.y0, bbox.x1, bbox.y1]
    }
}

impl TryFrom<[f32; 4]> for BoundingBox {
    type Error = GarmatchError;

    fn try_from(corners: [f32; 4]) -> GarmatchResult<Self> {
        Self::new(corners[0], corners[1], corners[2], corners[3])
    }
}

/// A scored, labeled region proposed by the detector. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label_id: LabelId,
    pub label_name: String,
    /// Detector confidence in `[0, 1]`.
    pub score: f32,
    pub bbox: BoundingBox,
}

/// Raw per-image detector output as parallel arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorOutput {
    pub scores: Vec<f32>,
    pub label_ids: Vec<LabelId>,
    pub boxes: Vec<BoundingBox>,
}

impl DetectorOutput {
    /// Appends one detection to the parallel arrays.
    pub fn push(&mut self, score: f32, label_id: LabelId, bbox: BoundingBox) {
        self.scores.push(score);
        self.label_ids.push(label_id);
        self.boxes.push(bbox);
    }

    /// Number of raw detections.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns true if the detector produced nothing.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Detector output for one named image, the raw-interchange file entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDetections {
    pub filename: String,
    pub detections: DetectorOutput,
}

/// Parameters of the consolidation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Label ids eligible for acceptance; everything else is dropped.
    pub allowed_label_ids: Vec<LabelId>,
    /// Minimum detector confidence for a candidate.
    pub min_confidence: f32,
    /// Label whose two best detections merge into one region (footwear in
    /// the stock configuration). `None` disables merging.
    pub paired_label_id: Option<LabelId>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            allowed_label_ids: vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 23],
            min_confidence: 0.05,
            paired_label_id: Some(23),
        }
    }
}

/// Runs the full consolidation pass for single images.
///
/// Holds the pass configuration, the conflict rules, and the label
/// vocabulary; all three are read-only, so one `Consolidator` can serve any
/// number of images (or threads).
#[derive(Debug, Clone, Default)]
pub struct Consolidator {
    config: ConsolidationConfig,
    conflicts: ConflictTable,
    vocabulary: LabelVocabulary,
}

impl Consolidator {
    /// Creates a consolidator from explicit parts.
    pub fn new(
        config: ConsolidationConfig,
        conflicts: ConflictTable,
        vocabulary: LabelVocabulary,
    ) -> Self {
        Self {
            config,
            conflicts,
            vocabulary,
        }
    }

    /// The pass configuration.
    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// The label vocabulary used to name detections.
    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    /// Consolidates one image's raw output into accepted detections.
    ///
    /// The returned order is the acceptance order; the merged paired
    /// detection, when present, comes last.
    pub fn consolidate(&self, output: &DetectorOutput) -> GarmatchResult<Vec<Detection>> {
        let candidates = filter_candidates(output, &self.config, &self.vocabulary)?;
        let Resolution {
            mut accepted,
            pair_bucket,
        } = resolve_candidates(candidates, &self.conflicts, self.config.paired_label_id);

        if let Some(paired) = self.config.paired_label_id {
            let name = self.vocabulary.name(paired);
            if let Some(merged) = merge_pair_bucket(pair_bucket, paired, &name) {
                accepted.insert(merged);
            }
        }
        Ok(accepted.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both_boxes() {
        let a = BoundingBox::new(10.0, 20.0, 30.0, 40.0).unwrap();
        let b = BoundingBox::new(5.0, 25.0, 28.0, 50.0).unwrap();
        let merged = a.union(&b);
        assert_eq!(merged, BoundingBox::new(5.0, 20.0, 30.0, 50.0).unwrap());
    }

    #[test]
    fn boxes_serialize_as_arrays() {
        let bbox = BoundingBox::new(1.005, 2.0, 3.25, 4.5).unwrap();
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[1.005,2.0,3.25,4.5]");
        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bbox);
    }

    #[test]
    fn inverted_boxes_are_rejected() {
        assert!(BoundingBox::new(10.0, 0.0, 5.0, 5.0).is_err());
        assert!(serde_json::from_str::<BoundingBox>("[0.0,0.0,0.0,5.0]").is_err());
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        let bbox = BoundingBox::new(1.004_9, 2.005_1, 3.333_3, 4.999_9).unwrap();
        let rounded = bbox.rounded();
        assert_eq!(rounded.x0, 1.0);
        assert_eq!(rounded.y0, 2.01);
        assert_eq!(rounded.x1, 3.33);
        assert_eq!(rounded.y1, 5.0);
    }
}

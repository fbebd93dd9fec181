//! Candidate filtering by allowed label set and confidence floor.

use crate::detect::{ConsolidationConfig, Detection, DetectorOutput};
use crate::label::LabelVocabulary;
use crate::util::{GarmatchError, GarmatchResult};

/// Narrows raw detector output to qualifying candidates.
///
/// Keeps detections whose label id is allowed and whose score reaches the
/// confidence floor, tagging each with its vocabulary name. Order is
/// preserved but not significant; the resolver re-sorts. Empty output or an
/// empty allowed set yields an empty list. Parallel arrays of unequal length
/// or a kept detection with an inverted box are structural errors.
pub fn filter_candidates(
    output: &DetectorOutput,
    config: &ConsolidationConfig,
    vocabulary: &LabelVocabulary,
) -> GarmatchResult<Vec<Detection>> {
    if output.scores.len() != output.label_ids.len()
        || output.scores.len() != output.boxes.len()
    {
        return Err(GarmatchError::MismatchedArrays {
            scores: output.scores.len(),
            label_ids: output.label_ids.len(),
            boxes: output.boxes.len(),
        });
    }

    let mut candidates = Vec::new();
    for ((&score, &label_id), &bbox) in output
        .scores
        .iter()
        .zip(&output.label_ids)
        .zip(&output.boxes)
    {
        if !config.allowed_label_ids.contains(&label_id) {
            continue;
        }
        if score < config.min_confidence {
            continue;
        }
        bbox.validate()?;
        candidates.push(Detection {
            label_id,
            label_name: vocabulary.name(label_id),
            score,
            bbox,
        });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn bbox() -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn drops_disallowed_and_low_confidence() {
        let mut output = DetectorOutput::default();
        output.push(0.9, 6, bbox());
        output.push(0.9, 13, bbox()); // glasses: not in the stock allowed set
        output.push(0.01, 8, bbox()); // below the floor
        let config = ConsolidationConfig::default();
        let vocab = LabelVocabulary::fashionpedia();

        let kept = filter_candidates(&output, &config, &vocab).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label_id, 6);
        assert_eq!(kept[0].label_name, "pants");
    }

    #[test]
    fn unequal_arrays_error() {
        let output = DetectorOutput {
            scores: vec![0.9, 0.8],
            label_ids: vec![6],
            boxes: vec![bbox()],
        };
        let err = filter_candidates(
            &output,
            &ConsolidationConfig::default(),
            &LabelVocabulary::fashionpedia(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GarmatchError::MismatchedArrays {
                scores: 2,
                label_ids: 1,
                boxes: 1,
            }
        );
    }
}

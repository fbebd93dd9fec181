//! Persisted detection records, the hand-off between pipeline stages.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detect::{BoundingBox, Detection};
use crate::util::{GarmatchError, GarmatchResult};

/// One accepted or merged detection, keyed to its source image.
///
/// Box corners are rounded to two decimals on creation. Records are persisted
/// as a flat JSON list in emission order; grouping by filename is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub filename: String,
    pub label: String,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl DetectionRecord {
    /// Builds a record for one accepted detection of `filename`.
    pub fn new(filename: &str, detection: &Detection) -> Self {
        Self {
            filename: filename.to_string(),
            label: detection.label_name.clone(),
            bbox: detection.bbox.rounded(),
        }
    }
}

/// Writes records as 2-space-indented JSON.
pub fn save_records<P: AsRef<Path>>(path: P, records: &[DetectionRecord]) -> GarmatchResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(records).map_err(|err| GarmatchError::MalformedJson {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    fs::write(path, json).map_err(|err| GarmatchError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Reads records back from JSON.
pub fn load_records<P: AsRef<Path>>(path: P) -> GarmatchResult<Vec<DetectionRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| GarmatchError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|err| GarmatchError::MalformedJson {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Groups records by filename, preserving first-appearance order of both the
/// groups and the records within each group.
pub fn group_by_filename(records: &[DetectionRecord]) -> Vec<(&str, Vec<&DetectionRecord>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&DetectionRecord>)> = Vec::new();
    for record in records {
        match index.get(record.filename.as_str()) {
            Some(&at) => groups[at].1.push(record),
            None => {
                index.insert(&record.filename, groups.len());
                groups.push((&record.filename, vec![record]));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, label: &str) -> DetectionRecord {
        DetectionRecord {
            filename: filename.to_string(),
            label: label.to_string(),
            bbox: BoundingBox::new(0.0, 0.0, 5.0, 5.0).unwrap(),
        }
    }

    #[test]
    fn grouping_keeps_first_appearance_order() {
        let records = vec![
            record("b.jpg", "pants"),
            record("a.jpg", "dress"),
            record("b.jpg", "shoe"),
        ];
        let groups = group_by_filename(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b.jpg");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].label, "shoe");
        assert_eq!(groups[1].0, "a.jpg");
    }
}

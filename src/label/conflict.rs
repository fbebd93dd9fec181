//! Label conflict rules.
//!
//! A conflict declares that two labels cannot both be accepted for one image
//! (e.g. `pants` vs `skirt`). Rules are loaded once from JSON and are
//! read-only for the rest of the run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::label::LabelId;
use crate::util::{GarmatchError, GarmatchResult};

/// One-directional conflict lookup keyed by the already-accepted label.
///
/// A rule `{"5": ["9"]}` makes a label-9 candidate conflict with an accepted
/// label 5, but not the reverse: with 9 accepted first, a label-5 candidate
/// passes unchecked. Symmetric rules must be listed from both sides. The
/// resolver depends on this direction; do not "fix" it to a symmetric check
/// without revisiting every chained-conflict outcome.
#[derive(Debug, Clone, Default)]
pub struct ConflictTable {
    rules: HashMap<LabelId, Vec<LabelId>>,
}

impl ConflictTable {
    /// Creates an empty table (no conflicts enforced).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from explicit rules.
    pub fn from_rules(rules: HashMap<LabelId, Vec<LabelId>>) -> Self {
        Self { rules }
    }

    /// Loads rules from a JSON object `{"<label_id>": ["<label_id>", ...]}`.
    ///
    /// An absent file yields an empty table; a file that exists but cannot be
    /// parsed, or that contains non-numeric ids, is a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> GarmatchResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|err| GarmatchError::Io {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(&text).map_err(|err| {
            GarmatchError::MalformedConflictTable {
                path: display.clone(),
                reason: err.to_string(),
            }
        })?;

        let mut rules = HashMap::with_capacity(raw.len());
        for (key, values) in raw {
            let label = parse_id(&key, &display)?;
            let mut ids = Vec::with_capacity(values.len());
            for value in &values {
                ids.push(parse_id(value, &display)?);
            }
            rules.insert(label, ids);
        }
        Ok(Self { rules })
    }

    /// Returns true if `candidate` is listed in the rule entry of `accepted`.
    pub fn conflicts_with(&self, accepted: LabelId, candidate: LabelId) -> bool {
        self.rules
            .get(&accepted)
            .is_some_and(|ids| ids.contains(&candidate))
    }

    /// Number of labels that carry a rule entry.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are present.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_id(token: &str, path: &str) -> GarmatchResult<LabelId> {
    token
        .parse()
        .map_err(|_| GarmatchError::MalformedConflictTable {
            path: path.to_string(),
            reason: format!("non-numeric label id '{token}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rules: &[(LabelId, &[LabelId])]) -> ConflictTable {
        ConflictTable::from_rules(
            rules
                .iter()
                .map(|(id, ids)| (*id, ids.to_vec()))
                .collect(),
        )
    }

    #[test]
    fn lookup_is_one_directional() {
        let rules = table(&[(5, &[9])]);
        assert!(rules.conflicts_with(5, 9));
        assert!(!rules.conflicts_with(9, 5));
    }

    #[test]
    fn empty_table_never_conflicts() {
        let rules = ConflictTable::new();
        assert!(rules.is_empty());
        assert!(!rules.conflicts_with(5, 9));
    }
}

//! Greedy conflict resolution for one image's candidates.

use crate::detect::Detection;
use crate::label::{ConflictTable, LabelId};
use crate::trace::{trace_event, trace_span};

/// Accepted detections for one image, at most one per label.
///
/// Backed by a vector so iteration follows insertion order: replacing a
/// label's entry keeps its slot, evicting removes the slot, and a label
/// accepted again after eviction re-enters at the end. Both the emission
/// order of records and the first-conflict scan depend on this ordering.
#[derive(Debug, Clone, Default)]
pub struct AcceptedSet {
    entries: Vec<Detection>,
}

impl AcceptedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry currently accepted for `label_id`, if any.
    pub fn get(&self, label_id: LabelId) -> Option<&Detection> {
        self.entries.iter().find(|entry| entry.label_id == label_id)
    }

    /// Accepts a detection: replaces the label's entry in place, or appends.
    pub fn insert(&mut self, detection: Detection) {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.label_id == detection.label_id)
        {
            Some(slot) => *slot = detection,
            None => self.entries.push(detection),
        }
    }

    /// Removes the entry for `label_id`, closing its slot.
    fn evict(&mut self, label_id: LabelId) {
        self.entries.retain(|entry| entry.label_id != label_id);
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.entries.iter()
    }

    /// Number of accepted labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been accepted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the set, yielding entries in insertion order.
    pub fn into_vec(self) -> Vec<Detection> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a AcceptedSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// At most one detection per non-paired label.
    pub accepted: AcceptedSet,
    /// Candidates of the paired label, awaiting the merge step.
    pub pair_bucket: Vec<Detection>,
}

/// Greedily reduces candidates to at most one accepted detection per label.
///
/// Candidates are visited in descending score order (stable, so equal scores
/// keep their input order). For each candidate:
///
/// 1. If its label already holds a slot, it replaces that entry only on a
///    strictly greater score; otherwise it is dropped. Either way the
///    candidate is finished — no conflict or pairing logic runs.
/// 2. Otherwise the accepted entries are scanned in insertion order and the
///    *first* one whose rule entry lists this label decides the outcome: a
///    strictly greater candidate score evicts that entry, anything else
///    drops the candidate. Later conflicting entries are deliberately not
///    examined, so chained conflicts resolve one eviction at a time.
/// 3. A surviving candidate of the paired label goes to the pair bucket and
///    is never accepted directly; every other survivor is accepted.
///
/// Never fails: zero qualifying candidates produce an empty resolution.
pub fn resolve_candidates(
    mut candidates: Vec<Detection>,
    conflicts: &ConflictTable,
    paired_label: Option<LabelId>,
) -> Resolution {
    let _span = trace_span!("resolve_candidates", candidates = candidates.len()).entered();
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut accepted = AcceptedSet::new();
    let mut pair_bucket = Vec::new();

    for candidate in candidates {
        if let Some(existing) = accepted.get(candidate.label_id) {
            let existing_score = existing.score;
            if candidate.score > existing_score {
                accepted.insert(candidate);
            }
            continue;
        }

        let conflict = accepted
            .iter()
            .find(|entry| conflicts.conflicts_with(entry.label_id, candidate.label_id))
            .map(|entry| (entry.label_id, entry.score));
        if let Some((existing_id, existing_score)) = conflict {
            if candidate.score > existing_score {
                accepted.evict(existing_id);
            } else {
                continue;
            }
        }

        if paired_label == Some(candidate.label_id) {
            pair_bucket.push(candidate);
        } else {
            accepted.insert(candidate);
        }
    }

    trace_event!(
        "resolution",
        accepted = accepted.len(),
        paired_candidates = pair_bucket.len()
    );
    Resolution {
        accepted,
        pair_bucket,
    }
}

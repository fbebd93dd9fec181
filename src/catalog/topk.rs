//! Cosine similarity and top-K retrieval.

use serde::{Deserialize, Serialize};

use crate::catalog::FeatureTable;
use crate::util::{GarmatchError, GarmatchResult};

/// One ranked catalog hit for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 1-based rank within the returned list.
    pub rank: u32,
    /// Catalog key of the matched entry.
    pub key: String,
    /// Filename stored with the matched entry.
    pub filename: String,
    /// Cosine similarity in `[-1, 1]`.
    pub similarity: f32,
}

/// Cosine similarity of two vectors: `dot(a, b) / (||a|| * ||b||)`.
///
/// A zero-norm operand (including the empty vector) yields 0.0 instead of a
/// division by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a > 1e-12 && norm_b > 1e-12 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

impl FeatureTable {
    /// Returns the `k` entries most similar to `query`, ranked descending.
    ///
    /// Equal similarities keep the catalog's entry order. A `k` larger than
    /// the catalog returns every entry; an empty catalog (or `k == 0`)
    /// returns an empty list. A query whose length differs from the catalog
    /// dimension is an error.
    pub fn top_k(&self, query: &[f32], k: usize) -> GarmatchResult<Vec<MatchResult>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.dimension() {
            if query.len() != expected {
                return Err(GarmatchError::QueryDimensionMismatch {
                    expected,
                    got: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, (_, entry))| (idx, cosine_similarity(query, &entry.feature)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (idx, similarity))| {
                let (key, entry) = &self.entries()[idx];
                MatchResult {
                    rank: (rank + 1) as u32,
                    key: key.clone(),
                    filename: entry.filename.clone(),
                    similarity,
                }
            })
            .collect())
    }
}

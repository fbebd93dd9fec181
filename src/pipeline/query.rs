//! Query stage: batch top-K retrieval of a query table against a catalog.

use serde::Serialize;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::catalog::{FeatureTable, MatchResult};
use crate::trace::{trace_event, trace_span};
use crate::util::{GarmatchError, GarmatchResult};

/// Ranked matches for one query entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    /// Key of the query entry in its feature table.
    pub key: String,
    /// Region file the query vector was embedded from.
    pub filename: String,
    /// Top-K catalog hits, ranked by similarity descending.
    pub matches: Vec<MatchResult>,
}

/// Ranks every query entry against the catalog.
///
/// Reports come back in the query table's entry order, one per query, each
/// holding at most `k` matches. An empty catalog yields a report with an
/// empty match list for every query. A dimension mismatch between the two
/// tables (both non-empty) is an error, checked once up front.
pub fn query_all(
    catalog: &FeatureTable,
    queries: &FeatureTable,
    k: usize,
) -> GarmatchResult<Vec<QueryReport>> {
    check_dimensions(catalog, queries)?;
    let _span = trace_span!("query_all", queries = queries.len(), k = k).entered();

    let reports = queries
        .iter()
        .map(|(key, entry)| {
            Ok(QueryReport {
                key: key.to_string(),
                filename: entry.filename.clone(),
                matches: catalog.top_k(&entry.feature, k)?,
            })
        })
        .collect::<GarmatchResult<Vec<_>>>()?;

    trace_event!("query_all_done", reports = reports.len());
    Ok(reports)
}

/// Parallel variant of [`query_all`]; identical output.
///
/// The catalog is read-only during the run, so queries fan out without
/// coordination.
#[cfg(feature = "rayon")]
pub fn query_all_par(
    catalog: &FeatureTable,
    queries: &FeatureTable,
    k: usize,
) -> GarmatchResult<Vec<QueryReport>> {
    check_dimensions(catalog, queries)?;
    let _span = trace_span!("query_all", queries = queries.len(), k = k, parallel = true).entered();

    let entries: Vec<_> = queries.iter().collect();
    let reports = entries
        .par_iter()
        .map(|(key, entry)| {
            Ok(QueryReport {
                key: key.to_string(),
                filename: entry.filename.clone(),
                matches: catalog.top_k(&entry.feature, k)?,
            })
        })
        .collect::<GarmatchResult<Vec<_>>>()?;

    trace_event!("query_all_done", reports = reports.len());
    Ok(reports)
}

fn check_dimensions(catalog: &FeatureTable, queries: &FeatureTable) -> GarmatchResult<()> {
    if let (Some(expected), Some(got)) = (catalog.dimension(), queries.dimension()) {
        if expected != got {
            return Err(GarmatchError::QueryDimensionMismatch { expected, got });
        }
    }
    Ok(())
}

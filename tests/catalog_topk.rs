//! Top-K retrieval over a feature catalog.

use garmatch::catalog::{cosine_similarity, FeatureEntry, FeatureTable};
use garmatch::GarmatchError;

fn table(entries: &[(&str, &[f32])]) -> FeatureTable {
    let mut table = FeatureTable::new();
    for (key, feature) in entries {
        table
            .insert(
                (*key).to_string(),
                FeatureEntry {
                    filename: format!("{key}.png"),
                    feature: feature.to_vec(),
                },
            )
            .unwrap();
    }
    table
}

#[test]
fn top_k_returns_k_results_sorted_descending() {
    let catalog = table(&[
        ("a", &[1.0, 0.0]),
        ("b", &[0.8, 0.6]),
        ("c", &[0.0, 1.0]),
        ("d", &[0.6, 0.8]),
        ("e", &[-1.0, 0.0]),
    ]);
    let results = catalog.top_k(&[1.0, 0.0], 3).unwrap();

    assert_eq!(results.len(), 3);
    let keys: Vec<_> = results.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["a", "b", "d"]);
    for window in results.windows(2) {
        assert!(window[0].similarity >= window[1].similarity);
    }
    let ranks: Vec<_> = results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, [1, 2, 3]);
}

#[test]
fn k_larger_than_catalog_returns_everything() {
    let catalog = table(&[
        ("a", &[1.0, 0.0]),
        ("b", &[0.0, 1.0]),
        ("c", &[0.5, 0.5]),
        ("d", &[-0.5, 0.5]),
        ("e", &[0.9, 0.1]),
    ]);
    let results = catalog.top_k(&[1.0, 1.0], 10).unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results.last().unwrap().rank, 5);
}

#[test]
fn ties_keep_catalog_order() {
    // b and c are the same vector; b was inserted first.
    let catalog = table(&[
        ("a", &[0.0, 1.0]),
        ("b", &[1.0, 0.0]),
        ("c", &[1.0, 0.0]),
        ("d", &[2.0, 0.0]), // also similarity 1.0 against the query
    ]);
    let results = catalog.top_k(&[1.0, 0.0], 4).unwrap();

    let keys: Vec<_> = results.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["b", "c", "d", "a"]);
}

#[test]
fn empty_catalog_returns_empty() {
    let catalog = FeatureTable::new();
    assert!(catalog.top_k(&[1.0, 0.0], 3).unwrap().is_empty());
}

#[test]
fn zero_query_scores_zero_everywhere() {
    let catalog = table(&[("a", &[1.0, 0.0]), ("b", &[0.0, 1.0])]);
    let results = catalog.top_k(&[0.0, 0.0], 2).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.similarity == 0.0));
    // Ties at 0.0 keep catalog order.
    assert_eq!(results[0].key, "a");
}

#[test]
fn wrong_query_dimension_errors() {
    let catalog = table(&[("a", &[1.0, 0.0, 0.0])]);
    let err = catalog.top_k(&[1.0, 0.0], 1).unwrap_err();
    assert_eq!(
        err,
        GarmatchError::QueryDimensionMismatch { expected: 3, got: 2 }
    );
}

#[test]
fn results_carry_filenames_and_similarity_bounds() {
    let catalog = table(&[("best", &[3.0, 4.0]), ("worst", &[-3.0, -4.0])]);
    let results = catalog.top_k(&[3.0, 4.0], 2).unwrap();

    assert_eq!(results[0].filename, "best.png");
    assert!((results[0].similarity - 1.0).abs() < 1e-6);
    assert!((results[1].similarity + 1.0).abs() < 1e-6);
}

#[test]
fn similarity_matches_hand_computation() {
    let a = [1.0f32, 2.0, 3.0];
    let b = [4.0f32, 5.0, 6.0];
    // dot = 32, |a| = sqrt(14), |b| = sqrt(77)
    let expected = 32.0 / (14.0f32.sqrt() * 77.0f32.sqrt());
    assert!((cosine_similarity(&a, &b) - expected).abs() < 1e-6);
}

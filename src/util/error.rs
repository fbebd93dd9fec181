//! Error types for garmatch.

use thiserror::Error;

/// Result alias for garmatch operations.
pub type GarmatchResult<T> = std::result::Result<T, GarmatchError>;

/// Errors that can occur while consolidating detections or matching features.
#[derive(Debug, Error, PartialEq)]
pub enum GarmatchError {
    /// Detector output arrays disagree on length.
    #[error(
        "mismatched detector output: {scores} scores, {label_ids} label ids, {boxes} boxes"
    )]
    MismatchedArrays {
        scores: usize,
        label_ids: usize,
        boxes: usize,
    },
    /// A bounding box violates `x0 < x1, y0 < y1`.
    #[error("invalid bounding box [{x0}, {y0}, {x1}, {y1}]")]
    InvalidBox { x0: f32, y0: f32, x1: f32, y1: f32 },
    /// Mask buffer length does not match its declared dimensions.
    #[error("mask buffer of {len} entries does not match {width}x{height}")]
    MaskSize { width: u32, height: u32, len: usize },
    /// Mask dimensions differ from the image it is applied to.
    #[error("mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}")]
    MaskImageMismatch {
        mask_width: u32,
        mask_height: u32,
        image_width: u32,
        image_height: u32,
    },
    /// A feature vector has the wrong length for its table.
    #[error("feature '{key}' has dimension {got}, table expects {expected}")]
    DimensionMismatch {
        key: String,
        expected: usize,
        got: usize,
    },
    /// A query vector has the wrong length for the catalog.
    #[error("query vector has dimension {got}, catalog expects {expected}")]
    QueryDimensionMismatch { expected: usize, got: usize },
    /// Conflict-rule file exists but cannot be interpreted.
    #[error("malformed conflict table {path}: {reason}")]
    MalformedConflictTable { path: String, reason: String },
    /// Feature-table file exists but cannot be interpreted.
    #[error("malformed feature table {path}: {reason}")]
    MalformedFeatureTable { path: String, reason: String },
    /// Any other persisted JSON that fails to parse.
    #[error("malformed json {path}: {reason}")]
    MalformedJson { path: String, reason: String },
    /// Filesystem-level failure.
    #[error("io error on {path}: {reason}")]
    Io { path: String, reason: String },
    /// Image decode or encode failure.
    #[error("image io error on {path}: {reason}")]
    ImageIo { path: String, reason: String },
}

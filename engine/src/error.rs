//! Error types for the Docket engine.

use crate::{ClassName, FieldKey};
use thiserror::Error;

/// All possible errors from the Docket engine.
///
/// Every error is raised while a constraint, relation or operation is being
/// built, never later when the payload is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Reference errors
    #[error("{class_name} object has no objectId and cannot be referenced")]
    IdentityMissing { class_name: ClassName },

    #[error("validation failed: {0}")]
    Validation(String),

    // Schema errors
    #[error("class mismatch: expected '{expected}', got '{actual}'")]
    ClassMismatch { expected: String, actual: String },

    #[error("unknown field '{field}' on class {class_name}")]
    UnknownField {
        class_name: ClassName,
        field: FieldKey,
    },

    #[error("invalid relation: {0}")]
    InvalidRelation(String),

    // Predicate errors
    #[error("text option '{option}' expects a {expected} value, got {got}")]
    OptionTypeMismatch {
        option: String,
        expected: String,
        got: String,
    },

    #[error("invalid geo point: {0}")]
    InvalidGeoPoint(String),

    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for lesson-core.

use thiserror::Error;

/// Result type alias using ValidationError.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors raised when input does not satisfy the catalog or progress rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("duplicate lesson {lesson_id} in topic {topic_id}")]
    DuplicateLesson { topic_id: String, lesson_id: String },

    #[error("invalid score: {0}")]
    InvalidScore(f64),

    #[error("invalid status: {0}")]
    InvalidStatus(String),
}

impl ValidationError {
    /// Field names reported by a `MissingFields` error, empty otherwise.
    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::MissingFields(fields) => fields,
            _ => &[],
        }
    }
}

//! Core domain library for the grammar learning backend.
//!
//! Provides:
//! - Catalog types (Topic, Lesson) and their validation rules
//! - Per-user and catalog-wide progress aggregation
//! - Writing rules (word count, defaults, status)
//!
//! Nothing in this crate performs I/O.

pub mod error;
pub mod progress;
pub mod types;
pub mod writing;

pub use error::{Result, ValidationError};
pub use progress::{
    compute_catalog_progress, compute_user_progress, percentage, CatalogProgressReport,
    CatalogTopicProgress, TopicProgress, UserProgressReport,
};
pub use types::{validate_score, CompletedLesson, CompletionSet, Lesson, Topic, TopicDraft};
pub use writing::{count_words, WritingStatus, DEFAULT_TITLE, DEFAULT_TYPE};

//! Writing submission rules.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Title given to a writing saved without one.
pub const DEFAULT_TITLE: &str = "Untitled Draft";

/// Classification tag given to a writing saved without one.
pub const DEFAULT_TYPE: &str = "Free Write";

/// Lifecycle status of a writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingStatus {
    #[default]
    Draft,
    Submitted,
}

impl WritingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Number of whitespace-delimited words; 0 for blank content.
pub fn count_words(content: &str) -> usize {
    content.split_whitespace().count()
}

/// The given title, or [`DEFAULT_TITLE`] when absent or blank.
pub fn title_or_default(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => DEFAULT_TITLE.to_string(),
    }
}

/// The given type tag, or [`DEFAULT_TYPE`] when absent or blank.
pub fn type_or_default(kind: Option<&str>) -> String {
    match kind {
        Some(k) if !k.trim().is_empty() => k.to_string(),
        _ => DEFAULT_TYPE.to_string(),
    }
}

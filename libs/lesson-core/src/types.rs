//! Catalog and completion types.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// A lesson embedded in its parent topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Unique only within the parent topic.
    pub lesson_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// A catalog topic with its ordered lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub topic_id: String,
    pub title: String,
    pub icon: String,
    pub order: i32,
    pub is_locked: bool,
    pub lessons: Vec<Lesson>,
}

impl Topic {
    /// Number of lessons, always derived from the lesson list.
    pub fn total_lessons(&self) -> usize {
        self.lessons.len()
    }

    /// Check the invariants a stored topic must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.topic_id.trim().is_empty() {
            return Err(ValidationError::Empty { field: "topicId" });
        }
        if self.order < 0 {
            return Err(ValidationError::Negative {
                field: "order",
                value: i64::from(self.order),
            });
        }

        let mut seen = HashSet::new();
        for lesson in &self.lessons {
            if lesson.lesson_id.trim().is_empty() {
                return Err(ValidationError::Empty { field: "lessonId" });
            }
            if lesson.title.trim().is_empty() {
                return Err(ValidationError::Empty {
                    field: "lesson title",
                });
            }
            if !seen.insert(lesson.lesson_id.as_str()) {
                return Err(ValidationError::DuplicateLesson {
                    topic_id: self.topic_id.clone(),
                    lesson_id: lesson.lesson_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Whether the topic contains the given lesson.
    pub fn has_lesson(&self, lesson_id: &str) -> bool {
        self.lessons.iter().any(|l| l.lesson_id == lesson_id)
    }
}

/// Topic payload as submitted by a client, before validation.
///
/// Every field is optional so that missing required fields can be reported
/// together instead of failing on the first one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDraft {
    pub topic_id: Option<String>,
    pub icon: Option<String>,
    pub title: Option<String>,
    pub lessons: Option<Vec<Lesson>>,
    pub order: Option<i32>,
    pub total_lessons: Option<i64>,
    pub is_locked: Option<bool>,
}

impl TopicDraft {
    /// Validate the draft and turn it into a topic.
    ///
    /// `totalLessons` is accepted for compatibility but never stored: the
    /// count is derived from `lessons`.
    pub fn into_topic(self) -> Result<Topic> {
        let mut missing = Vec::new();
        let topic_id = required(self.topic_id, "topicId", &mut missing);
        let icon = required(self.icon, "icon", &mut missing);
        let title = required(self.title, "title", &mut missing);
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        if let Some(total) = self.total_lessons {
            if total < 0 {
                return Err(ValidationError::Negative {
                    field: "totalLessons",
                    value: total,
                });
            }
        }

        let topic = Topic {
            topic_id,
            title,
            icon,
            order: self.order.unwrap_or(0),
            is_locked: self.is_locked.unwrap_or(true),
            lessons: self.lessons.unwrap_or_default(),
        };
        topic.validate()?;
        Ok(topic)
    }

    /// Declared lesson count that disagrees with the lesson list, if any.
    pub fn inconsistent_total(&self) -> Option<i64> {
        let actual = self.lessons.as_ref().map_or(0, Vec::len) as i64;
        self.total_lessons.filter(|&declared| declared != actual)
    }
}

fn required(value: Option<String>, name: &str, missing: &mut Vec<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name.to_string());
            String::new()
        }
    }
}

/// Set of completed lessons, keyed by `(topicId, lessonId)`.
///
/// Holds either one user's completions or the catalog-wide union; which one
/// is decided by the caller and by the aggregation entry point it feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    lessons: HashSet<(String, String)>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, topic_id: impl Into<String>, lesson_id: impl Into<String>) -> bool {
        self.lessons.insert((topic_id.into(), lesson_id.into()))
    }

    pub fn contains(&self, topic_id: &str, lesson_id: &str) -> bool {
        self.lessons
            .contains(&(topic_id.to_string(), lesson_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

impl<T, L> FromIterator<(T, L)> for CompletionSet
where
    T: Into<String>,
    L: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (T, L)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (topic_id, lesson_id) in iter {
            set.insert(topic_id, lesson_id);
        }
        set
    }
}

/// One entry of a user's completion log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedLesson {
    pub topic_id: String,
    pub lesson_id: String,
    pub completed_at: DateTime<Utc>,
    pub score: f64,
}

/// Reject scores that are negative or not finite.
pub fn validate_score(score: f64) -> Result<f64> {
    if !score.is_finite() || score < 0.0 {
        return Err(ValidationError::InvalidScore(score));
    }
    Ok(score)
}

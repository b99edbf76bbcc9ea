//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from lesson-core
pub use lesson_core::types::{CompletedLesson, CompletionSet, Lesson, Topic, TopicDraft};
pub use lesson_core::{percentage, CatalogProgressReport, UserProgressReport, WritingStatus};

// === Database Entity Types ===

/// Topic stored in PostgreSQL, lessons embedded as JSONB
#[derive(Debug, Clone, FromRow)]
pub struct DbTopic {
    pub id: Uuid,
    pub topic_id: String,
    pub title: String,
    pub icon: String,
    pub sort_order: i32,
    pub is_locked: bool,
    pub lessons: Json<Vec<Lesson>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbTopic {
    /// Convert to the lesson-core topic
    pub fn to_core_topic(&self) -> Topic {
        Topic {
            topic_id: self.topic_id.clone(),
            title: self.title.clone(),
            icon: self.icon.clone(),
            order: self.sort_order,
            is_locked: self.is_locked,
            lessons: self.lessons.0.clone(),
        }
    }

    /// Convert to API topic type. `progress` counts lessons in `completed`,
    /// normally the catalog-wide set.
    pub fn to_api_topic(&self, completed: &CompletionSet) -> TopicResponse {
        let done = self
            .lessons
            .0
            .iter()
            .filter(|l| completed.contains(&self.topic_id, &l.lesson_id))
            .count();

        TopicResponse {
            id: self.id,
            topic_id: self.topic_id.clone(),
            title: self.title.clone(),
            icon: self.icon.clone(),
            total_lessons: self.lessons.0.len(),
            progress: percentage(done, self.lessons.0.len()),
            lessons: self.lessons.0.clone(),
            is_locked: self.is_locked,
            order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// One (user, topic, lesson) completion
#[derive(Debug, Clone, FromRow)]
pub struct DbCompletion {
    pub user_id: String,
    pub topic_id: String,
    pub lesson_id: String,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

impl DbCompletion {
    pub fn to_api_completion(&self) -> CompletedLesson {
        CompletedLesson {
            topic_id: self.topic_id.clone(),
            lesson_id: self.lesson_id.clone(),
            completed_at: self.completed_at,
            score: self.score,
        }
    }
}

/// Per-user progress summary row
#[derive(Debug, Clone, FromRow)]
pub struct DbUserProgress {
    pub user_id: String,
    pub total_progress: i32,
    pub last_accessed_topic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writing submission stored in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbWriting {
    pub id: Uuid,
    pub firebase_uid: String,
    pub title: String,
    pub content: String,
    pub kind: String,
    pub word_count: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbWriting {
    /// Convert to API writing type
    pub fn to_api_writing(&self) -> Writing {
        Writing {
            id: self.id,
            firebase_uid: self.firebase_uid.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            kind: self.kind.clone(),
            word_count: self.word_count.max(0) as usize,
            status: WritingStatus::parse(&self.status).unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Fields for a new writing, defaults already applied
#[derive(Debug, Clone)]
pub struct NewWriting {
    pub title: String,
    pub content: String,
    pub kind: String,
    pub status: WritingStatus,
}

/// Partial update of a writing; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct WritingPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub kind: Option<String>,
    pub status: Option<WritingStatus>,
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicResponse {
    pub id: Uuid,
    pub topic_id: String,
    pub title: String,
    pub icon: String,
    pub total_lessons: usize,
    pub progress: u32,
    pub lessons: Vec<Lesson>,
    pub is_locked: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Progress types
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonRequest {
    pub topic_id: String,
    pub lesson_id: String,
    pub score: f64,
}

/// A user's own progress record
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgressResponse {
    pub user_id: String,
    pub completed_lessons: Vec<CompletedLesson>,
    pub total_progress: u32,
    pub last_accessed_topic: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProgressResponse {
    pub fn new(user_id: &str, progress: Option<DbUserProgress>, log: Vec<DbCompletion>) -> Self {
        let completed_lessons = log.iter().map(DbCompletion::to_api_completion).collect();
        match progress {
            Some(p) => Self {
                user_id: p.user_id,
                completed_lessons,
                total_progress: p.total_progress.clamp(0, 100) as u32,
                last_accessed_topic: p.last_accessed_topic,
                created_at: Some(p.created_at),
                updated_at: Some(p.updated_at),
            },
            None => Self {
                user_id: user_id.to_string(),
                completed_lessons,
                total_progress: 0,
                last_accessed_topic: None,
                created_at: None,
                updated_at: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetProgressResponse {
    pub message: String,
    pub reset: bool,
}

// Writing types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Writing {
    pub id: Uuid,
    pub firebase_uid: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub word_count: usize,
    pub status: WritingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SaveWritingRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<WritingStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveWritingResponse {
    pub success: bool,
    pub message: String,
    pub data: Writing,
}

// Health types
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub server: String,
    pub timestamp: DateTime<Utc>,
    pub database: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotFoundResponse {
    pub error: String,
    pub requested: String,
}

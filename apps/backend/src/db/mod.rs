//! PostgreSQL database operations
//!
//! Every method on user-owned data (progress, writings) takes the verified
//! owner id and filters each statement by it, so a caller can never read or
//! change another owner's rows by guessing an id.

use lesson_core::count_words;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{ApiError, Result};
use crate::models::*;

const TOPIC_COLUMNS: &str =
    "id, topic_id, title, icon, sort_order, is_locked, lessons, created_at, updated_at";

const WRITING_COLUMNS: &str =
    "id, firebase_uid, title, content, kind, word_count, status, created_at, updated_at";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool.
    ///
    /// Fails if no connection can be established within the configured timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that connects on first use.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(1))
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Whether the store answers a trivial query
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // === Topic Repository ===

    /// List all topics ordered by rank
    pub async fn list_topics(&self) -> Result<Vec<DbTopic>> {
        let topics = sqlx::query_as::<_, DbTopic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics ORDER BY sort_order, topic_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }

    /// Get topic by record ID
    pub async fn get_topic(&self, id: Uuid) -> Result<Option<DbTopic>> {
        let topic = sqlx::query_as::<_, DbTopic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Get topic by its business identifier
    pub async fn get_topic_by_topic_id(&self, topic_id: &str) -> Result<Option<DbTopic>> {
        let topic = sqlx::query_as::<_, DbTopic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE topic_id = $1"
        ))
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Insert a new topic
    pub async fn create_topic(&self, topic: &Topic) -> Result<DbTopic> {
        let created = sqlx::query_as::<_, DbTopic>(&format!(
            r#"
            INSERT INTO topics (id, topic_id, title, icon, sort_order, is_locked, lessons)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TOPIC_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&topic.topic_id)
        .bind(&topic.title)
        .bind(&topic.icon)
        .bind(topic.order)
        .bind(topic.is_locked)
        .bind(Json(&topic.lessons))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, &topic.topic_id))?;

        Ok(created)
    }

    /// Replace all fields of a topic.
    ///
    /// Completions follow the topic: a renamed `topicId` carries them along,
    /// and completions of lessons no longer in the topic are dropped, all in
    /// the same transaction as the update.
    pub async fn update_topic(&self, id: Uuid, topic: &Topic) -> Result<Option<DbTopic>> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT topic_id FROM topics WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(previous) = previous else {
            return Ok(None);
        };

        let updated = sqlx::query_as::<_, DbTopic>(&format!(
            r#"
            UPDATE topics SET
                topic_id = $2,
                title = $3,
                icon = $4,
                sort_order = $5,
                is_locked = $6,
                lessons = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TOPIC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&topic.topic_id)
        .bind(&topic.title)
        .bind(&topic.icon)
        .bind(topic.order)
        .bind(topic.is_locked)
        .bind(Json(&topic.lessons))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, &topic.topic_id))?;

        if previous != topic.topic_id {
            // Rows left under the new id belong to no live topic.
            sqlx::query("DELETE FROM lesson_completions WHERE topic_id = $1")
                .bind(&topic.topic_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query("UPDATE lesson_completions SET topic_id = $2 WHERE topic_id = $1")
                .bind(&previous)
                .bind(&topic.topic_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "UPDATE user_progress SET last_accessed_topic = $2 WHERE last_accessed_topic = $1",
            )
            .bind(&previous)
            .bind(&topic.topic_id)
            .execute(&mut *tx)
            .await?;
        }

        let lesson_ids: Vec<&str> = topic.lessons.iter().map(|l| l.lesson_id.as_str()).collect();
        let dropped = sqlx::query(
            "DELETE FROM lesson_completions WHERE topic_id = $1 AND NOT (lesson_id = ANY($2))",
        )
        .bind(&topic.topic_id)
        .bind(&lesson_ids[..])
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if dropped.rows_affected() > 0 {
            tracing::info!(
                topic_id = %topic.topic_id,
                dropped = dropped.rows_affected(),
                "dropped completions of removed lessons"
            );
        }

        Ok(Some(updated))
    }

    /// Delete a topic and the completions recorded against it
    pub async fn delete_topic(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let topic_id: Option<String> =
            sqlx::query_scalar("DELETE FROM topics WHERE id = $1 RETURNING topic_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(topic_id) = topic_id else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM lesson_completions WHERE topic_id = $1")
            .bind(&topic_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    // === Completion Repository ===

    /// Get a user's completion log, oldest first
    pub async fn get_user_completions(&self, user_id: &str) -> Result<Vec<DbCompletion>> {
        let completions = sqlx::query_as::<_, DbCompletion>(
            r#"
            SELECT user_id, topic_id, lesson_id, score, completed_at
            FROM lesson_completions
            WHERE user_id = $1
            ORDER BY completed_at, topic_id, lesson_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(completions)
    }

    /// Lessons completed by one user
    pub async fn get_completion_set(&self, user_id: &str) -> Result<CompletionSet> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT topic_id, lesson_id FROM lesson_completions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Lessons completed by at least one user
    pub async fn get_completed_by_anyone(&self) -> Result<CompletionSet> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT DISTINCT topic_id, lesson_id FROM lesson_completions")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    // === User Progress Repository ===

    /// Get the owner's progress record
    pub async fn get_owned_progress(&self, owner: &str) -> Result<Option<DbUserProgress>> {
        let progress = sqlx::query_as::<_, DbUserProgress>(
            r#"
            SELECT user_id, total_progress, last_accessed_topic, created_at, updated_at
            FROM user_progress
            WHERE user_id = $1
            "#,
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Record (or re-record) a lesson completion and refresh the owner's
    /// cached progress in one transaction.
    ///
    /// `total_progress` is the owner's percentage with this completion
    /// counted.
    pub async fn record_owned_completion(
        &self,
        owner: &str,
        topic_id: &str,
        lesson_id: &str,
        score: f64,
        total_progress: u32,
    ) -> Result<DbUserProgress> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO lesson_completions (user_id, topic_id, lesson_id, score, completed_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (user_id, topic_id, lesson_id) DO UPDATE SET
                score = EXCLUDED.score,
                completed_at = NOW()
            "#,
        )
        .bind(owner)
        .bind(topic_id)
        .bind(lesson_id)
        .bind(score)
        .execute(&mut *tx)
        .await?;

        let progress = sqlx::query_as::<_, DbUserProgress>(
            r#"
            INSERT INTO user_progress (user_id, total_progress, last_accessed_topic)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                total_progress = EXCLUDED.total_progress,
                last_accessed_topic = EXCLUDED.last_accessed_topic,
                updated_at = NOW()
            RETURNING user_id, total_progress, last_accessed_topic, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(total_progress.min(100) as i32)
        .bind(topic_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(progress)
    }

    /// Delete the owner's progress record and completions
    pub async fn reset_owned_progress(&self, owner: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let completions = sqlx::query("DELETE FROM lesson_completions WHERE user_id = $1")
            .bind(owner)
            .execute(&mut *tx)
            .await?;
        let progress = sqlx::query("DELETE FROM user_progress WHERE user_id = $1")
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(completions.rows_affected() + progress.rows_affected() > 0)
    }

    // === Writing Repository ===

    /// Create a writing owned by `owner`
    pub async fn create_writing(&self, owner: &str, writing: &NewWriting) -> Result<DbWriting> {
        let created = sqlx::query_as::<_, DbWriting>(&format!(
            r#"
            INSERT INTO writings (id, firebase_uid, title, content, kind, word_count, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {WRITING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&writing.title)
        .bind(&writing.content)
        .bind(&writing.kind)
        .bind(word_count(&writing.content))
        .bind(writing.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Writings owned by `owner`, most recently updated first
    pub async fn find_owned_writings(&self, owner: &str) -> Result<Vec<DbWriting>> {
        let writings = sqlx::query_as::<_, DbWriting>(&format!(
            r#"
            SELECT {WRITING_COLUMNS}
            FROM writings
            WHERE firebase_uid = $1
            ORDER BY updated_at DESC, id
            "#
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(writings)
    }

    /// Update a writing in one statement filtered by id and owner.
    ///
    /// Returns `None` when no row matches, whether or not the id exists.
    pub async fn update_owned_writing(
        &self,
        owner: &str,
        id: Uuid,
        patch: &WritingPatch,
    ) -> Result<Option<DbWriting>> {
        let updated = sqlx::query_as::<_, DbWriting>(&format!(
            r#"
            UPDATE writings SET
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                word_count = COALESCE($5, word_count),
                kind = COALESCE($6, kind),
                status = COALESCE($7, status),
                updated_at = NOW()
            WHERE id = $1 AND firebase_uid = $2
            RETURNING {WRITING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(patch.title.as_deref())
        .bind(patch.content.as_deref())
        .bind(patch.content.as_deref().map(word_count))
        .bind(patch.kind.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Delete a writing in one statement filtered by id and owner
    pub async fn delete_owned_writing(&self, owner: &str, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM writings WHERE id = $1 AND firebase_uid = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn word_count(content: &str) -> i32 {
    i32::try_from(count_words(content)).unwrap_or(i32::MAX)
}

fn conflict_on_unique(error: sqlx::Error, topic_id: &str) -> ApiError {
    match error {
        sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
            ApiError::Conflict(format!("Topic {topic_id} already exists"))
        }
        other => ApiError::Database(other),
    }
}

//! Progress reports and completion recording.
//!
//! Loads the catalog and completion sets from the store and hands them to
//! the lesson-core aggregator.

use lesson_core::{
    compute_catalog_progress, compute_user_progress, validate_score, CatalogProgressReport,
    CompletionSet, UserProgressReport, ValidationError,
};

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::{CompleteLessonRequest, DbTopic, Topic, UserProgressResponse};

async fn load_catalog(db: &Database) -> Result<Vec<Topic>> {
    let topics = db.list_topics().await?;
    Ok(topics.iter().map(DbTopic::to_core_topic).collect())
}

/// Completion snapshot for one user
pub async fn user_report(db: &Database, user_id: &str) -> Result<UserProgressReport> {
    let catalog = load_catalog(db).await?;
    let completions = db.get_completion_set(user_id).await?;
    Ok(compute_user_progress(user_id, &catalog, &completions))
}

/// Catalog-wide completion snapshot
pub async fn catalog_report(db: &Database) -> Result<CatalogProgressReport> {
    let catalog = load_catalog(db).await?;
    let completed = db.get_completed_by_anyone().await?;
    Ok(compute_catalog_progress(&catalog, &completed))
}

/// The owner's progress record with its completion log
pub async fn owned_progress(db: &Database, owner: &str) -> Result<UserProgressResponse> {
    let progress = db.get_owned_progress(owner).await?;
    let log = db.get_user_completions(owner).await?;
    Ok(UserProgressResponse::new(owner, progress, log))
}

/// Owner's overall percentage once `(topic_id, lesson_id)` is counted
fn progress_with_completion(
    owner: &str,
    catalog: &[Topic],
    mut completions: CompletionSet,
    topic_id: &str,
    lesson_id: &str,
) -> u32 {
    completions.insert(topic_id, lesson_id);
    compute_user_progress(owner, catalog, &completions).progress_percentage
}

/// Record a lesson completion for the owner and refresh the cached total
pub async fn record_completion(
    db: &Database,
    owner: &str,
    request: &CompleteLessonRequest,
) -> Result<UserProgressResponse> {
    if request.topic_id.trim().is_empty() {
        return Err(ValidationError::Empty { field: "topicId" }.into());
    }
    if request.lesson_id.trim().is_empty() {
        return Err(ValidationError::Empty { field: "lessonId" }.into());
    }
    let score = validate_score(request.score)?;

    let topic = db
        .get_topic_by_topic_id(&request.topic_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Topic {}", request.topic_id)))?;
    if !topic.to_core_topic().has_lesson(&request.lesson_id) {
        return Err(ApiError::NotFound(format!(
            "Lesson {} in topic {}",
            request.lesson_id, request.topic_id
        )));
    }

    let catalog = load_catalog(db).await?;
    let completions = db.get_completion_set(owner).await?;
    let total_progress = progress_with_completion(
        owner,
        &catalog,
        completions,
        &request.topic_id,
        &request.lesson_id,
    );

    let progress = db
        .record_owned_completion(
            owner,
            &request.topic_id,
            &request.lesson_id,
            score,
            total_progress,
        )
        .await?;
    let log = db.get_user_completions(owner).await?;

    tracing::info!(
        uid = %owner,
        topic_id = %request.topic_id,
        lesson_id = %request.lesson_id,
        total_progress,
        "lesson completion recorded"
    );

    Ok(UserProgressResponse::new(owner, Some(progress), log))
}

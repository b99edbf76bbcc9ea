//! Topic catalog endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// Parse a topic record id; malformed ids are reported as not found.
fn parse_topic_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Topic not found".to_string()))
}

/// Validate a topic payload, warning when it declares a lesson count that
/// disagrees with its lesson list.
fn topic_from_draft(draft: TopicDraft) -> Result<Topic> {
    if let Some(declared) = draft.inconsistent_total() {
        tracing::warn!(
            declared,
            actual = draft.lessons.as_ref().map_or(0, Vec::len),
            "ignoring totalLessons that disagrees with lessons"
        );
    }
    Ok(draft.into_topic()?)
}

/// GET /api/topics
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<TopicResponse>>> {
    let topics = state.db.list_topics().await?;
    let completed = state.db.get_completed_by_anyone().await?;
    Ok(Json(
        topics.iter().map(|t| t.to_api_topic(&completed)).collect(),
    ))
}

/// GET /api/topics/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TopicResponse>> {
    let id = parse_topic_id(&id)?;
    let topic = state
        .db
        .get_topic(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;
    let completed = state.db.get_completed_by_anyone().await?;

    Ok(Json(topic.to_api_topic(&completed)))
}

/// POST /api/topics
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TopicDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<TopicResponse>)> {
    let Json(draft) = payload?;
    let topic = topic_from_draft(draft)?;

    let created = state.db.create_topic(&topic).await?;
    tracing::info!(id = %created.id, topic_id = %created.topic_id, "topic created");

    // A new topic has no completions yet.
    Ok((
        StatusCode::CREATED,
        Json(created.to_api_topic(&CompletionSet::new())),
    ))
}

/// PUT /api/topics/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<TopicDraft>, JsonRejection>,
) -> Result<Json<TopicResponse>> {
    let Json(draft) = payload?;
    let topic = topic_from_draft(draft)?;
    let id = parse_topic_id(&id)?;

    let updated = state
        .db
        .update_topic(id, &topic)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;
    tracing::info!(id = %updated.id, topic_id = %updated.topic_id, "topic updated");
    let completed = state.db.get_completed_by_anyone().await?;

    Ok(Json(updated.to_api_topic(&completed)))
}

/// DELETE /api/topics/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_topic_id(&id)?;
    if !state.db.delete_topic(id).await? {
        return Err(ApiError::NotFound("Topic not found".to_string()));
    }
    tracing::info!(id = %id, "topic deleted");

    Ok(Json(MessageResponse::new("Topic deleted successfully")))
}

//! Writing endpoints. Every query is scoped to the caller's uid.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use lesson_core::writing::{title_or_default, type_or_default};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

fn not_found() -> ApiError {
    ApiError::NotFound("Writing not found".to_string())
}

/// Parse a writing id; malformed ids look exactly like missing ones.
fn parse_writing_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/writing/save
/// Creates a writing when no id is given, otherwise updates the caller's own
pub async fn save(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: std::result::Result<Json<SaveWritingRequest>, JsonRejection>,
) -> Result<Json<SaveWritingResponse>> {
    let Json(request) = payload?;

    let writing = match non_blank(request.id) {
        Some(raw_id) => {
            let id = parse_writing_id(&raw_id)?;
            let patch = WritingPatch {
                title: non_blank(request.title),
                content: request.content,
                kind: non_blank(request.kind),
                status: request.status,
            };
            state
                .db
                .update_owned_writing(&auth.uid, id, &patch)
                .await?
                .ok_or_else(not_found)?
        }
        None => {
            let new_writing = NewWriting {
                title: title_or_default(request.title.as_deref()),
                content: request.content.unwrap_or_default(),
                kind: type_or_default(request.kind.as_deref()),
                status: request.status.unwrap_or_default(),
            };
            state.db.create_writing(&auth.uid, &new_writing).await?
        }
    };

    tracing::info!(uid = %auth.uid, id = %writing.id, word_count = writing.word_count, "writing saved");

    Ok(Json(SaveWritingResponse {
        success: true,
        message: "Saved successfully".to_string(),
        data: writing.to_api_writing(),
    }))
}

/// GET /api/writing/my-work
pub async fn my_work(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Writing>>> {
    let writings = state.db.find_owned_writings(&auth.uid).await?;
    Ok(Json(writings.iter().map(DbWriting::to_api_writing).collect()))
}

/// DELETE /api/writing/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_writing_id(&id)?;
    if !state.db.delete_owned_writing(&auth.uid, id).await? {
        return Err(not_found());
    }
    tracing::info!(uid = %auth.uid, id = %id, "writing deleted");

    Ok(Json(MessageResponse::new("Deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_id_is_not_found() {
        assert!(matches!(parse_writing_id("abc"), Err(ApiError::NotFound(_))));
        assert!(parse_writing_id(&Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("x".to_string())), Some("x".to_string()));
    }
}

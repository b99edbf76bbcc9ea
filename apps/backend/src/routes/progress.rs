//! Progress endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::progress;
use crate::AppState;

/// GET /api/topics/progress
/// Catalog-wide snapshot, lessons counted when completed by anyone
pub async fn catalog(State(state): State<AppState>) -> Result<Json<CatalogProgressReport>> {
    let report = progress::catalog_report(&state.db).await?;
    tracing::debug!(
        completed_topics = report.completed_topics,
        total_topics = report.total_topics,
        "catalog progress computed"
    );
    Ok(Json(report))
}

/// GET /api/progress/:userId
pub async fn for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProgressReport>> {
    let report = progress::user_report(&state.db, &user_id).await?;
    tracing::debug!(
        user_id = %user_id,
        completed = report.completed_lessons,
        total = report.total_lessons,
        "user progress computed"
    );
    Ok(Json(report))
}

/// GET /api/user/progress
pub async fn mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<UserProgressResponse>> {
    let response = progress::owned_progress(&state.db, &auth.uid).await?;
    Ok(Json(response))
}

/// POST /api/user/progress/complete
pub async fn complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: std::result::Result<Json<CompleteLessonRequest>, JsonRejection>,
) -> Result<Json<UserProgressResponse>> {
    let Json(request) = payload?;
    let response = progress::record_completion(&state.db, &auth.uid, &request).await?;
    Ok(Json(response))
}

/// DELETE /api/user/progress
pub async fn reset(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ResetProgressResponse>> {
    if !state.db.reset_owned_progress(&auth.uid).await? {
        return Err(ApiError::NotFound("Progress not found".to_string()));
    }
    tracing::info!(uid = %auth.uid, "progress reset");

    Ok(Json(ResetProgressResponse {
        message: "Progress reset".to_string(),
        reset: true,
    }))
}

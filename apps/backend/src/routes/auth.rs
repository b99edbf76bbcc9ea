//! Authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use serde::Serialize;

use crate::error::Result;
use crate::services::identity::{self, SubjectIdentity};
use crate::AppState;

/// Authenticated user info stored in request extensions
#[derive(Clone, Debug, Serialize)]
pub struct AuthenticatedUser {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<SubjectIdentity> for AuthenticatedUser {
    fn from(identity: SubjectIdentity) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
        }
    }
}

/// Auth middleware - verifies the bearer token before the handler runs
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let identity = identity::authenticate(
        state.verifier.as_ref(),
        header.as_deref(),
        state.auth_timeout,
    )
    .await?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(identity));

    Ok(next.run(request).await)
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: AuthenticatedUser,
}

/// POST /api/auth/verify
/// Echoes the identity the token was verified as
pub async fn verify(Extension(auth): Extension<AuthenticatedUser>) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: auth,
    })
}

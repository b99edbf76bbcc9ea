//! Bearer token verification against an external identity provider.
//!
//! The provider is reached through the [`TokenVerifier`] trait. Production
//! uses [`FirebaseTokenVerifier`], which checks Firebase ID tokens against
//! Google's published signing keys.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

/// Verified identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectIdentity {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Client-facing authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token verification timed out")]
    VerificationTimeout,
}

/// Reasons a provider rejects a token. Logged, never returned to clients.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("identity provider is not configured")]
    NotConfigured,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("no signing key with kid {0}")]
    UnknownKey(String),

    #[error("token has no subject")]
    MissingSubject,

    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),

    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(#[from] reqwest::Error),
}

/// External capability: verify a token and return the subject it names.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<SubjectIdentity, VerifyError>;
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Authenticate a request from its raw Authorization header.
///
/// The provider call is bounded by `limit`; a timeout is reported as
/// [`AuthError::VerificationTimeout`].
pub async fn authenticate(
    verifier: &dyn TokenVerifier,
    header: Option<&str>,
    limit: Duration,
) -> Result<SubjectIdentity, AuthError> {
    let token = match extract_bearer(header) {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(present = header.is_some(), "no bearer token on request");
            return Err(e);
        }
    };

    match tokio::time::timeout(limit, verifier.verify(token)).await {
        Ok(Ok(identity)) => {
            tracing::info!(uid = %identity.uid, "token verified");
            Ok(identity)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "token verification failed");
            Err(AuthError::InvalidToken)
        }
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "token verification timed out");
            Err(AuthError::VerificationTimeout)
        }
    }
}

/// Claims read from a Firebase ID token.
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    email: Option<String>,
}

/// Verifies Firebase ID tokens (RS256, keys from Google's JWK set).
pub struct FirebaseTokenVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, VerifyError> {
        let keys = self
            .http
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(keys)
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<SubjectIdentity, VerifyError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Malformed(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Malformed("missing kid".to_string()))?;

        let keys = self.fetch_keys().await?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| VerifyError::UnknownKey(kid.clone()))?;
        let key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let data = decode::<FirebaseClaims>(token, &key, &validation)?;
        if data.claims.sub.trim().is_empty() {
            return Err(VerifyError::MissingSubject);
        }

        Ok(SubjectIdentity {
            uid: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Rejects every token. Used when no identity provider is configured.
pub struct UnconfiguredVerifier;

#[async_trait]
impl TokenVerifier for UnconfiguredVerifier {
    async fn verify(&self, _token: &str) -> Result<SubjectIdentity, VerifyError> {
        Err(VerifyError::NotConfigured)
    }
}

/// Build the verifier described by the auth configuration.
pub fn verifier_from_config(config: &AuthConfig) -> Box<dyn TokenVerifier> {
    match &config.firebase_project_id {
        Some(project_id) => {
            tracing::info!(project_id = %project_id, "Firebase token verification enabled");
            Box::new(FirebaseTokenVerifier::new(
                project_id.clone(),
                config.jwks_url.clone(),
            ))
        }
        None => {
            tracing::warn!("FIREBASE_PROJECT_ID not set, all bearer tokens will be rejected");
            Box::new(UnconfiguredVerifier)
        }
    }
}

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Exchanges Basic credentials (email, password) for a signed token.
pub async fn token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let credentials = headers
        .typed_get::<Authorization<Basic>>()
        .ok_or_else(|| {
            AppError::Unauthenticated("must provide email and password in Basic auth".to_string())
        })?;

    let claims = state
        .users
        .authenticate(
            credentials.username(),
            credentials.password(),
            Utc::now(),
            state.config.auth.token_ttl(),
        )
        .await?;

    let token = state.authenticator.issue_token(&claims)?;
    tracing::info!(subject = %claims.sub, "token issued");

    Ok(Json(TokenResponse { token }))
}

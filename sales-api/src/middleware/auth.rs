use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use std::sync::Arc;

use crate::domain::models::user::Role;
use crate::domain::policy;
use crate::domain::services::auth_service::Claims;
use crate::error::AppError;
use crate::server::AppState;

/// Verifies the bearer token and stores its [`Claims`] on the request.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 从请求头获取令牌
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| {
            AppError::Unauthenticated(
                "expected authorization header format: Bearer <token>".to_string(),
            )
        })?;

    // 验证令牌
    let claims = state.authenticator.verify_token(bearer.token())?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Role gate for a single route; runs after [`authenticate`].
pub async fn require_role(
    State(role): State<Role>,
    claims: Claims,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    policy::require_role(&claims, role)?;
    Ok(next.run(request).await)
}

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::auth::CurrentUser;
use crate::services::AuthService;

/// Extension type holding the verified caller
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl From<CurrentUser> for AuthenticatedUser {
    fn from(user: CurrentUser) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            roles: user.roles,
        }
    }
}

impl From<AuthenticatedUser> for CurrentUser {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            roles: user.roles,
        }
    }
}

/// Auth middleware that validates bearer tokens and adds the caller to request extensions
pub async fn auth_middleware(
    State(auth_service): State<Arc<dyn AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Invalid authorization header format. Expected: Bearer <token>".to_string(),
            )
        })?;

    let user = auth_service.validate_token(token)?;
    tracing::debug!(user_id = %user.user_id, "Authenticated request");

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(user));

    Ok(next.run(request).await)
}

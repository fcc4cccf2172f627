use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::{IdentityProvider, TokenError, TokenSigner};
use crate::models::auth::{AuthenticationResult, CurrentUser, LoginRequest, RegisterRequest};
use crate::services::cancellable;
use crate::validation::validate_request;

pub const INVALID_CREDENTIALS: &str = "Invalid Email or password";

/// Trait defining authentication service operations
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user and sign them in
    async fn register(
        &self,
        request: RegisterRequest,
        cancel: &CancellationToken,
    ) -> Result<AuthenticationResult, AppError>;

    /// Exchange credentials for an access token
    async fn login(
        &self,
        request: LoginRequest,
        cancel: &CancellationToken,
    ) -> Result<AuthenticationResult, AppError>;

    /// Verify a bearer token and return the caller it identifies
    fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError>;
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    identity_provider: Arc<dyn IdentityProvider>,
    token_signer: Arc<dyn TokenSigner>,
}

impl AuthServiceImpl {
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        token_signer: Arc<dyn TokenSigner>,
    ) -> Self {
        Self {
            identity_provider,
            token_signer,
        }
    }

    /// Load roles and profile for a verified user and sign a token for them
    async fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        cancel: &CancellationToken,
    ) -> Result<AuthenticationResult, AppError> {
        let roles = cancellable(cancel, self.identity_provider.get_roles(user_id)).await??;
        let profile = cancellable(cancel, self.identity_provider.find_by_email(email))
            .await??
            .ok_or_else(|| {
                AppError::InvalidOperation("User not found after successful sign-in.".to_string())
            })?;

        let access_token = self
            .token_signer
            .generate_token(
                profile.user_id,
                &profile.user_name,
                profile.email.as_deref(),
                &roles,
                None,
                None,
            )
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(AuthenticationResult {
            access_token,
            expires_in_seconds: self.token_signer.access_token_minutes().saturating_mul(60),
            user_id: profile.user_id,
            email: profile.email.unwrap_or_default(),
            user_name: profile.user_name,
            roles,
        })
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(
        &self,
        request: RegisterRequest,
        cancel: &CancellationToken,
    ) -> Result<AuthenticationResult, AppError> {
        validate_request(&request)?;

        let outcome = cancellable(
            cancel,
            self.identity_provider.create_user(
                &request.email,
                request.user_name.as_deref(),
                &request.password,
            ),
        )
        .await??;

        let user_id = match outcome.user_id {
            Some(user_id) if outcome.succeeded => user_id,
            _ => {
                tracing::warn!(reasons = ?outcome.errors, "Registration rejected");
                return Err(AppError::InvalidOperation(outcome.errors.join("; ")));
            }
        };

        tracing::info!(user_id = %user_id, "User registered");

        self.issue(user_id, &request.email, cancel).await
    }

    async fn login(
        &self,
        request: LoginRequest,
        cancel: &CancellationToken,
    ) -> Result<AuthenticationResult, AppError> {
        validate_request(&request)?;

        let user_id = cancellable(
            cancel,
            self.identity_provider
                .validate_credentials(&request.email, &request.password),
        )
        .await??
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        tracing::info!(user_id = %user_id, "User signed in");

        self.issue(user_id, &request.email, cancel).await
    }

    fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError> {
        let claims = self.token_signer.verify(token).map_err(|e| match e {
            TokenError::Expired => AppError::Unauthorized("Token has expired".to_string()),
            _ => AppError::Unauthorized("Invalid or malformed token".to_string()),
        })?;

        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Unauthorized("Invalid or malformed token".to_string()))?;

        Ok(CurrentUser {
            user_id,
            name: claims.name,
            email: claims.email,
            roles: claims.role,
        })
    }
}

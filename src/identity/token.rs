use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::JwtSettings;

/// JWT claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub jti: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionClaims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid("subject is not a user id".to_string()))
    }
}

/// Token issuance and verification errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token generation failed: {0}")]
    Signing(String),
}

/// Issues and verifies signed bearer tokens
pub trait TokenSigner: Send + Sync {
    /// Sign a token for the user. Identical inputs and `issued_at` give the
    /// same token; `issued_at` defaults to now.
    fn generate_token(
        &self,
        user_id: Uuid,
        user_name: &str,
        email: Option<&str>,
        roles: &[String],
        extra_claims: Option<&Map<String, Value>>,
        issued_at: Option<DateTime<Utc>>,
    ) -> Result<String, TokenError>;

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError>;

    /// Lifetime of issued tokens, in minutes
    fn access_token_minutes(&self) -> i64;
}

/// HS256 implementation of TokenSigner
pub struct JwtTokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    access_token_minutes: i64,
}

impl JwtTokenSigner {
    pub fn new(settings: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss", "aud"]);
        validation.validate_nbf = true;

        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            access_token_minutes: settings.access_token_minutes,
        }
    }
}

/// Token id derived from the subject and the issuance instant
fn token_id(user_id: Uuid, issued_at: DateTime<Utc>) -> String {
    let seed = format!(
        "{}|{}",
        user_id,
        issued_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
        .simple()
        .to_string()
}

impl TokenSigner for JwtTokenSigner {
    fn generate_token(
        &self,
        user_id: Uuid,
        user_name: &str,
        email: Option<&str>,
        roles: &[String],
        extra_claims: Option<&Map<String, Value>>,
        issued_at: Option<DateTime<Utc>>,
    ) -> Result<String, TokenError> {
        let now = issued_at.unwrap_or_else(Utc::now);
        let expires = TimeDelta::try_minutes(self.access_token_minutes)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                TokenError::Signing(format!(
                    "token lifetime of {} minutes is out of range",
                    self.access_token_minutes
                ))
            })?;

        let claims = SessionClaims {
            sub: user_id.to_string(),
            jti: token_id(user_id, now),
            name: user_name.to_string(),
            email: email.filter(|e| !e.is_empty()).map(str::to_string),
            role: roles.to_vec(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires.timestamp(),
            extra: extra_claims.cloned().unwrap_or_default(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    fn access_token_minutes(&self) -> i64 {
        self.access_token_minutes
    }
}

//! # Authentication
//!
//! Password hashing, JWT issuance and the request middleware that resolves the
//! acting account from an `Authorization: Bearer` header.

use argon2::{
    Algorithm as ArgonAlgorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, RepositoryError, unauthorized};
use crate::models::Role;
use crate::models::account::Model as AccountModel;
use crate::repositories::AccountRepository;
use crate::server::AppState;

const TOKEN_ISSUER: &str = "lunchvote";
const TOKEN_AUDIENCE: &str = "lunchvote-api";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,
    #[error("Token is invalid or expired")]
    InvalidToken,
    #[error("Token has wrong type")]
    WrongTokenType,
    #[error("User not found")]
    UnknownAccount,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::WrongTokenType
            | AuthError::UnknownAccount => unauthorized(Some(&error.to_string())),
            AuthError::Repository(inner) => inner.into(),
            AuthError::Hashing(_) | AuthError::Encoding(_) => anyhow::Error::new(error).into(),
        }
    }
}

// Password hashing

fn argon2() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(19456, 2, 1, None).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::new(ArgonAlgorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Checks a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(phc: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    argon2()
        .map(|argon| argon.verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// Loads the account and checks its password.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password: &str,
) -> Result<AccountModel, AuthError> {
    let account = AccountRepository::new(db)
        .find(username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&account.password_hash, password) {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(account)
}

// JWT issuance and validation

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account username
    pub sub: String,
    pub token_type: TokenType,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Access and refresh token pair returned on login.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and validates HS256 tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenService {
    pub fn from_config(config: &AppConfig) -> Self {
        let secret = config.signing_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: chrono::Duration::seconds(config.access_token_ttl_seconds as i64),
            refresh_ttl: chrono::Duration::seconds(config.refresh_token_ttl_seconds as i64),
        }
    }

    fn issue(&self, username: &str, token_type: TokenType) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: username.to_string(),
            token_type,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: TOKEN_ISSUER.into(),
            aud: TOKEN_AUDIENCE.into(),
        };
        Ok(jsonwebtoken::encode(
            &JwtHeader::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn issue_access(&self, username: &str) -> Result<String, AuthError> {
        self.issue(username, TokenType::Access)
    }

    pub fn issue_pair(&self, username: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(username, TokenType::Access)?,
            refresh: self.issue(username, TokenType::Refresh)?,
        })
    }

    /// Checks signature, expiry, issuer and audience.
    pub fn decode_validated(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_issuer(&[TOKEN_ISSUER]);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Decodes a token and requires the given type.
    pub fn decode_as(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.decode_validated(token)?;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }
}

// Request identity

/// The authenticated account behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
    pub is_admin: bool,
}

impl From<&AccountModel> for Principal {
    fn from(account: &AccountModel) -> Self {
        Self {
            username: account.username.clone(),
            role: account.role(),
            is_admin: account.is_admin,
        }
    }
}

/// Who is making the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Actor {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl Actor {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(principal) => Some(principal),
        }
    }

    /// Name used in audit logs.
    pub fn label(&self) -> &str {
        self.principal()
            .map(|p| p.username.as_str())
            .unwrap_or("AnonymousUser")
    }
}

/// Resolves the [`Actor`] for every request. A missing header means an
/// anonymous actor; a header that does not carry a valid access token for an
/// existing account is rejected with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = match extract_bearer_token(request.headers())? {
        None => Actor::Anonymous,
        Some(token) => {
            let claims = state.tokens.decode_as(token, TokenType::Access)?;
            let account = AccountRepository::new(&state.db)
                .find(&claims.sub)
                .await?
                .ok_or(AuthError::UnknownAccount)?;
            tracing::debug!(username = %account.username, "Authenticated request");
            Actor::Authenticated(Principal::from(&account))
        }
    };

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let header = value
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

impl<S> FromRequestParts<S> for Actor
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Actor>().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service() -> TokenService {
        TokenService::from_config(&AppConfig::default())
    }

    #[test]
    fn password_hash_verifies_only_the_original_password() {
        let hash = hash_password("lunch-time").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "lunch-time"));
        assert!(!verify_password(&hash, "dinner-time"));
        assert!(!verify_password("not-a-phc-string", "lunch-time"));
    }

    #[test]
    fn issued_pair_decodes_with_matching_types() {
        let tokens = service();
        let pair = tokens.issue_pair("emp1").unwrap();

        let access = tokens.decode_as(&pair.access, TokenType::Access).unwrap();
        assert_eq!(access.sub, "emp1");
        assert_eq!(access.iss, TOKEN_ISSUER);

        assert!(matches!(
            tokens.decode_as(&pair.refresh, TokenType::Access),
            Err(AuthError::WrongTokenType)
        ));
        assert!(tokens.decode_as(&pair.refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let other = TokenService::from_config(&AppConfig {
            jwt_secret: Some("another-secret-that-is-long-enough-1234".to_string()),
            ..Default::default()
        });
        let token = other.issue_access("emp1").unwrap();

        assert!(matches!(
            service().decode_validated(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers).unwrap(), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn anonymous_actor_label() {
        assert_eq!(Actor::Anonymous.label(), "AnonymousUser");
        let actor = Actor::Authenticated(Principal {
            username: "emp1".into(),
            role: Role::Employee,
            is_admin: false,
        });
        assert_eq!(actor.label(), "emp1");
    }
}

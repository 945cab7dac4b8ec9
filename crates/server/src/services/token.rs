use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{db::models::Role, middleware::auth::AuthUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Access denied: no token provided")]
    MissingToken,
    #[error("Malformed authorization header")]
    MalformedToken,
    #[error("Invalid or expired token")]
    InvalidToken,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

// Verification trusts the embedded claims and never re-reads the user table:
// a role change or account removal only takes effect once older tokens expire.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, identity: &AuthUser) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            iat: now.timestamp().max(0) as usize,
            exp: (now + self.ttl).timestamp().max(0) as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        tracing::debug!(user_id = %identity.id, "token issued");
        Ok(token)
    }

    pub fn verify(&self, header: Option<&str>) -> Result<AuthUser, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedToken)?;
        self.decode_token(token)
    }

    pub fn decode_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            tracing::debug!(error = %e, "token verification failed");
            AuthError::InvalidToken
        })?;

        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
            name: data.claims.name,
            role: data.claims.role,
        })
    }
}

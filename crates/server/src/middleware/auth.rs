use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    db::models::{Role, User},
    error::AppError,
    AppState,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

// Extractor for protected handlers: verifies the Authorization header once
// per request and caches the identity in the request extensions.
#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|h| h.to_str().unwrap_or_default());

        let user = state.tokens.verify(header).map_err(|e| {
            tracing::warn!(error = %e, path = %parts.uri.path(), "rejected bearer token");
            AppError::Auth(e)
        })?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

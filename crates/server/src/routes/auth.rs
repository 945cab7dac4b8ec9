use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Role, User},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::users::{self, NewUser},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub major: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub major: Option<String>,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            major: user.major,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let Json(body) = body?;
    let name = non_empty(body.name)
        .ok_or_else(|| AppError::Validation("Name is required".to_string()))?;
    let email = non_empty(body.email)
        .filter(|e| e.contains('@'))
        .ok_or_else(|| AppError::Validation("Invalid email address".to_string()))?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;
    let major = non_empty(body.major);

    // Registration never grants admin.
    let user = users::create(
        &state.db.pool,
        NewUser {
            name: &name,
            email: &email,
            password: &password,
            major: major.as_deref(),
            role: Role::User,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            user: user.into(),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(body) = body?;
    let (Some(email), Some(password)) = (non_empty(body.email), body.password) else {
        return Err(AppError::InvalidCredentials);
    };

    let user = users::authenticate(&state.db.pool, &email, &password)
        .await
        .inspect_err(|e| {
            if matches!(e, AppError::InvalidCredentials) {
                tracing::info!(%email, "login rejected");
            }
        })?;

    let token = state
        .tokens
        .issue(&AuthUser::from(&user))
        .map_err(|e| AppError::Internal(format!("Failed to create token: {e}")))?;

    tracing::info!(user_id = %user.id, "login succeeded");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    }))
}

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::Comment,
    error::{AppError, Result},
    services::comments::{self, NewComment},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_comment))
        .route("/:project_id", get(list_comments))
}

// Ratings arrive as numbers from JSON clients and as strings from form posts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Number(i64),
    Text(String),
}

impl RatingInput {
    fn into_rating(self) -> Result<i64> {
        match self {
            RatingInput::Number(n) => Ok(n),
            RatingInput::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| AppError::Validation(format!("Invalid rating: {s}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub project_id: Option<String>,
    pub user_name: Option<String>,
    pub comment: Option<String>,
    pub rating: Option<RatingInput>,
}

#[derive(Debug, Serialize)]
pub struct CreateCommentResponse {
    pub message: String,
    pub id: String,
}

async fn list_comments(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Comment>>> {
    Ok(Json(comments::list_for(&state.db.pool, &project_id).await?))
}

async fn create_comment(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<Json<CreateCommentResponse>> {
    let Json(body) = body?;
    let rating = body.rating.map(RatingInput::into_rating).transpose()?;

    let comment = comments::add(
        &state.db.pool,
        NewComment {
            project_id: body.project_id,
            user_name: body.user_name,
            comment: body.comment,
            rating,
        },
    )
    .await?;

    Ok(Json(CreateCommentResponse {
        message: "Comment posted".to_string(),
        id: comment.id,
    }))
}

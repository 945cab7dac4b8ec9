use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Project, ProjectWithAuthor},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::{
        projects::{self, Submission},
        storage::Upload,
    },
    AppState,
};

const FILE_FIELD: &str = "karyaFile";

pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/my-projects", get(my_projects))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:id/status", patch(update_status))
        .layer(DefaultBodyLimit::max(body_limit))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload exceeds the size limit".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read form data: {}", e.body_text()))
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(multipart_error)?;
            // Browsers send an empty part when no file was chosen
            if data.is_empty() {
                continue;
            }
            submission.file = Some(Upload {
                file_name,
                content_type,
                data,
            });
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        let fields = &mut submission.fields;
        match name.as_str() {
            "title" => fields.title = Some(value),
            "description" => fields.description = Some(value),
            "nama_ketua" => fields.nama_ketua = Some(value),
            "nim_ketua" => fields.nim_ketua = Some(value),
            "prodi" => fields.prodi = Some(value),
            "youtube_link" => submission.youtube_link = Some(value),
            other => tracing::debug!(field = %other, "ignoring unknown form field"),
        }
    }

    Ok(submission)
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectWithAuthor>>> {
    Ok(Json(projects::list_all(&state.db.pool).await?))
}

async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Project>)> {
    let submission = read_submission(multipart?).await?;
    let project = projects::create(&state.db.pool, &state.storage, &user, submission).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn my_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Project>>> {
    Ok(Json(projects::list_mine(&state.db.pool, &user).await?))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectWithAuthor>> {
    Ok(Json(projects::get_one(&state.db.pool, &id).await?))
}

async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Project>> {
    let submission = read_submission(multipart?).await?;
    let project =
        projects::update_content(&state.db.pool, &state.storage, &user, &id, submission).await?;
    Ok(Json(project))
}

async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Project>> {
    let Json(body) = body?;
    let status = body.status.unwrap_or_default();
    let project = projects::update_status(&state.db.pool, &user, &id, status.trim()).await?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    projects::delete(&state.db.pool, &state.storage, &user, &id).await?;
    Ok(Json(MessageResponse {
        message: "Project deleted".to_string(),
    }))
}

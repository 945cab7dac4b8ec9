// Project repository: persistence plus the moderation lifecycle

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::{
        models::{KaryaType, Project, ProjectStatus, ProjectWithAuthor},
        now_timestamp,
    },
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::{
        policy,
        storage::{AttachmentStore, Upload},
    },
};

const PROJECT_COLUMNS: &str = "id, title, description, nama_ketua, nim_ketua, prodi, \
     karya_type, karya_url, status, user_id, created_at, updated_at";

const PROJECT_WITH_AUTHOR: &str = "SELECT p.id, p.title, p.description, p.nama_ketua, \
     p.nim_ketua, p.prodi, p.karya_type, p.karya_url, p.status, p.user_id, p.created_at, \
     p.updated_at, u.name AS author_name, u.major AS author_major \
     FROM projects p JOIN users u ON p.user_id = u.id";

#[derive(Debug, Clone, Default)]
pub struct ProjectFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub nama_ketua: Option<String>,
    pub nim_ketua: Option<String>,
    pub prodi: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Karya {
    File(Upload),
    Link(String),
}

#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: ProjectFields,
    pub file: Option<Upload>,
    pub youtube_link: Option<String>,
}

impl Submission {
    pub fn into_parts(self) -> Result<(ProjectFields, Option<Karya>)> {
        let link = self
            .youtube_link
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        let karya = match (self.file, link) {
            (Some(_), Some(_)) => {
                return Err(AppError::InvalidSubmission(
                    "Provide either a file or a YouTube link, not both".to_string(),
                ))
            }
            (Some(file), None) => Some(Karya::File(file)),
            (None, Some(link)) => Some(Karya::Link(link)),
            (None, None) => None,
        };
        Ok((self.fields, karya))
    }
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(project)
}

async fn find_existing(pool: &SqlitePool, id: &str) -> Result<Project> {
    find(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ProjectWithAuthor>> {
    let projects = sqlx::query_as::<_, ProjectWithAuthor>(&format!(
        "{PROJECT_WITH_AUTHOR} ORDER BY p.created_at DESC, p.rowid DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(projects)
}

pub async fn list_mine(pool: &SqlitePool, user: &AuthUser) -> Result<Vec<Project>> {
    policy::authorize_list_mine(user)?;

    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ? ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(&user.id)
    .fetch_all(pool)
    .await?;
    Ok(projects)
}

pub async fn get_one(pool: &SqlitePool, id: &str) -> Result<ProjectWithAuthor> {
    sqlx::query_as::<_, ProjectWithAuthor>(&format!("{PROJECT_WITH_AUTHOR} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

pub async fn create(
    pool: &SqlitePool,
    store: &AttachmentStore,
    user: &AuthUser,
    submission: Submission,
) -> Result<Project> {
    policy::authorize_create(user)?;

    let (fields, karya) = submission.into_parts()?;
    let karya = karya.ok_or_else(|| {
        AppError::InvalidSubmission("A file or YouTube link is required".to_string())
    })?;
    let title = fields
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;

    let (karya_type, karya_url) = match karya {
        Karya::File(upload) => {
            let stored = store.store(&upload).await?;
            (stored.karya_type, stored.relative_path)
        }
        Karya::Link(link) => (KaryaType::Youtube, link),
    };

    let now = now_timestamp();
    let project = Project {
        id: Uuid::new_v4().to_string(),
        title,
        description: fields.description.unwrap_or_default(),
        nama_ketua: fields.nama_ketua.unwrap_or_default(),
        nim_ketua: fields.nim_ketua.unwrap_or_default(),
        prodi: fields.prodi.unwrap_or_default(),
        karya_type,
        karya_url,
        status: ProjectStatus::Pending,
        user_id: user.id.clone(),
        created_at: now.clone(),
        updated_at: now,
    };

    let inserted = sqlx::query(&format!(
        "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&project.id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.nama_ketua)
    .bind(&project.nim_ketua)
    .bind(&project.prodi)
    .bind(project.karya_type)
    .bind(&project.karya_url)
    .bind(project.status)
    .bind(&project.user_id)
    .bind(&project.created_at)
    .bind(&project.updated_at)
    .execute(pool)
    .await;

    if let Err(e) = inserted {
        if let Some(path) = project.stored_file() {
            store.remove_quietly(path).await;
        }
        return Err(e.into());
    }

    tracing::info!(project_id = %project.id, user_id = %user.id, karya_type = ?project.karya_type, "project created");
    Ok(project)
}

// Absent fields keep their current value
pub async fn update_content(
    pool: &SqlitePool,
    store: &AttachmentStore,
    user: &AuthUser,
    id: &str,
    submission: Submission,
) -> Result<Project> {
    let current = find_existing(pool, id).await?;
    policy::authorize_edit(user, &current)?;
    write_content(pool, store, user, &current, submission).await
}

// Applies an edit checked against `current`. The write only lands while the row is still PENDING.
async fn write_content(
    pool: &SqlitePool,
    store: &AttachmentStore,
    user: &AuthUser,
    current: &Project,
    submission: Submission,
) -> Result<Project> {
    let id = current.id.as_str();
    let (fields, karya) = submission.into_parts()?;
    let title = match fields.title.map(|t| t.trim().to_string()) {
        Some(t) if t.is_empty() => {
            return Err(AppError::Validation("Title cannot be empty".to_string()))
        }
        Some(t) => t,
        None => current.title.clone(),
    };

    let (karya_type, karya_url) = match karya {
        Some(Karya::File(upload)) => {
            let stored = store.store(&upload).await?;
            (stored.karya_type, stored.relative_path)
        }
        Some(Karya::Link(link)) => (KaryaType::Youtube, link),
        None => (current.karya_type, current.karya_url.clone()),
    };
    let replaced_file = karya_url != current.karya_url;

    let updated = sqlx::query(
        r#"
        UPDATE projects
        SET title = ?, description = ?, nama_ketua = ?, nim_ketua = ?, prodi = ?,
            karya_type = ?, karya_url = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(&title)
    .bind(fields.description.as_ref().unwrap_or(&current.description))
    .bind(fields.nama_ketua.as_ref().unwrap_or(&current.nama_ketua))
    .bind(fields.nim_ketua.as_ref().unwrap_or(&current.nim_ketua))
    .bind(fields.prodi.as_ref().unwrap_or(&current.prodi))
    .bind(karya_type)
    .bind(&karya_url)
    .bind(now_timestamp())
    .bind(id)
    .bind(ProjectStatus::Pending)
    .execute(pool)
    .await;

    let rows = match updated {
        Ok(result) => result.rows_affected(),
        Err(e) => {
            discard_new_file(store, karya_type, &karya_url, replaced_file).await;
            return Err(e.into());
        }
    };

    if rows == 0 {
        // Approved or removed between the read and the write
        discard_new_file(store, karya_type, &karya_url, replaced_file).await;
        return Err(AppError::InvalidState(
            "Only PENDING projects can be edited".to_string(),
        ));
    }

    // Row first, then the old file: a crash here leaves an orphan file, never a dangling URL.
    if replaced_file {
        if let Some(old) = current.stored_file() {
            store.remove_quietly(old).await;
        }
    }

    tracing::info!(project_id = %id, user_id = %user.id, "project content updated");
    find_existing(pool, id).await
}

// Drops a file written for an update that never reached the database.
async fn discard_new_file(
    store: &AttachmentStore,
    karya_type: KaryaType,
    karya_url: &str,
    replaced_file: bool,
) {
    if replaced_file && karya_type.is_stored_file() {
        store.remove_quietly(karya_url).await;
    }
}

pub async fn update_status(
    pool: &SqlitePool,
    user: &AuthUser,
    id: &str,
    status: &str,
) -> Result<Project> {
    policy::authorize_status_change(user)?;
    let status: ProjectStatus = status.parse().map_err(AppError::Validation)?;

    let result = sqlx::query("UPDATE projects SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now_timestamp())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = %id, admin_id = %user.id, %status, "project status changed");
    find_existing(pool, id).await
}

pub async fn delete(
    pool: &SqlitePool,
    store: &AttachmentStore,
    user: &AuthUser,
    id: &str,
) -> Result<()> {
    let project = find_existing(pool, id).await?;
    policy::authorize_delete(user, &project)?;

    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if let Some(path) = project.stored_file() {
        store.remove_quietly(path).await;
    }

    tracing::info!(project_id = %id, user_id = %user.id, "project deleted");
    Ok(())
}

// Comment feed: append-only, unauthenticated

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::{models::Comment, now_timestamp},
    error::{AppError, Result},
};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub project_id: Option<String>,
    pub user_name: Option<String>,
    pub comment: Option<String>,
    pub rating: Option<i64>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidSubmission(format!("{field} is required")))
}

pub async fn add(pool: &SqlitePool, new: NewComment) -> Result<Comment> {
    let project_id = required(new.project_id, "project_id")?;
    let user_name = required(new.user_name, "user_name")?;
    let body = required(new.comment, "comment")?;
    let rating = new
        .rating
        .ok_or_else(|| AppError::InvalidSubmission("rating is required".to_string()))?;

    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::Validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE id = ?")
        .bind(&project_id)
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        project_id,
        user_name,
        comment: body,
        rating,
        created_at: now_timestamp(),
    };

    sqlx::query(
        "INSERT INTO comments (id, project_id, user_name, comment, rating, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&comment.id)
    .bind(&comment.project_id)
    .bind(&comment.user_name)
    .bind(&comment.comment)
    .bind(comment.rating)
    .bind(&comment.created_at)
    .execute(pool)
    .await?;

    tracing::info!(comment_id = %comment.id, project_id = %comment.project_id, rating, "comment added");
    Ok(comment)
}

pub async fn list_for(pool: &SqlitePool, project_id: &str) -> Result<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, project_id, user_name, comment, rating, created_at
        FROM comments
        WHERE project_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn seed_project(pool: &SqlitePool, id: &str) {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, created_at) VALUES ('u1', 'A', 'a@example.com', 'x', 'user', '2025-01-01T00:00:00.000000Z')",
        )
        .execute(pool)
        .await
        .ok();
        sqlx::query(
            "INSERT INTO projects (id, title, karya_type, karya_url, user_id, created_at, updated_at) VALUES (?, 'T', 'YOUTUBE', 'https://youtu.be/x', 'u1', '2025-01-01T00:00:00.000000Z', '2025-01-01T00:00:00.000000Z')",
        )
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    }

    fn comment(project_id: &str, text: &str, rating: i64) -> NewComment {
        NewComment {
            project_id: Some(project_id.into()),
            user_name: Some("Guest".into()),
            comment: Some(text.into()),
            rating: Some(rating),
        }
    }

    #[tokio::test]
    async fn newest_comment_is_listed_first() {
        let db = Database::in_memory().await;
        seed_project(&db.pool, "p1").await;
        seed_project(&db.pool, "p2").await;

        add(&db.pool, comment("p1", "first", 3)).await.unwrap();
        add(&db.pool, comment("p1", "second", 4)).await.unwrap();
        add(&db.pool, comment("p2", "elsewhere", 2)).await.unwrap();
        let latest = add(&db.pool, comment("p1", "great work", 5)).await.unwrap();

        let listed = list_for(&db.pool, "p1").await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, latest.id);
        assert_eq!(listed[0].rating, 5);
        assert_eq!(listed[2].comment, "first");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let db = Database::in_memory().await;
        seed_project(&db.pool, "p1").await;

        let mut no_name = comment("p1", "hi", 4);
        no_name.user_name = Some("  ".into());
        assert!(matches!(
            add(&db.pool, no_name).await,
            Err(AppError::InvalidSubmission(_))
        ));

        let mut no_rating = comment("p1", "hi", 4);
        no_rating.rating = None;
        assert!(matches!(
            add(&db.pool, no_rating).await,
            Err(AppError::InvalidSubmission(_))
        ));

        assert!(matches!(
            add(&db.pool, NewComment::default()).await,
            Err(AppError::InvalidSubmission(_))
        ));
        assert!(matches!(
            add(&db.pool, comment("p1", "hi", 6)).await,
            Err(AppError::Validation(_))
        ));
        assert!(list_for(&db.pool, "p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let db = Database::in_memory().await;
        assert!(matches!(
            add(&db.pool, comment("nope", "hi", 3)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn comments_follow_project_takedown() {
        let db = Database::in_memory().await;
        seed_project(&db.pool, "p1").await;
        add(&db.pool, comment("p1", "hi", 3)).await.unwrap();

        sqlx::query("DELETE FROM projects WHERE id = 'p1'")
            .execute(&db.pool)
            .await
            .unwrap();
        assert!(list_for(&db.pool, "p1").await.unwrap().is_empty());
    }
}

// Credential store

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::{
        models::{Role, User},
        now_timestamp,
    },
    error::{AppError, Result},
};

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub major: Option<&'a str>,
    pub role: Role,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, major, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn create(pool: &SqlitePool, new: NewUser<'_>) -> Result<User> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(new.email)
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: new.name.to_string(),
        email: new.email.to_string(),
        password_hash: hash_password(new.password)?,
        role: new.role,
        major: new.major.map(str::to_string),
        created_at: now_timestamp(),
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, major, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.major)
    .bind(&user.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        // Lost a race against a concurrent registration
        let duplicate = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if duplicate {
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!(user_id = %user.id, role = ?user.role, "user created");
    Ok(user)
}

pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<User> {
    let user = find_by_email(pool, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

pub async fn ensure_admin(pool: &SqlitePool, name: &str, email: &str, password: &str) -> Result<()> {
    if find_by_email(pool, email).await?.is_some() {
        return Ok(());
    }
    create(
        pool,
        NewUser {
            name,
            email,
            password,
            major: None,
            role: Role::Admin,
        },
    )
    .await?;
    tracing::info!(%email, "seeded admin account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn student<'a>(email: &'a str) -> NewUser<'a> {
        NewUser {
            name: "Alice",
            email,
            password: "hunter22",
            major: Some("Informatika"),
            role: Role::User,
        }
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        assert!(verify_password("anything", "not-a-valid-hash").is_err());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_new_row() {
        let db = Database::in_memory().await;
        create(&db.pool, student("a@example.com")).await.unwrap();

        let err = create(&db.pool, student("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let db = Database::in_memory().await;
        let created = create(&db.pool, student("a@example.com")).await.unwrap();
        assert_ne!(created.password_hash, "hunter22");

        let user = authenticate(&db.pool, "a@example.com", "hunter22").await.unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(user.role, Role::User);

        assert!(matches!(
            authenticate(&db.pool, "a@example.com", "nope").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&db.pool, "missing@example.com", "hunter22").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let db = Database::in_memory().await;
        ensure_admin(&db.pool, "Admin", "admin@example.com", "s3cret").await.unwrap();
        ensure_admin(&db.pool, "Admin", "admin@example.com", "s3cret").await.unwrap();

        let admin = find_by_email(&db.pool, "admin@example.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, role, first_name, last_name, created_at, updated_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. Registration always creates
    /// the `user` role; admins only come from the bootstrap step.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

/// Seeds a single administrator when none exists yet.
pub async fn ensure_admin(db: &PgPool, email: &str, password: &str) -> anyhow::Result<()> {
    let (admin_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(db)
            .await?;
    if admin_count > 0 {
        return Ok(());
    }

    let hash = hash_password(password)?;
    sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, role, first_name, last_name)
        VALUES ($1, $2, 'admin', 'System', 'Administrator')
        "#,
    )
    .bind(email)
    .bind(hash)
    .execute(db)
    .await?;

    info!(email = %email, "default admin user created");
    Ok(())
}

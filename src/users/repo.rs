use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, ProfileUpdate, User};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, bio, artist_type, profile_picture, views, created_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Inserts the user; `None` when the email is already registered.
    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> anyhow::Result<Option<User>>;
    /// Adds one view in place and returns the new count.
    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>>;
    /// Newest first. `limit: None` returns every remaining row.
    async fn list(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<User>>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        // The unique index on email settles races between concurrent signups.
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, bio, artist_type, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.bio)
        .bind(&user.artist_type)
        .bind(&user.profile_picture)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(created)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                bio = CASE WHEN $3 THEN $4 ELSE bio END,
                artist_type = CASE WHEN $5 THEN $6 ELSE artist_type END,
                profile_picture = CASE WHEN $7 THEN $8 ELSE profile_picture END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.bio.is_some())
        .bind(update.bio.flatten())
        .bind(update.artist_type.is_some())
        .bind(update.artist_type.flatten())
        .bind(update.profile_picture.is_some())
        .bind(update.profile_picture.flatten())
        .fetch_optional(&self.db)
        .await
        .context("update user profile")?;
        Ok(user)
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let views = sqlx::query_scalar::<_, i64>(
            "UPDATE users SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("increment user views")?;
        Ok(views)
    }

    async fn list(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Category, Image, ImageUpdate, NewImage};

const IMAGE_COLUMNS: &str = "id, user_id, artist_name, title, price, description, category, \
                             image_source, image_ref, views, created_at";

#[async_trait]
pub trait ImageRepo: Send + Sync {
    async fn create(&self, image: NewImage) -> anyhow::Result<Image>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Image>>;
    async fn list_by_owner(
        &self,
        owner: Uuid,
        category: Option<Category>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Image>>;
    /// Updates only when `owner` owns the row.
    async fn update(&self, id: Uuid, owner: Uuid, update: ImageUpdate) -> anyhow::Result<Option<Image>>;
    /// Deletes only when `owner` owns the row; returns the deleted record.
    async fn delete(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Image>>;
    /// Adds one view in place and returns the new count.
    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>>;
    async fn views(&self, id: Uuid) -> anyhow::Result<Option<i64>>;
}

#[derive(Clone)]
pub struct PgImageRepo {
    db: PgPool,
}

impl PgImageRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImageRepo for PgImageRepo {
    async fn create(&self, image: NewImage) -> anyhow::Result<Image> {
        let row = sqlx::query_as::<_, Image>(&format!(
            r#"
            INSERT INTO images (id, user_id, artist_name, title, price, description,
                                category, image_source, image_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {IMAGE_COLUMNS}
            "#
        ))
        .bind(image.id)
        .bind(image.user_id)
        .bind(&image.artist_name)
        .bind(&image.title)
        .bind(image.price)
        .bind(&image.description)
        .bind(image.category.as_str())
        .bind(image.image_source.as_str())
        .bind(&image.image_ref)
        .fetch_one(&self.db)
        .await
        .context("insert image")?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Image>> {
        let row = sqlx::query_as::<_, Image>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find image by id")?;
        Ok(row)
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        category: Option<Category>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Image>> {
        let rows = sqlx::query_as::<_, Image>(&format!(
            r#"
            SELECT {IMAGE_COLUMNS}
              FROM images
             WHERE user_id = $1
               AND ($2::TEXT IS NULL OR category = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner)
        .bind(category.map(Category::as_str))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list images by owner")?;
        Ok(rows)
    }

    async fn update(&self, id: Uuid, owner: Uuid, update: ImageUpdate) -> anyhow::Result<Option<Image>> {
        let row = sqlx::query_as::<_, Image>(&format!(
            r#"
            UPDATE images SET
                artist_name  = COALESCE($3, artist_name),
                title        = COALESCE($4, title),
                price        = COALESCE($5, price),
                description  = COALESCE($6, description),
                category     = COALESCE($7, category),
                image_source = CASE WHEN $8::TEXT IS NULL THEN image_source ELSE 'link' END,
                image_ref    = COALESCE($8, image_ref)
            WHERE id = $1 AND user_id = $2
            RETURNING {IMAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(update.artist_name)
        .bind(update.title)
        .bind(update.price)
        .bind(update.description)
        .bind(update.category.map(Category::as_str))
        .bind(update.image_link)
        .fetch_optional(&self.db)
        .await
        .context("update image")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Image>> {
        let row = sqlx::query_as::<_, Image>(&format!(
            "DELETE FROM images WHERE id = $1 AND user_id = $2 RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await
        .context("delete image")?;
        Ok(row)
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let views = sqlx::query_scalar::<_, i64>(
            "UPDATE images SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("increment image views")?;
        Ok(views)
    }

    async fn views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let views = sqlx::query_scalar::<_, i64>("SELECT views FROM images WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("get image views")?;
        Ok(views)
    }
}

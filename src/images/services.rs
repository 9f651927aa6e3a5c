use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use super::{
    dto::ImageResponse,
    repo_types::{Image, ImageSource},
};
use crate::{
    error::{AppError, AppResult, FieldError},
    state::AppState,
    storage::StorageClient,
};

/// Lifetime of URLs handed out for uploaded objects.
const PRESIGN_TTL_SECS: u64 = 30 * 60;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

pub(crate) fn object_key(user_id: Uuid, image_id: Uuid, ext: &str) -> String {
    format!("images/{}/{}.{}", user_id, image_id, ext)
}

/// Rejects a link that does not answer right now. Checked once, at write time.
pub async fn ensure_reachable(state: &AppState, link: &Url) -> AppResult<()> {
    if state.links.is_reachable(link).await {
        Ok(())
    } else {
        debug!(%link, "image link unreachable");
        Err(AppError::validation(vec![FieldError::new(
            "imageLink",
            "imageLink is not reachable",
        )]))
    }
}

/// Stores the upload and returns its object key.
pub async fn store_upload(
    storage: &dyn StorageClient,
    user_id: Uuid,
    image_id: Uuid,
    item: UploadItem,
) -> anyhow::Result<String> {
    let ext = ext_from_mime(&item.content_type).unwrap_or("bin");
    let key = object_key(user_id, image_id, ext);
    storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

/// Removes the stored object behind an uploaded image. Failures are logged only.
pub async fn discard_object(state: &AppState, source: ImageSource, image_ref: &str) {
    if source != ImageSource::Upload {
        return;
    }
    let Some(storage) = &state.storage else {
        warn!(key = %image_ref, "object storage not configured; object left behind");
        return;
    };
    if let Err(e) = storage.delete_object(image_ref).await {
        warn!(error = ?e, key = %image_ref, "failed to delete stored object");
    }
}

/// Client-facing URL for an image: the link itself, or a presigned URL.
pub async fn image_url(state: &AppState, image: &Image) -> Option<String> {
    match image.image_source {
        ImageSource::Link => Some(image.image_ref.clone()),
        ImageSource::Upload => {
            let storage = state.storage.as_ref()?;
            match storage.presign_get(&image.image_ref, PRESIGN_TTL_SECS).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(error = ?e, image_id = %image.id, "presign failed");
                    None
                }
            }
        }
    }
}

pub async fn to_response(state: &AppState, image: Image) -> ImageResponse {
    let url = image_url(state, &image).await;
    ImageResponse::new(image, url)
}

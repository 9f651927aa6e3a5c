use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        parse_category, CreateImageRequest, ImageResponse, ListImagesQuery, ListingFields,
        RawListing, UpdateImageRequest, ViewsResponse,
    },
    repo_types::{ImageSource, NewImage},
    services::{discard_object, ensure_reachable, ext_from_mime, store_upload, to_response, UploadItem},
};
use crate::{
    auth::{owned_or_not_found, AuthUser},
    error::{ApiMessage, ApiResponse, AppError, AppResult, FieldError},
    extract::{JsonBody, Page, QueryParams},
    state::AppState,
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024; // 20MB
const DEFAULT_PAGE_SIZE: i64 = 20;

pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/images", get(list_images).post(create_image))
        .route(
            "/images/upload",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/images/:id",
            get(get_image).put(update_image).delete(delete_image),
        )
        .route("/images/:id/views", get(get_views).patch(increment_views))
}

/// Unparseable ids are reported like unknown ones.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Image"))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<CreateImageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ImageResponse>>)> {
    let (fields, link) = payload.validate().map_err(AppError::validation)?;
    ensure_reachable(&state, &link).await?;

    let image = state
        .images
        .create(new_image(user.id, Uuid::new_v4(), fields, ImageSource::Link, link.to_string()))
        .await?;

    info!(image_id = %image.id, "image listing created");
    Ok((StatusCode::CREATED, ApiResponse::ok(to_response(&state, image).await)))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<ImageResponse>>)> {
    let Some(storage) = state.storage.clone() else {
        return Err(AppError::Unavailable("Image uploads are not enabled"));
    };
    let mut mp = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut raw = RawListing::default();
    let mut file: Option<UploadItem> = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            file = Some(UploadItem { body, content_type });
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "artistName" => raw.artist_name = Some(text),
            "name" => raw.name = Some(text),
            "price" => raw.price = Some(Value::String(text)),
            "description" => raw.description = Some(text),
            "category" => raw.category = Some(text),
            other => warn!(field = %other, "ignoring unknown multipart field"),
        }
    }

    let mut errors = Vec::new();
    let fields = raw.validate(&mut errors);
    match &file {
        None => errors.push(FieldError::new("file", "file is required")),
        Some(f) if f.body.is_empty() => errors.push(FieldError::new("file", "file is empty")),
        Some(f) if ext_from_mime(&f.content_type).is_none() => errors.push(FieldError::new(
            "file",
            "file must be a jpeg, png, webp, heic or gif image",
        )),
        Some(_) => {}
    }
    let (Some(fields), Some(file), true) = (fields, file, errors.is_empty()) else {
        return Err(AppError::validation(errors));
    };

    let image_id = Uuid::new_v4();
    let key = store_upload(storage.as_ref(), user.id, image_id, file).await?;
    let created = state
        .images
        .create(new_image(user.id, image_id, fields, ImageSource::Upload, key.clone()))
        .await;
    let image = match created {
        Ok(image) => image,
        Err(e) => {
            discard_object(&state, ImageSource::Upload, &key).await;
            return Err(e.into());
        }
    };

    info!(image_id = %image.id, "image uploaded");
    Ok((StatusCode::CREATED, ApiResponse::ok(to_response(&state, image).await)))
}

fn new_image(
    user_id: Uuid,
    id: Uuid,
    fields: ListingFields,
    image_source: ImageSource,
    image_ref: String,
) -> NewImage {
    NewImage {
        id,
        user_id,
        artist_name: fields.artist_name,
        title: fields.title,
        price: fields.price,
        description: fields.description,
        category: fields.category,
        image_source,
        image_ref,
    }
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_images(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    QueryParams(q): QueryParams<ListImagesQuery>,
) -> AppResult<Json<ApiResponse<Vec<ImageResponse>>>> {
    let category = match q.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse_category(raw)
                .map_err(|msg| AppError::validation(vec![FieldError::new("category", msg)]))?,
        ),
    };
    let page = Page {
        limit: q.limit,
        offset: q.offset,
    };
    let (limit, offset) = (page.limit_or(DEFAULT_PAGE_SIZE), page.offset());

    let images = state
        .images
        .list_by_owner(user.id, category, limit, offset)
        .await?;
    let mut out = Vec::with_capacity(images.len());
    for image in images {
        out.push(to_response(&state, image).await);
    }
    Ok(ApiResponse::ok(out))
}

#[instrument(skip_all, fields(user_id = %user.id, image_id = %id))]
pub async fn get_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ImageResponse>>> {
    let id = parse_id(&id)?;
    let image = owned_or_not_found(state.images.find_by_id(id).await?, user.id, "Image")?;
    Ok(ApiResponse::ok(to_response(&state, image).await))
}

#[instrument(skip_all, fields(user_id = %user.id, image_id = %id))]
pub async fn update_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateImageRequest>,
) -> AppResult<Json<ApiResponse<ImageResponse>>> {
    let id = parse_id(&id)?;
    let (update, link) = payload.validate().map_err(AppError::validation)?;
    if update.is_empty() {
        return Err(AppError::BadRequest("No updatable fields provided".into()));
    }

    let current = owned_or_not_found(state.images.find_by_id(id).await?, user.id, "Image")?;
    if let Some(link) = &link {
        ensure_reachable(&state, link).await?;
    }

    let updated = state
        .images
        .update(id, user.id, update)
        .await?
        .ok_or(AppError::NotFound("Image"))?;

    if link.is_some() {
        discard_object(&state, current.image_source, &current.image_ref).await;
    }
    info!("image listing updated");
    Ok(ApiResponse::ok(to_response(&state, updated).await))
}

#[instrument(skip_all, fields(user_id = %user.id, image_id = %id))]
pub async fn delete_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiMessage>> {
    let id = parse_id(&id)?;
    let deleted = state
        .images
        .delete(id, user.id)
        .await?
        .ok_or(AppError::NotFound("Image"))?;
    discard_object(&state, deleted.image_source, &deleted.image_ref).await;
    info!("image listing deleted");
    Ok(ApiMessage::ok("Image deleted"))
}

#[instrument(skip_all, fields(image_id = %id))]
pub async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ViewsResponse>>> {
    let id = parse_id(&id)?;
    let views = state
        .images
        .increment_views(id)
        .await?
        .ok_or(AppError::NotFound("Image"))?;
    Ok(ApiResponse::ok(ViewsResponse { views }))
}

#[instrument(skip_all, fields(image_id = %id))]
pub async fn get_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ViewsResponse>>> {
    let id = parse_id(&id)?;
    let views = state
        .images
        .views(id)
        .await?
        .ok_or(AppError::NotFound("Image"))?;
    Ok(ApiResponse::ok(ViewsResponse { views }))
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use super::repo_types::{Category, Image, ImageSource, ImageUpdate};
use crate::{error::FieldError, links::parse_http_url};

const MAX_TEXT_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5000;

/// Request body for a listing that points at an external image.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageRequest {
    pub artist_name: Option<String>,
    pub name: Option<String>,
    pub price: Option<Value>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_link: Option<String>,
}

/// Listing fields shared by link and upload creation, after validation.
#[derive(Debug, Clone)]
pub struct ListingFields {
    pub artist_name: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: Category,
}

/// Raw listing fields, whatever transport they arrived on.
#[derive(Debug, Default)]
pub struct RawListing {
    pub artist_name: Option<String>,
    pub name: Option<String>,
    pub price: Option<Value>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl RawListing {
    pub fn validate(self, errors: &mut Vec<FieldError>) -> Option<ListingFields> {
        let artist_name = required_text("artistName", self.artist_name, MAX_TEXT_LEN, errors);
        let title = required_text("name", self.name, MAX_TEXT_LEN, errors);
        let price = match self.price {
            None | Some(Value::Null) => {
                errors.push(FieldError::new("price", "price is required"));
                None
            }
            Some(v) => record(errors, "price", parse_price(&v)),
        };
        let description =
            required_text("description", self.description, MAX_DESCRIPTION_LEN, errors);
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::new("category", "category is required"));
                None
            }
            Some(raw) => record(errors, "category", parse_category(raw)),
        };
        Some(ListingFields {
            artist_name: artist_name?,
            title: title?,
            price: price?,
            description: description?,
            category: category?,
        })
    }
}

impl CreateImageRequest {
    /// Validates every field; the link is checked for syntax only.
    pub fn validate(self) -> Result<(ListingFields, Url), Vec<FieldError>> {
        let mut errors = Vec::new();
        let raw = RawListing {
            artist_name: self.artist_name,
            name: self.name,
            price: self.price,
            description: self.description,
            category: self.category,
        };
        let fields = raw.validate(&mut errors);
        let link = match self.image_link.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::new("imageLink", "imageLink is required"));
                None
            }
            Some(raw) => record(&mut errors, "imageLink", parse_link(raw)),
        };
        match (fields, link) {
            (Some(fields), Some(link)) if errors.is_empty() => Ok((fields, link)),
            _ => Err(errors),
        }
    }
}

/// Allow-listed listing update; any other field is rejected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateImageRequest {
    pub artist_name: Option<String>,
    pub name: Option<String>,
    pub price: Option<Value>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_link: Option<String>,
}

impl UpdateImageRequest {
    /// Returns the update plus the new link, if one was supplied and is well-formed.
    pub fn validate(self) -> Result<(ImageUpdate, Option<Url>), Vec<FieldError>> {
        let mut errors = Vec::new();
        let artist_name = self
            .artist_name
            .and_then(|v| required_text("artistName", Some(v), MAX_TEXT_LEN, &mut errors));
        let title = self
            .name
            .and_then(|v| required_text("name", Some(v), MAX_TEXT_LEN, &mut errors));
        let price = self
            .price
            .and_then(|v| record(&mut errors, "price", parse_price(&v)));
        let description = self.description.and_then(|v| {
            required_text("description", Some(v), MAX_DESCRIPTION_LEN, &mut errors)
        });
        let category = self
            .category
            .and_then(|v| record(&mut errors, "category", parse_category(&v)));
        let link = self
            .image_link
            .and_then(|v| record(&mut errors, "imageLink", parse_link(&v)));

        if !errors.is_empty() {
            return Err(errors);
        }
        let update = ImageUpdate {
            artist_name,
            title,
            price,
            description,
            category,
            image_link: link.as_ref().map(|u| u.to_string()),
        };
        Ok((update, link))
    }
}

fn record<T>(errors: &mut Vec<FieldError>, field: &'static str, res: Result<T, String>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(msg) => {
            errors.push(FieldError::new(field, msg));
            None
        }
    }
}

fn required_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
        None
    } else if value.chars().count() > max {
        errors.push(FieldError::new(field, format!("{field} must be at most {max} characters")));
        None
    } else {
        Some(value)
    }
}

/// Accepts a JSON number or a numeric string; must be finite and strictly positive.
pub fn parse_price(value: &Value) -> Result<f64, String> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| "price must be a number".to_string())?;
    if !price.is_finite() || price <= 0.0 {
        return Err("price must be a positive number".into());
    }
    Ok(price)
}

pub fn parse_category(raw: &str) -> Result<Category, String> {
    Category::parse(raw).ok_or_else(|| {
        let allowed: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        format!("category must be one of: {}", allowed.join(", "))
    })
}

fn parse_link(raw: &str) -> Result<Url, String> {
    parse_http_url(raw).ok_or_else(|| "imageLink must be an http(s) URL".to_string())
}

#[derive(Debug, Deserialize)]
pub struct ListImagesQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Listing as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub artist_name: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: Category,
    pub image_source: ImageSource,
    /// External link, or a short-lived URL for uploaded objects.
    pub image_url: Option<String>,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ImageResponse {
    pub fn new(image: Image, image_url: Option<String>) -> Self {
        Self {
            id: image.id,
            user_id: image.user_id,
            artist_name: image.artist_name,
            name: image.title,
            price: image.price,
            description: image.description,
            category: image.category,
            image_source: image.image_source,
            image_url,
            views: image.views,
            created_at: image.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub views: i64,
}

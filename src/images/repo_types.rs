use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::Owned;

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// The fixed set of listing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Painting,
    Drawing,
    Photography,
    #[serde(rename = "Digital Art")]
    DigitalArt,
    Sculpture,
    Illustration,
    Printmaking,
    #[serde(rename = "Mixed Media")]
    MixedMedia,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Painting,
        Category::Drawing,
        Category::Photography,
        Category::DigitalArt,
        Category::Sculpture,
        Category::Illustration,
        Category::Printmaking,
        Category::MixedMedia,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Painting => "Painting",
            Category::Drawing => "Drawing",
            Category::Photography => "Photography",
            Category::DigitalArt => "Digital Art",
            Category::Sculpture => "Sculpture",
            Category::Illustration => "Illustration",
            Category::Printmaking => "Printmaking",
            Category::MixedMedia => "Mixed Media",
            Category::Other => "Other",
        }
    }

    /// Case-insensitive match on the display name.
    pub fn parse(raw: &str) -> Option<Category> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Category::parse(&value).ok_or(UnknownVariant {
            kind: "category",
            value,
        })
    }
}

/// Where the image bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// `image_ref` is an external URL.
    Link,
    /// `image_ref` is an object-storage key.
    Upload,
}

impl ImageSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSource::Link => "link",
            ImageSource::Upload => "upload",
        }
    }
}

impl TryFrom<String> for ImageSource {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "link" => Ok(ImageSource::Link),
            "upload" => Ok(ImageSource::Upload),
            _ => Err(UnknownVariant {
                kind: "image source",
                value,
            }),
        }
    }
}

/// Image listing record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub user_id: Option<Uuid>, // NULL once the owner link is lost
    pub artist_name: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    #[sqlx(try_from = "String")]
    pub image_source: ImageSource,
    pub image_ref: String,
    pub views: i64,
    pub created_at: OffsetDateTime,
}

impl Owned for Image {
    fn owner_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub artist_name: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: Category,
    pub image_source: ImageSource,
    pub image_ref: String,
}

impl NewImage {
    #[cfg(test)]
    pub fn into_image(self, created_at: OffsetDateTime) -> Image {
        Image {
            id: self.id,
            user_id: Some(self.user_id),
            artist_name: self.artist_name,
            title: self.title,
            price: self.price,
            description: self.description,
            category: self.category,
            image_source: self.image_source,
            image_ref: self.image_ref,
            views: 0,
            created_at,
        }
    }
}

/// Allow-listed listing changes; `None` keeps the column.
#[derive(Debug, Clone, Default)]
pub struct ImageUpdate {
    pub artist_name: Option<String>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category: Option<Category>,
    /// A new external link; replaces an uploaded object too.
    pub image_link: Option<String>,
}

impl ImageUpdate {
    pub fn is_empty(&self) -> bool {
        self.artist_name.is_none()
            && self.title.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.image_link.is_none()
    }

    #[cfg(test)]
    pub fn apply(self, image: &mut Image) {
        if let Some(v) = self.artist_name {
            image.artist_name = v;
        }
        if let Some(v) = self.title {
            image.title = v;
        }
        if let Some(v) = self.price {
            image.price = v;
        }
        if let Some(v) = self.description {
            image.description = v;
        }
        if let Some(v) = self.category {
            image.category = v;
        }
        if let Some(v) = self.image_link {
            image.image_source = ImageSource::Link;
            image.image_ref = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(Category::parse("Painting"), Some(Category::Painting));
        assert_eq!(Category::parse(" digital art "), Some(Category::DigitalArt));
        assert_eq!(Category::parse("MIXED MEDIA"), Some(Category::MixedMedia));
        assert_eq!(Category::parse("Pottery"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn category_serializes_as_display_name() {
        assert_eq!(serde_json::to_string(&Category::DigitalArt).unwrap(), "\"Digital Art\"");
        for c in Category::ALL {
            assert_eq!(serde_json::to_value(c).unwrap(), c.as_str());
        }
    }

    #[test]
    fn stored_strings_convert_back() {
        assert_eq!(Category::try_from("Sculpture".to_string()).unwrap(), Category::Sculpture);
        assert!(Category::try_from("nope".to_string()).is_err());
        assert_eq!(ImageSource::try_from("upload".to_string()).unwrap(), ImageSource::Upload);
        assert!(ImageSource::try_from("ftp".to_string()).is_err());
    }
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub name: String,
    pub bio: Option<String>,
    pub artist_type: Option<String>,
    pub profile_picture: Option<String>,
    pub views: i64,
    pub created_at: OffsetDateTime,
}

/// Fields written at signup.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub bio: Option<String>,
    pub artist_type: Option<String>,
    pub profile_picture: Option<String>,
}

/// Allow-listed profile changes. `None` keeps the column; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<Option<String>>,
    pub artist_type: Option<Option<String>>,
    pub profile_picture: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bio.is_none()
            && self.artist_type.is_none()
            && self.profile_picture.is_none()
    }

    /// Applies the update to an in-memory record.
    #[cfg(test)]
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(artist_type) = self.artist_type {
            user.artist_type = artist_type;
        }
        if let Some(profile_picture) = self.profile_picture {
            user.profile_picture = profile_picture;
        }
    }
}

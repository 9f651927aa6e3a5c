use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ProfileUpdate, User};
use crate::{error::FieldError, links::parse_http_url};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 100;
const MAX_BIO_LEN: usize = 2000;
const MAX_ARTIST_TYPE_LEN: usize = 60;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Request body for signup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub artist_type: Option<String>,
    pub profile_picture: Option<String>,
}

/// Signup fields after validation.
#[derive(Debug)]
pub struct ValidSignup {
    pub email: String,
    pub password: String,
    pub name: String,
    pub bio: Option<String>,
    pub artist_type: Option<String>,
    pub profile_picture: Option<String>,
}

impl SignupRequest {
    pub fn validate(self) -> Result<ValidSignup, Vec<FieldError>> {
        let mut errors = Vec::new();

        let email = self.email.as_deref().map(normalize_email).unwrap_or_default();
        if email.is_empty() {
            errors.push(FieldError::new("email", "email is required"));
        } else if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "email is not valid"));
        }

        let password = self.password.unwrap_or_default();
        if password.is_empty() {
            errors.push(FieldError::new("password", "password is required"));
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        let name = self.name.map(|n| n.trim().to_string()).unwrap_or_default();
        check_name(&name, &mut errors);

        let bio = optional_text(self.bio);
        check_len("bio", bio.as_deref(), MAX_BIO_LEN, &mut errors);
        let artist_type = optional_text(self.artist_type);
        check_len("artistType", artist_type.as_deref(), MAX_ARTIST_TYPE_LEN, &mut errors);
        let profile_picture = optional_text(self.profile_picture);
        check_picture(profile_picture.as_deref(), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ValidSignup {
            email,
            password,
            name,
            bio,
            artist_type,
            profile_picture,
        })
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Allow-listed profile update; any other field is rejected.
/// Sending an empty string for an optional field clears it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub artist_type: Option<String>,
    pub profile_picture: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileUpdate, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.map(|n| n.trim().to_string());
        if let Some(name) = &name {
            check_name(name, &mut errors);
        }
        let bio = self.bio.map(|b| optional_text(Some(b)));
        check_len("bio", bio.clone().flatten().as_deref(), MAX_BIO_LEN, &mut errors);
        let artist_type = self.artist_type.map(|a| optional_text(Some(a)));
        check_len(
            "artistType",
            artist_type.clone().flatten().as_deref(),
            MAX_ARTIST_TYPE_LEN,
            &mut errors,
        );
        let profile_picture = self.profile_picture.map(|p| optional_text(Some(p)));
        check_picture(profile_picture.clone().flatten().as_deref(), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProfileUpdate {
            name,
            bio,
            artist_type,
            profile_picture,
        })
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    if name.is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("name must be at most {MAX_NAME_LEN} characters"),
        ));
    }
}

fn check_len(field: &'static str, value: Option<&str>, max: usize, errors: &mut Vec<FieldError>) {
    if value.is_some_and(|v| v.chars().count() > max) {
        errors.push(FieldError::new(field, format!("{field} must be at most {max} characters")));
    }
}

fn check_picture(value: Option<&str>, errors: &mut Vec<FieldError>) {
    if value.is_some_and(|v| parse_http_url(v).is_none()) {
        errors.push(FieldError::new("profilePicture", "profilePicture must be an http(s) URL"));
    }
}

/// Public part of the user returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub artist_type: Option<String>,
    pub profile_picture: Option<String>,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            bio: u.bio,
            artist_type: u.artist_type,
            profile_picture: u.profile_picture,
            views: u.views,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub views: i64,
}

//! In-memory fakes and request helpers shared by handler tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use bytes::Bytes;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use crate::{
    auth::password::hash_password,
    config::{AppConfig, Environment, JwtConfig},
    images::{
        repo_types::{Category, Image, ImageUpdate, NewImage},
        ImageRepo,
    },
    links::LinkChecker,
    state::AppState,
    storage::StorageClient,
    users::{
        repo_types::{NewUser, ProfileUpdate},
        User, UserRepo,
    },
};

#[derive(Default)]
pub struct MemoryUserRepo {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            bio: user.bio,
            artist_type: user.artist_type,
            profile_picture: user.profile_picture,
            views: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(created.clone());
        Ok(Some(created))
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|u| u.id == id).map(|u| {
            update.apply(u);
            u.clone()
        }))
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|u| u.id == id).map(|u| {
            u.views += 1;
            u.views
        }))
    }

    async fn list(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<User>> {
        let rows = self.rows.lock().unwrap();
        // Newest first; later inserts win timestamp ties.
        let mut users: Vec<User> = rows.iter().rev().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit.map_or(usize::MAX, |l| l as usize))
            .collect())
    }
}

/// User store that is down: every call fails.
pub struct FailingUserRepo;

#[async_trait]
impl UserRepo for FailingUserRepo {
    async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
        anyhow::bail!("database unavailable")
    }

    async fn find_by_id(&self, _id: Uuid) -> anyhow::Result<Option<User>> {
        anyhow::bail!("database unavailable")
    }

    async fn create(&self, _user: NewUser) -> anyhow::Result<Option<User>> {
        anyhow::bail!("database unavailable")
    }

    async fn update_profile(&self, _id: Uuid, _update: ProfileUpdate) -> anyhow::Result<Option<User>> {
        anyhow::bail!("database unavailable")
    }

    async fn increment_views(&self, _id: Uuid) -> anyhow::Result<Option<i64>> {
        anyhow::bail!("database unavailable")
    }

    async fn list(&self, _limit: Option<i64>, _offset: i64) -> anyhow::Result<Vec<User>> {
        anyhow::bail!("database unavailable")
    }
}

#[derive(Default)]
pub struct MemoryImageRepo {
    rows: Mutex<Vec<Image>>,
}

#[async_trait]
impl ImageRepo for MemoryImageRepo {
    async fn create(&self, image: NewImage) -> anyhow::Result<Image> {
        let image = image.into_image(OffsetDateTime::now_utc());
        self.rows.lock().unwrap().push(image.clone());
        Ok(image)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Image>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|i| i.id == id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        category: Option<Category>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Image>> {
        let rows = self.rows.lock().unwrap();
        // Newest first; later pushes win ties.
        Ok(rows
            .iter()
            .rev()
            .filter(|i| i.user_id == Some(owner))
            .filter(|i| category.map_or(true, |c| i.category == c))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, owner: Uuid, update: ImageUpdate) -> anyhow::Result<Option<Image>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|i| i.id == id && i.user_id == Some(owner))
            .map(|i| {
                update.apply(i);
                i.clone()
            }))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Image>> {
        let mut rows = self.rows.lock().unwrap();
        let pos = rows
            .iter()
            .position(|i| i.id == id && i.user_id == Some(owner));
        Ok(pos.map(|p| rows.remove(p)))
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|i| i.id == id).map(|i| {
            i.views += 1;
            i.views
        }))
    }

    async fn views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|i| i.id == id).map(|i| i.views))
    }
}

/// Bucket stand-in; clones share the same objects.
#[derive(Clone, Default)]
pub struct FakeStorage {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl FakeStorage {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        Ok(format!("https://fake.local/{key}?expires={seconds}"))
    }
}

/// Hosts under `.down.test` never answer; everything else does.
pub struct FakeLinkChecker;

#[async_trait]
impl LinkChecker for FakeLinkChecker {
    async fn is_reachable(&self, url: &Url) -> bool {
        !url.host_str().unwrap_or_default().ends_with("down.test")
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: "postgres://unused".into(),
        environment: Environment::Development,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "artfolio".into(),
            audience: "artfolio-users".into(),
            ttl_days: 7,
        },
        link_check_timeout_secs: 1,
        storage: None,
    }
}

impl AppState {
    pub fn fake() -> Self {
        Self::from_parts(
            &test_config(),
            Arc::new(MemoryUserRepo::default()),
            Arc::new(MemoryImageRepo::default()),
            Some(Arc::new(FakeStorage::default())),
            Arc::new(FakeLinkChecker),
        )
    }
}

pub async fn seed_user(state: &AppState, email: &str, password: &str) -> User {
    state
        .users
        .create(NewUser {
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            name: "Test Artist".into(),
            bio: None,
            artist_type: None,
            profile_picture: None,
        })
        .await
        .unwrap()
        .expect("email already seeded")
}

pub fn login_cookie(state: &AppState, user_id: Uuid) -> String {
    format!("session={}", state.keys.issue(user_id).unwrap())
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(req.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

use std::{sync::Arc, time::Duration};

use tracing::info;

use crate::{
    auth::{CookiePolicy, JwtKeys},
    config::AppConfig,
    db,
    images::{ImageRepo, PgImageRepo},
    links::{HttpLinkChecker, LinkChecker},
    storage::{S3Storage, StorageClient},
    users::{PgUserRepo, UserRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub keys: JwtKeys,
    pub cookies: CookiePolicy,
    pub users: Arc<dyn UserRepo>,
    pub images: Arc<dyn ImageRepo>,
    /// `None` when object storage is not configured; uploads are then refused.
    pub storage: Option<Arc<dyn StorageClient>>,
    pub links: Arc<dyn LinkChecker>,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        db::migrate(&pool).await?;

        // Real S3/MinIO, when configured
        let storage = match &config.storage {
            Some(cfg) => {
                info!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "object storage enabled");
                Some(Arc::new(S3Storage::connect(cfg).await?) as Arc<dyn StorageClient>)
            }
            None => {
                info!("object storage not configured; uploads disabled");
                None
            }
        };

        let links = Arc::new(HttpLinkChecker::new(Duration::from_secs(
            config.link_check_timeout_secs,
        ))?) as Arc<dyn LinkChecker>;

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(pool.clone())),
            Arc::new(PgImageRepo::new(pool)),
            storage,
            links,
        ))
    }

    pub fn from_parts(
        config: &AppConfig,
        users: Arc<dyn UserRepo>,
        images: Arc<dyn ImageRepo>,
        storage: Option<Arc<dyn StorageClient>>,
        links: Arc<dyn LinkChecker>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        let cookies = CookiePolicy::for_environment(config.environment, keys.ttl().whole_seconds());
        Self {
            keys,
            cookies,
            users,
            images,
            storage,
            links,
        }
    }
}

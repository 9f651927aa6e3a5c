mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod images;
mod links;
mod state;
mod storage;
#[cfg(test)]
mod testing;
mod users;

use anyhow::Context;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "artfolio=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Missing secrets or database settings stop the process here.
    let config = AppConfig::from_env().context("load configuration")?;
    tracing::info!(environment = ?config.environment, "configuration loaded");

    let app_state = AppState::init(&config).await?;
    app::serve(app::build_app(app_state), &config.host, config.port).await
}

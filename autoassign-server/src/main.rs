use anyhow::{Context, Result};
use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use autoassign_core::Config;
use autoassign_server::config::ServerConfig;
use autoassign_server::github::GitHubClient;
use autoassign_server::webhook::webhook_router;
use autoassign_server::AppState;

async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "autoassign",
        "version": autoassign_server::get_bot_version()
    })))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting reviewer auto-assignment bot");

    let config = ServerConfig::from_env()
        .context("Failed to load configuration from environment variables")?;

    let assign_config = Config::from_path(&config.assign_config_path).with_context(|| {
        format!(
            "Failed to load assignment config from {}",
            config.assign_config_path.display()
        )
    })?;
    info!(
        "Loaded assignment config from {} (reviewers: {}, assignees: {:?})",
        config.assign_config_path.display(),
        assign_config.add_reviewers,
        assign_config.add_assignees
    );

    let github_client = GitHubClient::with_base_url(
        config.github_app_id,
        config.github_private_key,
        &config.github_api_url,
    )?;

    let app_state = Arc::new(AppState {
        pull_request_api: Arc::new(github_client),
        assign_config: Arc::new(assign_config),
        webhook_secret: config.github_webhook_secret,
        availability_utc_offset: config.availability_utc_offset,
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(webhook_router(app_state.clone()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}

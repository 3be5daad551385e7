use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use permitdesk::auth::jwt::JwtService;
use permitdesk::config::AppConfig;
use permitdesk::db;
use permitdesk::push::{DisabledPush, FcmPush, PushSender};
use permitdesk::routes;
use permitdesk::state::AppState;
use permitdesk::storage::DiskStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    info!(
        database_url = %config.redacted_database_url(),
        host = %config.server_host,
        port = config.server_port,
        "starting permitdesk"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let jwt = JwtService::from_config(&config)?;
    let attachments = Arc::new(DiskStorage::new(config.upload_root.clone()));

    let push: Arc<dyn PushSender> = match config.fcm_server_key.as_deref() {
        Some(server_key) => Arc::new(FcmPush::new(
            config.fcm_endpoint.clone(),
            server_key,
            Duration::from_secs(config.push_timeout_seconds),
        )?),
        None => {
            info!("FCM_SERVER_KEY not set, push delivery disabled");
            Arc::new(DisabledPush)
        }
    };

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(pool, config, jwt, attachments, push);
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

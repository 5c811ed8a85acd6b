//! Bizhub API Server
//!
//! Serves the internal purchase and provisioning API.

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bizhub_api::{AppState, create_router};
use bizhub_db::connect_with;
use bizhub_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bizhub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    if config.server.internal_token.is_none() {
        warn!("server.internal_token is not set; internal routes are disabled");
    }
    info!(
        schema_prefix = %config.provisioning.schema_prefix,
        tenant_timeout_secs = config.provisioning.tenant_timeout_secs,
        max_concurrent_tenants = config.provisioning.max_concurrent_tenants,
        "Provisioning configured"
    );

    let state = AppState::new(
        db,
        config.provisioning.clone(),
        config.server.internal_token.clone(),
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

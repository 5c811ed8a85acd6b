//! Internal HTTP API for purchases and tenant provisioning.
//!
//! This crate provides:
//! - Health route
//! - Internal routes to record purchases and trigger provisioning runs
//! - Shared-secret middleware guarding the internal routes
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use bizhub_db::ProvisioningService;
use bizhub_shared::ProvisioningConfig;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Purchase recording and provisioning runs.
    pub provisioning: ProvisioningService,
    /// Shared secret for the internal routes.
    pub internal_token: Option<Arc<str>>,
}

impl AppState {
    /// Builds the state over a connection pool.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        provisioning: ProvisioningConfig,
        internal_token: Option<String>,
    ) -> Self {
        Self {
            provisioning: ProvisioningService::new(db, provisioning),
            internal_token: internal_token
                .filter(|t| !t.is_empty())
                .map(Arc::from),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

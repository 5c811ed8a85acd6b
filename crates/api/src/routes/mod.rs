//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::internal::internal_token_middleware};

pub mod health;
pub mod provisioning;

/// Creates the API router. Internal routes are mounted only when a token is
/// configured.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let router = Router::new().merge(health::routes());
    if state.internal_token.is_none() {
        return router;
    }

    let internal = provisioning::routes().layer(middleware::from_fn_with_state(
        state.clone(),
        internal_token_middleware,
    ));
    router.nest("/internal", internal)
}

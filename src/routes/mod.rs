//! Route modules for the Firmware Update Server

pub mod firmware;
pub mod health;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let max_size = state.config().firmware.max_size;

    Router::new()
        .merge(health::router())
        .merge(firmware::router(max_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

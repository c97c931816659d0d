pub mod status;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(status::status))
        .route("/status", get(status::status))
        .with_state(state)
}

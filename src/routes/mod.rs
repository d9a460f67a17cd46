// Route definitions

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

// Declare submodules for different route groups
mod api;
mod fragments;

// create_router accepts the AppState and returns a Router with the state already applied
pub fn create_router(app_state: AppState) -> Router {
    // Filter session API; every handler extracts AppState
    let api_router = Router::new()
        .route("/sessions", post(api::open_session))
        .route("/sessions/:id", delete(api::close_session))
        .route("/sessions/:id/commands", post(api::send_command))
        .route("/sessions/:id/updates", get(api::get_updates))
        // HTML fragment for the message area
        .route("/sessions/:id/messages", get(fragments::messages))
        .with_state(app_state);

    Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
}

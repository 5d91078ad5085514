//! Route table.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Largest attachment upload accepted over HTTP.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Create the router for one node.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Node
        .route("/me", get(handlers::me))
        .route("/status", get(handlers::status))
        .route("/inbox", get(handlers::inbox))
        .route("/metrics", get(handlers::metrics))
        // Queries
        .route("/ehrs", get(handlers::list_ehrs))
        .route("/ehr/:id", get(handlers::get_ehr))
        .route("/ehr/:id/history", get(handlers::ehr_history))
        .route("/ehr/:id/patient", get(handlers::get_patient))
        .route("/ehr/:id/origin", get(handlers::get_origin))
        .route("/ehr/:id/target", get(handlers::get_target))
        // Flows
        .route("/create", post(handlers::create))
        .route("/request", post(handlers::request))
        .route("/approve", post(handlers::approve))
        .route("/activate", post(handlers::activate))
        .route("/suspend", post(handlers::suspend))
        .route("/reject", post(handlers::reject))
        .route("/delete", post(handlers::delete))
        .route("/share", post(handlers::share))
        // Attachments
        .route("/attachments", post(handlers::upload_attachment))
        .route("/attachments/:hash", get(handlers::download_attachment))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

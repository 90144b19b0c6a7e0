use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;

use super::handlers;
use super::static_files::static_handler;
use super::state::AppState;

// UI Routes - web interface
pub fn ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::ui::index_handler).post(handlers::ui::ask_handler),
        )
        .route("/static/{*path}", get(static_handler))
}

// API Routes - REST API for programmatic access
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            // Query endpoints
            .route("/nl-query", post(handlers::api::nl_query))
            .route("/query", post(handlers::api::execute_query))

            // Data export
            .route("/export/{format}", post(handlers::api::export_data))

            // Schema
            .route("/schema", get(handlers::api::get_schema))

            // System status
            .route("/status", get(handlers::api::system_status))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
    )
}

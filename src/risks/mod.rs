pub mod error;
pub mod handlers;
pub mod links;
pub mod service;
pub mod storage;
pub mod types;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;

pub use error::RisksError;
pub use types::RiskStatus;

pub fn configure_risks_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/risks", get(handlers::handle_list_risks))
        .route("/api/risks", post(handlers::handle_create_risk))
        .route("/api/risks/:id", get(handlers::handle_get_risk))
        .route("/api/risks/:id", put(handlers::handle_update_risk))
        .route("/api/risks/:id", delete(handlers::handle_delete_risk))
        .route(
            "/api/risks/:id/status",
            patch(handlers::handle_update_risk_status),
        )
        .route(
            "/api/risks/:id/controls",
            get(handlers::handle_linked_controls),
        )
        .route(
            "/api/risks/:id/controls/:control_id",
            post(handlers::handle_link_control),
        )
        .route(
            "/api/risks/:id/controls/:control_id",
            delete(handlers::handle_unlink_control),
        )
}

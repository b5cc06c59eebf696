pub mod error;
pub mod evidence;
pub mod handlers;
pub mod readiness;
pub mod service;
pub mod storage;
pub mod types;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;

pub use error::ControlsError;
pub use types::{ControlStatus, EvidenceType};

pub fn configure_controls_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/controls", get(handlers::handle_list_controls))
        .route("/api/controls", post(handlers::handle_create_control))
        .route("/api/controls/readiness", get(handlers::handle_get_readiness))
        .route(
            "/api/controls/readiness/categories",
            get(handlers::handle_get_readiness_by_category),
        )
        .route("/api/controls/:id", get(handlers::handle_get_control))
        .route("/api/controls/:id", delete(handlers::handle_delete_control))
        .route(
            "/api/controls/:id/status",
            patch(handlers::handle_update_status),
        )
        .route(
            "/api/controls/:id/audit",
            get(handlers::handle_get_control_audit),
        )
        .route(
            "/api/controls/:id/evidence",
            post(handlers::handle_create_evidence),
        )
        .route(
            "/api/controls/:id/evidence",
            get(handlers::handle_list_evidence),
        )
        .route(
            "/api/controls/:id/evidence",
            delete(handlers::handle_delete_all_evidence),
        )
        .route(
            "/api/controls/:id/evidence/:evidence_id",
            delete(handlers::handle_delete_evidence),
        )
}

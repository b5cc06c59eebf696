pub mod cursor;
pub mod error;
pub mod handlers;
pub mod query;
pub mod recorder;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::shared::state::AppState;

pub use cursor::Cursor;
pub use error::AuditError;
pub use recorder::{record, AuditEntry};
pub use types::{AuditAction, AuditEntityType, AuditMeta, FieldChange};

pub fn configure_audit_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/audit/events", get(handlers::handle_list_events))
        .route("/api/audit/recent", get(handlers::handle_recent_events))
}

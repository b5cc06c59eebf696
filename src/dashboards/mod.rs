pub mod error;
pub mod handlers;
pub mod stats;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::shared::state::AppState;

pub use error::DashboardsError;

pub fn configure_dashboards_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard/stats", get(handlers::handle_get_stats))
}

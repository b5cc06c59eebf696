//! Combines the route tables of all domain modules into a single router.

use axum::Router;
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::controls::configure_controls_routes())
        .merge(crate::risks::configure_risks_routes())
        .merge(crate::audit::configure_audit_routes())
        .merge(crate::dashboards::configure_dashboards_routes())
}

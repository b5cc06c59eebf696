use axum::{extract::State, Json};
use std::sync::Arc;

use crate::shared::state::AppState;

use super::error::DashboardsError;
use super::stats;
use super::types::DashboardStats;

pub async fn handle_get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, DashboardsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DashboardsError::Database(e.to_string()))?;
        stats::gather_stats(&mut conn)
    })
    .await
    .map_err(|e| DashboardsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::shared::state::AppState;

use super::cursor::Cursor;
use super::error::AuditError;
use super::query::{self, EventFilters};
use super::types::{AuditEventsQuery, AuditPage, RecentEventsQuery};

pub async fn handle_list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditEventsQuery>,
) -> Result<Json<AuditPage>, AuditError> {
    let pool = state.conn.clone();

    let page = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let limit = query::clamp_limit(params.limit.or(params.take));
        let cursor = params
            .cursor
            .as_deref()
            .map(Cursor::decode)
            .transpose()?;
        let filters = EventFilters::from_query(&params);

        query::find_events(&mut conn, &filters, limit, cursor)
    })
    .await
    .map_err(|e| AuditError::Internal(e.to_string()))??;

    Ok(Json(page))
}

pub async fn handle_recent_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentEventsQuery>,
) -> Result<Json<AuditPage>, AuditError> {
    let pool = state.conn.clone();

    let page = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let limit = match params.take {
            Some(take) if take > 0 && take <= 100 => take,
            _ => 25,
        };
        let cursor = params
            .cursor
            .as_deref()
            .map(Cursor::decode)
            .transpose()?;

        query::find_events(&mut conn, &EventFilters::default(), limit, cursor)
    })
    .await
    .map_err(|e| AuditError::Internal(e.to_string()))??;

    Ok(Json(page))
}

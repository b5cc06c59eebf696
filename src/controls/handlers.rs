use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::types::AuditEventView;
use crate::shared::actor::ActorId;
use crate::shared::state::AppState;

use super::error::ControlsError;
use super::storage::{db_control_to_view, db_evidence_to_view};
use super::types::{
    BulkDeleteResponse, CategoryReadiness, ControlView, ControlsQuery, CreateControlRequest,
    CreateEvidenceRequest, DeleteResponse, EvidenceView, ReadinessResponse,
    UpdateControlStatusRequest,
};
use super::{evidence, readiness, service};

pub async fn handle_list_controls(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ControlsQuery>,
) -> Result<Json<Vec<ControlView>>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        let rows = service::list_controls(&mut conn, &query)?;
        rows.into_iter()
            .map(db_control_to_view)
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_create_control(
    State(state): State<Arc<AppState>>,
    ActorId(actor_id): ActorId,
    Json(req): Json<CreateControlRequest>,
) -> Result<Json<ControlView>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        let control = service::create_control(&mut conn, req, actor_id)?;
        db_control_to_view(control)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_get_control(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ControlView>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        let control = service::get_control(&mut conn, id)?;
        db_control_to_view(control)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ActorId(actor_id): ActorId,
    Json(req): Json<UpdateControlStatusRequest>,
) -> Result<Json<ControlView>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        let control = service::update_status(&mut conn, id, req.status, actor_id)?;
        db_control_to_view(control)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_delete_control(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ControlsError> {
    let pool = state.conn.clone();

    let deleted_id = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        service::delete_control(&mut conn, id)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(DeleteResponse {
        ok: true,
        deleted_id,
    }))
}

pub async fn handle_get_readiness(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        readiness::get_readiness(&mut conn)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_get_readiness_by_category(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryReadiness>>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        readiness::get_readiness_by_category(&mut conn)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_get_control_audit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditEventView>>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        crate::audit::query::find_for_control(&mut conn, id)
            .map_err(|e| ControlsError::Database(e.to_string()))
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_create_evidence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ActorId(actor_id): ActorId,
    Json(req): Json<CreateEvidenceRequest>,
) -> Result<Json<EvidenceView>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        let row = evidence::create_evidence(&mut conn, id, req, actor_id)?;
        db_evidence_to_view(row)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_list_evidence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EvidenceView>>, ControlsError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        let rows = evidence::list_evidence(&mut conn, id)?;
        rows.into_iter()
            .map(db_evidence_to_view)
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_delete_evidence(
    State(state): State<Arc<AppState>>,
    Path((id, evidence_id)): Path<(Uuid, Uuid)>,
    ActorId(actor_id): ActorId,
) -> Result<Json<DeleteResponse>, ControlsError> {
    let pool = state.conn.clone();

    let deleted_id = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        evidence::delete_evidence(&mut conn, id, evidence_id, actor_id)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(DeleteResponse {
        ok: true,
        deleted_id,
    }))
}

pub async fn handle_delete_all_evidence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ActorId(actor_id): ActorId,
) -> Result<Json<BulkDeleteResponse>, ControlsError> {
    let pool = state.conn.clone();

    let deleted_count = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| ControlsError::Database(e.to_string()))?;
        evidence::delete_all_evidence(&mut conn, id, actor_id)
    })
    .await
    .map_err(|e| ControlsError::Internal(e.to_string()))??;

    Ok(Json(BulkDeleteResponse {
        ok: true,
        deleted_count,
    }))
}

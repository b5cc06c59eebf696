use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::actor::ActorId;
use crate::shared::state::AppState;

use super::error::RisksError;
use super::storage::db_risk_to_view;
use super::types::{
    CreateRiskRequest, DeleteRiskResponse, LinkResponse, LinkedControlSummary, RiskView,
    RisksQuery, UpdateRiskRequest, UpdateRiskStatusRequest,
};
use super::{links, service};

pub async fn handle_list_risks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RisksQuery>,
) -> Result<Json<Vec<RiskView>>, RisksError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        service::list_risks(&mut conn, &query)
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_create_risk(
    State(state): State<Arc<AppState>>,
    ActorId(actor_id): ActorId,
    Json(req): Json<CreateRiskRequest>,
) -> Result<Json<RiskView>, RisksError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        let risk = service::create_risk(&mut conn, req, actor_id)?;
        db_risk_to_view(risk, Vec::new())
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_get_risk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RiskView>, RisksError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        service::get_risk(&mut conn, id)
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_update_risk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ActorId(actor_id): ActorId,
    Json(req): Json<UpdateRiskRequest>,
) -> Result<Json<RiskView>, RisksError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        service::update_risk(&mut conn, id, req, actor_id)?;
        service::get_risk(&mut conn, id)
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_update_risk_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ActorId(actor_id): ActorId,
    Json(req): Json<UpdateRiskStatusRequest>,
) -> Result<Json<RiskView>, RisksError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        service::update_status(&mut conn, id, req.status, actor_id)?;
        service::get_risk(&mut conn, id)
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn handle_delete_risk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteRiskResponse>, RisksError> {
    let pool = state.conn.clone();

    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        service::delete_risk(&mut conn, id)
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(DeleteRiskResponse {
        message: "Risk deleted".to_string(),
    }))
}

pub async fn handle_link_control(
    State(state): State<Arc<AppState>>,
    Path((id, control_id)): Path<(Uuid, Uuid)>,
    ActorId(actor_id): ActorId,
) -> Result<Json<LinkResponse>, RisksError> {
    let pool = state.conn.clone();

    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        links::link_control(&mut conn, id, control_id, actor_id)
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(LinkResponse {
        ok: true,
        message: "Control linked to risk".to_string(),
    }))
}

pub async fn handle_unlink_control(
    State(state): State<Arc<AppState>>,
    Path((id, control_id)): Path<(Uuid, Uuid)>,
    ActorId(actor_id): ActorId,
) -> Result<Json<LinkResponse>, RisksError> {
    let pool = state.conn.clone();

    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        links::unlink_control(&mut conn, id, control_id, actor_id)
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(LinkResponse {
        ok: true,
        message: "Control unlinked from risk".to_string(),
    }))
}

pub async fn handle_linked_controls(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LinkedControlSummary>>, RisksError> {
    let pool = state.conn.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| RisksError::Database(e.to_string()))?;
        links::linked_controls(&mut conn, id)
    })
    .await
    .map_err(|e| RisksError::Internal(e.to_string()))??;

    Ok(Json(result))
}

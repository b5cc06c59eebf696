//! Append-side of the audit trail.
//!
//! [`record`] runs on the caller's connection, which is expected to be
//! inside an open transaction: the coordinator that performed the domain
//! write passes the same handle here, so a failed audit insert rolls the
//! domain write back and a failed domain write never leaves an audit row
//! behind. The recorder never opens a transaction of its own and never
//! retries; any insert error propagates to the caller.

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::shared::schema::audit_events;

use super::storage::DbAuditEvent;
use super::types::{AuditAction, AuditEntityType, AuditMeta};

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub entity_type: AuditEntityType,
    pub entity_id: String,
    pub control_id: Option<Uuid>,
    pub risk_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub meta: Option<AuditMeta>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, entity_type: AuditEntityType, entity_id: String) -> Self {
        Self {
            action,
            entity_type,
            entity_id,
            control_id: None,
            risk_id: None,
            actor_id: None,
            meta: None,
        }
    }

    pub fn control(mut self, control_id: Uuid) -> Self {
        self.control_id = Some(control_id);
        self
    }

    pub fn risk(mut self, risk_id: Uuid) -> Self {
        self.risk_id = Some(risk_id);
        self
    }

    pub fn actor(mut self, actor_id: Option<Uuid>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn meta(mut self, meta: AuditMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Append one audit event using the caller-supplied transaction handle.
pub fn record(conn: &mut PgConnection, entry: AuditEntry) -> QueryResult<DbAuditEvent> {
    let meta = match entry.meta {
        Some(meta) => Some(
            serde_json::to_value(&meta)
                .map_err(|e| diesel::result::Error::SerializationError(Box::new(e)))?,
        ),
        None => None,
    };

    let event = DbAuditEvent {
        id: Uuid::new_v4(),
        action: entry.action.to_string(),
        entity_type: entry.entity_type.to_string(),
        entity_id: entry.entity_id,
        control_id: entry.control_id,
        risk_id: entry.risk_id,
        actor_id: entry.actor_id,
        meta,
        created_at: Utc::now(),
    };

    diesel::insert_into(audit_events::table)
        .values(&event)
        .execute(conn)?;

    Ok(event)
}

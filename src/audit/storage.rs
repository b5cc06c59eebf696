use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::schema::audit_events;

use super::error::AuditError;
use super::types::{AuditAction, AuditEntityType, AuditEventView};

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = audit_events)]
pub struct DbAuditEvent {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub control_id: Option<Uuid>,
    pub risk_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A stored action or entity type the vocabulary does not know is surfaced
/// as an error rather than relabeled; a mislabeled trail entry is worse
/// than a failed read.
pub fn db_event_to_view(db: DbAuditEvent) -> Result<AuditEventView, AuditError> {
    let action: AuditAction = db
        .action
        .parse()
        .map_err(|e| AuditError::Internal(format!("audit event {}: {e}", db.id)))?;
    let entity_type: AuditEntityType = db
        .entity_type
        .parse()
        .map_err(|e| AuditError::Internal(format!("audit event {}: {e}", db.id)))?;

    Ok(AuditEventView {
        id: db.id,
        action,
        entity_type,
        entity_id: db.entity_id,
        control_id: db.control_id,
        risk_id: db.risk_id,
        actor_id: db.actor_id,
        meta: db.meta,
        created_at: db.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action: &str, entity_type: &str) -> DbAuditEvent {
        DbAuditEvent {
            id: Uuid::new_v4(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: "x".to_string(),
            control_id: None,
            risk_id: None,
            actor_id: None,
            meta: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn known_row_converts() {
        let view = db_event_to_view(event("STATUS_CHANGED", "CONTROL")).unwrap();
        assert_eq!(view.action, AuditAction::StatusChanged);
        assert_eq!(view.entity_type, AuditEntityType::Control);
    }

    #[test]
    fn unknown_action_is_an_error_not_a_relabel() {
        assert!(matches!(
            db_event_to_view(event("PURGED", "CONTROL")),
            Err(AuditError::Internal(_))
        ));
        assert!(matches!(
            db_event_to_view(event("CREATED", "TENANT")),
            Err(AuditError::Internal(_))
        ));
    }
}

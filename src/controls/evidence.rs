//! Evidence coordinators: NOTE/LINK payloads attached to a control.
//!
//! Payload validation runs before any transaction is opened, so malformed
//! input never reaches the transactional boundary. Bulk deletion writes one
//! aggregate audit event with the `"BULK"` sentinel entity id instead of a
//! row per deleted record.

use chrono::Utc;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::audit::{self, AuditAction, AuditEntityType, AuditEntry, AuditMeta};
use crate::shared::schema::{control_evidence, controls};

use super::error::ControlsError;
use super::storage::DbEvidence;
use super::types::{CreateEvidenceRequest, EvidenceType};

const NOTE_SNAPSHOT_MAX: usize = 200;

pub fn validate(req: &CreateEvidenceRequest) -> Result<(), ControlsError> {
    match req.evidence_type {
        EvidenceType::Note => {
            if req.note.as_deref().map_or(true, |n| n.trim().is_empty()) {
                return Err(ControlsError::Validation(
                    "note is required when type=NOTE".to_string(),
                ));
            }
        }
        EvidenceType::Link => {
            let link = req.link.as_deref().map(str::trim).unwrap_or("");
            if link.is_empty() {
                return Err(ControlsError::Validation(
                    "link is required when type=LINK".to_string(),
                ));
            }
            if !link.starts_with("http://") && !link.starts_with("https://") {
                return Err(ControlsError::Validation(
                    "link must be an http(s) URL".to_string(),
                ));
            }
        }
    }
    Ok(())
}

pub fn create_evidence(
    conn: &mut PgConnection,
    control_id: Uuid,
    req: CreateEvidenceRequest,
    actor_id: Option<Uuid>,
) -> Result<DbEvidence, ControlsError> {
    validate(&req)?;

    conn.transaction(|conn| {
        ensure_control_exists(conn, control_id)?;

        let evidence = DbEvidence {
            id: Uuid::new_v4(),
            control_id,
            evidence_type: req.evidence_type.to_string(),
            note: req.note,
            link: req.link,
            created_at: Utc::now(),
        };

        diesel::insert_into(control_evidence::table)
            .values(&evidence)
            .execute(conn)?;

        audit::record(
            conn,
            AuditEntry::new(
                AuditAction::EvidenceCreated,
                AuditEntityType::Evidence,
                evidence.id.to_string(),
            )
            .control(control_id)
            .actor(actor_id)
            .meta(snapshot_meta(&evidence)),
        )?;

        Ok(evidence)
    })
}

pub fn list_evidence(
    conn: &mut PgConnection,
    control_id: Uuid,
) -> Result<Vec<DbEvidence>, ControlsError> {
    ensure_control_exists(conn, control_id)?;

    let rows = control_evidence::table
        .filter(control_evidence::control_id.eq(control_id))
        .order(control_evidence::created_at.desc())
        .load(conn)?;
    Ok(rows)
}

pub fn delete_evidence(
    conn: &mut PgConnection,
    control_id: Uuid,
    evidence_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<Uuid, ControlsError> {
    conn.transaction(|conn| {
        ensure_control_exists(conn, control_id)?;

        let evidence: DbEvidence = control_evidence::table
            .filter(control_evidence::id.eq(evidence_id))
            .filter(control_evidence::control_id.eq(control_id))
            .first(conn)
            .optional()?
            .ok_or_else(|| ControlsError::NotFound("Evidence not found".to_string()))?;

        diesel::delete(control_evidence::table.find(evidence_id)).execute(conn)?;

        audit::record(
            conn,
            AuditEntry::new(
                AuditAction::EvidenceDeleted,
                AuditEntityType::Evidence,
                evidence_id.to_string(),
            )
            .control(control_id)
            .actor(actor_id)
            .meta(snapshot_meta(&evidence)),
        )?;

        Ok(evidence_id)
    })
}

/// Delete all evidence for a control. One aggregate audit event carries the
/// count; granularity is traded for write efficiency here, and a no-op bulk
/// delete (zero rows) is not audited at all.
pub fn delete_all_evidence(
    conn: &mut PgConnection,
    control_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<i64, ControlsError> {
    conn.transaction(|conn| {
        ensure_control_exists(conn, control_id)?;

        let deleted = diesel::delete(
            control_evidence::table.filter(control_evidence::control_id.eq(control_id)),
        )
        .execute(conn)? as i64;

        if deleted > 0 {
            audit::record(
                conn,
                AuditEntry::new(
                    AuditAction::EvidenceDeleted,
                    AuditEntityType::Evidence,
                    "BULK".to_string(),
                )
                .control(control_id)
                .actor(actor_id)
                .meta(AuditMeta::BulkDelete {
                    bulk: true,
                    deleted_count: deleted,
                }),
            )?;
        }

        Ok(deleted)
    })
}

fn ensure_control_exists(conn: &mut PgConnection, control_id: Uuid) -> Result<(), ControlsError> {
    let exists: Option<Uuid> = controls::table
        .find(control_id)
        .select(controls::id)
        .first(conn)
        .optional()?;
    if exists.is_none() {
        return Err(ControlsError::NotFound("Control not found".to_string()));
    }
    Ok(())
}

fn snapshot_meta(evidence: &DbEvidence) -> AuditMeta {
    AuditMeta::Snapshot {
        snapshot: json!({
            "evidenceId": evidence.id,
            "type": evidence.evidence_type,
            "note": evidence.note.as_deref().map(|n| truncate(n, NOTE_SNAPSHOT_MAX)),
            "link": evidence.link,
        }),
    }
}

fn truncate(value: &str, max: usize) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max).collect();
    out.push('…');
    out
}

//! Risk↔control link coordinators.
//!
//! Both endpoints are checked before any write: a missing risk or control
//! fails NotFound and a duplicate pair fails Conflict. Unlinking an absent
//! pair is NotFound. All checks run ahead of the link-table write, so a
//! rejected operation leaves no audit trace.

use diesel::prelude::*;
use uuid::Uuid;

use crate::audit::{self, AuditAction, AuditEntityType, AuditEntry, AuditMeta};
use crate::shared::schema::{controls, risk_controls, risks};

use super::error::RisksError;
use super::storage::DbRiskControl;
use super::types::LinkedControlSummary;

pub fn link_control(
    conn: &mut PgConnection,
    risk_id: Uuid,
    control_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<(), RisksError> {
    conn.transaction(|conn| {
        let risk_exists: Option<Uuid> = risks::table
            .find(risk_id)
            .select(risks::id)
            .first(conn)
            .optional()?;
        if risk_exists.is_none() {
            return Err(RisksError::NotFound("Risk not found".to_string()));
        }

        let control: Option<(String, String)> = controls::table
            .find(control_id)
            .select((controls::code, controls::title))
            .first(conn)
            .optional()?;
        let (control_code, control_title) =
            control.ok_or_else(|| RisksError::NotFound("Control not found".to_string()))?;

        let already_linked: Option<Uuid> = risk_controls::table
            .find((risk_id, control_id))
            .select(risk_controls::risk_id)
            .first(conn)
            .optional()?;
        if already_linked.is_some() {
            return Err(RisksError::Conflict(
                "Risk and Control are already linked".to_string(),
            ));
        }

        diesel::insert_into(risk_controls::table)
            .values(&DbRiskControl {
                risk_id,
                control_id,
            })
            .execute(conn)?;

        audit::record(
            conn,
            AuditEntry::new(
                AuditAction::RiskControlLinked,
                AuditEntityType::Risk,
                risk_id.to_string(),
            )
            .risk(risk_id)
            .actor(actor_id)
            .meta(AuditMeta::Link {
                control_id,
                control_code,
                control_title,
            }),
        )?;

        Ok(())
    })
}

pub fn unlink_control(
    conn: &mut PgConnection,
    risk_id: Uuid,
    control_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<(), RisksError> {
    conn.transaction(|conn| {
        let link: Option<(String, String)> = risk_controls::table
            .inner_join(controls::table)
            .filter(risk_controls::risk_id.eq(risk_id))
            .filter(risk_controls::control_id.eq(control_id))
            .select((controls::code, controls::title))
            .first(conn)
            .optional()?;
        let (control_code, control_title) =
            link.ok_or_else(|| RisksError::NotFound("Link not found".to_string()))?;

        diesel::delete(risk_controls::table.find((risk_id, control_id))).execute(conn)?;

        audit::record(
            conn,
            AuditEntry::new(
                AuditAction::RiskControlUnlinked,
                AuditEntityType::Risk,
                risk_id.to_string(),
            )
            .risk(risk_id)
            .actor(actor_id)
            .meta(AuditMeta::Link {
                control_id,
                control_code,
                control_title,
            }),
        )?;

        Ok(())
    })
}

pub fn linked_controls(
    conn: &mut PgConnection,
    risk_id: Uuid,
) -> Result<Vec<LinkedControlSummary>, RisksError> {
    let risk_exists: Option<Uuid> = risks::table
        .find(risk_id)
        .select(risks::id)
        .first(conn)
        .optional()?;
    if risk_exists.is_none() {
        return Err(RisksError::NotFound("Risk not found".to_string()));
    }

    let mut map = super::service::load_linked_controls(conn, &[risk_id])?;
    Ok(map.remove(&risk_id).unwrap_or_default())
}

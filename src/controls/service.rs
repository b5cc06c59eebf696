//! Transactional coordinators for control mutations.
//!
//! Every mutation follows the same shape: open one transaction, read the
//! before-state where the action needs a diff, apply the write, append the
//! audit event on the same connection, commit. An error anywhere rolls the
//! whole unit back, so a domain write can never persist without its audit
//! record nor the other way around.

use chrono::Utc;
use diesel::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::audit::{self, AuditAction, AuditEntityType, AuditEntry, AuditMeta, FieldChange};
use crate::shared::schema::controls;

use super::error::ControlsError;
use super::storage::DbControl;
use super::types::{ControlStatus, ControlsQuery, CreateControlRequest};

pub fn create_control(
    conn: &mut PgConnection,
    req: CreateControlRequest,
    actor_id: Option<Uuid>,
) -> Result<DbControl, ControlsError> {
    if req.code.trim().len() < 3 {
        return Err(ControlsError::Validation(
            "code must be at least 3 characters".to_string(),
        ));
    }
    if req.title.trim().len() < 3 {
        return Err(ControlsError::Validation(
            "title must be at least 3 characters".to_string(),
        ));
    }

    conn.transaction(|conn| {
        let now = Utc::now();
        let control = DbControl {
            id: Uuid::new_v4(),
            code: req.code,
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or(ControlStatus::NotStarted).to_string(),
            category: req.category,
            owner_id: req.owner_id,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(controls::table)
            .values(&control)
            .execute(conn)
            .map_err(|e| match ControlsError::from(e) {
                ControlsError::Conflict(_) => {
                    ControlsError::Conflict("Control code already exists".to_string())
                }
                other => other,
            })?;

        audit::record(
            conn,
            AuditEntry::new(
                AuditAction::Created,
                AuditEntityType::Control,
                control.id.to_string(),
            )
            .control(control.id)
            .actor(actor_id)
            .meta(AuditMeta::Snapshot {
                snapshot: json!({
                    "code": control.code,
                    "title": control.title,
                    "status": control.status,
                }),
            }),
        )?;

        Ok(control)
    })
}

pub fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: ControlStatus,
    actor_id: Option<Uuid>,
) -> Result<DbControl, ControlsError> {
    conn.transaction(|conn| {
        let before: DbControl = controls::table
            .find(id)
            .first(conn)
            .optional()?
            .ok_or_else(|| ControlsError::NotFound("Control not found".to_string()))?;

        let updated: DbControl = diesel::update(controls::table.find(id))
            .set((
                controls::status.eq(status.to_string()),
                controls::updated_at.eq(Utc::now()),
            ))
            .get_result(conn)?;

        // A status "change" to the current value is a no-op and leaves no
        // trace in the audit trail.
        if before.status != updated.status {
            let mut changes = BTreeMap::new();
            changes.insert(
                "status".to_string(),
                FieldChange {
                    from: json!(before.status),
                    to: json!(updated.status),
                },
            );

            audit::record(
                conn,
                AuditEntry::new(
                    AuditAction::StatusChanged,
                    AuditEntityType::Control,
                    updated.id.to_string(),
                )
                .control(updated.id)
                .actor(actor_id)
                .meta(AuditMeta::Changes { changes }),
            )?;
        }

        Ok(updated)
    })
}

pub fn delete_control(conn: &mut PgConnection, id: Uuid) -> Result<Uuid, ControlsError> {
    let exists: Option<Uuid> = controls::table
        .find(id)
        .select(controls::id)
        .first(conn)
        .optional()?;
    if exists.is_none() {
        return Err(ControlsError::NotFound("Control not found".to_string()));
    }

    diesel::delete(controls::table.find(id)).execute(conn)?;
    Ok(id)
}

pub fn get_control(conn: &mut PgConnection, id: Uuid) -> Result<DbControl, ControlsError> {
    controls::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| ControlsError::NotFound("Control not found".to_string()))
}

pub fn list_controls(
    conn: &mut PgConnection,
    query: &ControlsQuery,
) -> Result<Vec<DbControl>, ControlsError> {
    let mut db_query = controls::table.into_boxed();

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        db_query = db_query.filter(
            controls::code
                .ilike(pattern.clone())
                .or(controls::title.ilike(pattern)),
        );
    }
    if let Some(category) = &query.category {
        db_query = db_query.filter(controls::category.eq(category.clone()));
    }
    if let Some(status) = &query.status {
        let statuses: Vec<String> = status
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<ControlStatus>()
                    .map(|st| st.to_string())
                    .map_err(ControlsError::Validation)
            })
            .collect::<Result<_, _>>()?;
        if !statuses.is_empty() {
            db_query = db_query.filter(controls::status.eq_any(statuses));
        }
    }

    let descending = query.sort_dir.as_deref() == Some("desc");
    db_query = match (query.sort_key.as_deref().unwrap_or("code"), descending) {
        ("title", false) => db_query.order(controls::title.asc()),
        ("title", true) => db_query.order(controls::title.desc()),
        ("status", false) => db_query.order(controls::status.asc()),
        ("status", true) => db_query.order(controls::status.desc()),
        ("category", false) => db_query.order(controls::category.asc()),
        ("category", true) => db_query.order(controls::category.desc()),
        (_, true) => db_query.order(controls::code.desc()),
        (_, false) => db_query.order(controls::code.asc()),
    };

    let take = query.take.unwrap_or(50).clamp(1, 200);
    let skip = query.skip.unwrap_or(0).max(0);

    let rows = db_query.offset(skip).limit(take).load(conn)?;
    Ok(rows)
}

//! Read-side of the audit trail: filtered, cursor-paginated history.
//!
//! Queries are read-only and rely on the store's point-in-time consistency.
//! Rows inserted concurrently with a page walk may or may not appear in
//! later pages; for an append-mostly log ordered newest-first this is
//! acceptable and documented behavior.

use diesel::prelude::*;
use uuid::Uuid;

use crate::shared::schema::audit_events;

use super::cursor::Cursor;
use super::error::AuditError;
use super::storage::{db_event_to_view, DbAuditEvent};
use super::types::{AuditEntityType, AuditEventView, AuditEventsQuery, AuditPage};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

/// Conjunctive filters over the audit trail. The entity filter is only
/// meaningful as a (type, id) pair; a type without an id is dropped.
#[derive(Debug, Clone, Default)]
pub struct EventFilters {
    pub control_id: Option<Uuid>,
    pub risk_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub entity: Option<(AuditEntityType, String)>,
}

impl EventFilters {
    pub fn from_query(query: &AuditEventsQuery) -> Self {
        let entity = match (query.entity_type, query.entity_id.clone()) {
            (Some(entity_type), Some(entity_id)) => Some((entity_type, entity_id)),
            _ => None,
        };

        Self {
            control_id: query.control_id,
            risk_id: query.risk_id,
            actor_id: query.actor_id,
            entity,
        }
    }
}

pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Fetch one page of audit events strictly after `cursor` in
/// `(created_at DESC, id DESC)` order, using the peek-ahead protocol:
/// `limit + 1` rows are loaded, and the presence of the extra row decides
/// whether a `nextCursor` (taken from the last *kept* row) is emitted.
pub fn find_events(
    conn: &mut PgConnection,
    filters: &EventFilters,
    limit: i64,
    cursor: Option<Cursor>,
) -> Result<AuditPage, AuditError> {
    let mut query = audit_events::table.into_boxed();

    if let Some(control_id) = filters.control_id {
        query = query.filter(audit_events::control_id.eq(control_id));
    }
    if let Some(risk_id) = filters.risk_id {
        query = query.filter(audit_events::risk_id.eq(risk_id));
    }
    if let Some(actor_id) = filters.actor_id {
        query = query.filter(audit_events::actor_id.eq(actor_id));
    }
    if let Some((entity_type, entity_id)) = &filters.entity {
        query = query
            .filter(audit_events::entity_type.eq(entity_type.to_string()))
            .filter(audit_events::entity_id.eq(entity_id.clone()));
    }

    if let Some(cursor) = cursor {
        // Strictly past the cursor position: earlier timestamp, or same
        // timestamp with a smaller id. Timestamps alone are not unique.
        query = query.filter(
            audit_events::created_at.lt(cursor.created_at).or(audit_events::created_at
                .eq(cursor.created_at)
                .and(audit_events::id.lt(cursor.id))),
        );
    }

    let rows: Vec<DbAuditEvent> = query
        .order((audit_events::created_at.desc(), audit_events::id.desc()))
        .limit(limit + 1)
        .load(conn)?;

    let (kept, next_cursor) = assemble_page(rows, limit as usize);
    let items = kept
        .into_iter()
        .map(db_event_to_view)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AuditPage {
        items,
        next_cursor: next_cursor.map(|c| c.encode()),
    })
}

/// Split peek-ahead rows into the kept page and the resume cursor. The
/// extra row only signals that more data exists; it is discarded and the
/// cursor points at the last kept row.
pub fn assemble_page(
    mut rows: Vec<DbAuditEvent>,
    limit: usize,
) -> (Vec<DbAuditEvent>, Option<Cursor>) {
    if rows.len() <= limit {
        return (rows, None);
    }

    rows.truncate(limit);
    let next = rows.last().map(|row| Cursor::new(row.created_at, row.id));
    (rows, next)
}

/// Full history for one control, newest first. Unpaginated by design:
/// intended for a single control's timeline view, capped rather than
/// cursor-driven. Callers must not rely on it at scale.
pub fn find_for_control(
    conn: &mut PgConnection,
    control_id: Uuid,
) -> Result<Vec<AuditEventView>, AuditError> {
    let rows: Vec<DbAuditEvent> = audit_events::table
        .filter(audit_events::control_id.eq(control_id))
        .order((audit_events::created_at.desc(), audit_events::id.desc()))
        .limit(100)
        .load(conn)?;

    rows.into_iter().map(db_event_to_view).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(ts_seconds: i64, id: Uuid) -> DbAuditEvent {
        DbAuditEvent {
            id,
            action: "CREATED".to_string(),
            entity_type: "CONTROL".to_string(),
            entity_id: id.to_string(),
            control_id: Some(id),
            risk_id: None,
            actor_id: None,
            meta: None,
            created_at: Utc.timestamp_opt(ts_seconds, 0).unwrap(),
        }
    }

    #[test]
    fn short_page_has_no_next_cursor() {
        let rows = vec![event(30, Uuid::new_v4()), event(20, Uuid::new_v4())];
        let (kept, next) = assemble_page(rows, 5);
        assert_eq!(kept.len(), 2);
        assert!(next.is_none());
    }

    #[test]
    fn exact_page_has_no_next_cursor() {
        let rows = vec![event(30, Uuid::new_v4()), event(20, Uuid::new_v4())];
        let (kept, next) = assemble_page(rows, 2);
        assert_eq!(kept.len(), 2);
        assert!(next.is_none());
    }

    #[test]
    fn extra_row_is_discarded_and_cursor_points_at_last_kept() {
        let keep_a = Uuid::new_v4();
        let keep_b = Uuid::new_v4();
        let extra = Uuid::new_v4();
        let rows = vec![event(30, keep_a), event(20, keep_b), event(10, extra)];

        let (kept, next) = assemble_page(rows, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].id, keep_b);

        let next = next.unwrap();
        assert_eq!(next.id, keep_b);
        assert_eq!(next.created_at, Utc.timestamp_opt(20, 0).unwrap());
    }

    #[test]
    fn limit_clamping() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_LIMIT);
        assert_eq!(clamp_limit(Some(25)), 25);
    }

    #[test]
    fn entity_type_without_id_is_dropped() {
        let query = AuditEventsQuery {
            entity_type: Some(AuditEntityType::Risk),
            ..Default::default()
        };
        assert!(EventFilters::from_query(&query).entity.is_none());

        let query = AuditEventsQuery {
            entity_type: Some(AuditEntityType::Risk),
            entity_id: Some("abc".to_string()),
            ..Default::default()
        };
        let filters = EventFilters::from_query(&query);
        assert_eq!(
            filters.entity,
            Some((AuditEntityType::Risk, "abc".to_string()))
        );
    }
}

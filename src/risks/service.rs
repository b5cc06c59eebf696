//! Transactional coordinators for risk mutations, plus the filtered risk
//! listing. Mutations mirror the control coordinators: one transaction per
//! operation, audit appended on the same connection, full rollback on any
//! error.

use chrono::Utc;
use diesel::prelude::*;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::audit::{self, AuditAction, AuditEntityType, AuditEntry, AuditMeta, FieldChange};
use crate::controls::types::ControlStatus;
use crate::scoring::{risk_level, risk_score};
use crate::shared::schema::{controls, risk_controls, risks};

use super::error::RisksError;
use super::storage::{db_risk_to_view, DbRisk};
use super::types::{
    CreateRiskRequest, LinkedControlSummary, RiskStatus, RiskView, RisksQuery, UpdateRiskRequest,
};

pub fn create_risk(
    conn: &mut PgConnection,
    req: CreateRiskRequest,
    actor_id: Option<Uuid>,
) -> Result<DbRisk, RisksError> {
    let severity = req.severity.unwrap_or(1);
    let likelihood = req.likelihood.unwrap_or(1);
    let impact = req.impact.unwrap_or(1);
    validate_ratings(severity, likelihood, impact)?;

    if req.title.trim().is_empty() {
        return Err(RisksError::Validation("title is required".to_string()));
    }

    conn.transaction(|conn| {
        let now = Utc::now();
        let risk = DbRisk {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            severity,
            likelihood,
            impact,
            status: RiskStatus::Identified.to_string(),
            owner_id: req.owner_id,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(risks::table)
            .values(&risk)
            .execute(conn)?;

        audit::record(
            conn,
            AuditEntry::new(
                AuditAction::Created,
                AuditEntityType::Risk,
                risk.id.to_string(),
            )
            .risk(risk.id)
            .actor(actor_id)
            .meta(AuditMeta::Snapshot {
                snapshot: json!({
                    "title": risk.title,
                    "status": risk.status,
                    "severity": risk.severity,
                    "likelihood": risk.likelihood,
                    "impact": risk.impact,
                }),
            }),
        )?;

        Ok(risk)
    })
}

pub fn update_risk(
    conn: &mut PgConnection,
    id: Uuid,
    req: UpdateRiskRequest,
    actor_id: Option<Uuid>,
) -> Result<DbRisk, RisksError> {
    if let Some(severity) = req.severity {
        validate_rating("severity", severity)?;
    }
    if let Some(likelihood) = req.likelihood {
        validate_rating("likelihood", likelihood)?;
    }
    if let Some(impact) = req.impact {
        validate_rating("impact", impact)?;
    }

    conn.transaction(|conn| {
        let before: DbRisk = risks::table
            .find(id)
            .first(conn)
            .optional()?
            .ok_or_else(|| RisksError::NotFound("Risk not found".to_string()))?;

        let mut after = before.clone();
        if let Some(title) = &req.title {
            after.title = title.clone();
        }
        if let Some(description) = &req.description {
            after.description = description.clone();
        }
        if let Some(severity) = req.severity {
            after.severity = severity;
        }
        if let Some(likelihood) = req.likelihood {
            after.likelihood = likelihood;
        }
        if let Some(impact) = req.impact {
            after.impact = impact;
        }
        if let Some(owner_id) = req.owner_id {
            after.owner_id = Some(owner_id);
        }
        after.updated_at = Utc::now();

        diesel::update(risks::table.find(id))
            .set(&after)
            .execute(conn)?;

        let changes = compute_changes(&before, &after, &req);

        // Only observed transitions are audited; a submitted update whose
        // field values equal the current row produces no event.
        if !changes.is_empty() {
            audit::record(
                conn,
                AuditEntry::new(
                    AuditAction::Updated,
                    AuditEntityType::Risk,
                    after.id.to_string(),
                )
                .risk(after.id)
                .actor(actor_id)
                .meta(AuditMeta::Changes { changes }),
            )?;
        }

        Ok(after)
    })
}

pub fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: RiskStatus,
    actor_id: Option<Uuid>,
) -> Result<DbRisk, RisksError> {
    conn.transaction(|conn| {
        let before: DbRisk = risks::table
            .find(id)
            .first(conn)
            .optional()?
            .ok_or_else(|| RisksError::NotFound("Risk not found".to_string()))?;

        let updated: DbRisk = diesel::update(risks::table.find(id))
            .set((
                risks::status.eq(status.to_string()),
                risks::updated_at.eq(Utc::now()),
            ))
            .get_result(conn)?;

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
                    AuditEntityType::Risk,
                    updated.id.to_string(),
                )
                .risk(updated.id)
                .actor(actor_id)
                .meta(AuditMeta::Changes { changes }),
            )?;
        }

        Ok(updated)
    })
}

pub fn delete_risk(conn: &mut PgConnection, id: Uuid) -> Result<(), RisksError> {
    let exists: Option<Uuid> = risks::table
        .find(id)
        .select(risks::id)
        .first(conn)
        .optional()?;
    if exists.is_none() {
        return Err(RisksError::NotFound("Risk not found".to_string()));
    }

    diesel::delete(risks::table.find(id)).execute(conn)?;
    Ok(())
}

pub fn get_risk(conn: &mut PgConnection, id: Uuid) -> Result<RiskView, RisksError> {
    let risk: DbRisk = risks::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| RisksError::NotFound("Risk not found".to_string()))?;

    let mut links = load_linked_controls(conn, &[risk.id])?;
    let controls = links.remove(&risk.id).unwrap_or_default();
    db_risk_to_view(risk, controls)
}

pub fn list_risks(
    conn: &mut PgConnection,
    query: &RisksQuery,
) -> Result<Vec<RiskView>, RisksError> {
    let mut db_query = risks::table.into_boxed();

    if let Some(status) = query.status {
        db_query = db_query.filter(risks::status.eq(status.to_string()));
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        db_query = db_query.filter(
            risks::title
                .ilike(pattern.clone())
                .or(risks::description.ilike(pattern)),
        );
    }

    let descending = query.sort_dir.as_deref() != Some("asc");
    db_query = match (query.sort_key.as_deref().unwrap_or("score"), descending) {
        ("title", false) => db_query.order(risks::title.asc()),
        ("title", true) => db_query.order(risks::title.desc()),
        ("status", false) => db_query.order(risks::status.asc()),
        ("status", true) => db_query.order(risks::status.desc()),
        // Score ordering approximated by its factors; severity dominates.
        (_, false) => db_query.order((risks::severity.asc(), risks::likelihood.asc())),
        (_, true) => db_query.order((risks::severity.desc(), risks::likelihood.desc())),
    };

    let take = query.take.unwrap_or(50).clamp(1, 200);
    let skip = query.skip.unwrap_or(0).max(0);

    let rows: Vec<DbRisk> = db_query.offset(skip).limit(take).load(conn)?;

    let rows: Vec<DbRisk> = rows
        .into_iter()
        .filter(|r| {
            passes_score_filters(
                risk_score(r.severity, r.likelihood),
                query.min_score,
                query.max_score,
                query.level,
            )
        })
        .collect();

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut links = load_linked_controls(conn, &ids)?;

    rows.into_iter()
        .map(|risk| {
            let controls = links.remove(&risk.id).unwrap_or_default();
            db_risk_to_view(risk, controls)
        })
        .collect()
}

/// Derived-score filters are applied after the database load since the
/// score is computed, not stored.
pub fn passes_score_filters(
    score: i32,
    min_score: Option<i32>,
    max_score: Option<i32>,
    level: Option<crate::scoring::RiskLevel>,
) -> bool {
    if let Some(min) = min_score {
        if score < min {
            return false;
        }
    }
    if let Some(max) = max_score {
        if score > max {
            return false;
        }
    }
    if let Some(level) = level {
        if risk_level(score) != level {
            return false;
        }
    }
    true
}

/// Per-field audit diff for a risk update, restricted to fields the caller
/// actually submitted and that actually changed.
pub fn compute_changes(
    before: &DbRisk,
    after: &DbRisk,
    req: &UpdateRiskRequest,
) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();

    if req.title.is_some() && before.title != after.title {
        changes.insert(
            "title".to_string(),
            FieldChange {
                from: json!(before.title),
                to: json!(after.title),
            },
        );
    }
    if req.description.is_some() && before.description != after.description {
        changes.insert(
            "description".to_string(),
            FieldChange {
                from: json!(before.description),
                to: json!(after.description),
            },
        );
    }
    if req.severity.is_some() && before.severity != after.severity {
        changes.insert(
            "severity".to_string(),
            FieldChange {
                from: json!(before.severity),
                to: json!(after.severity),
            },
        );
    }
    if req.likelihood.is_some() && before.likelihood != after.likelihood {
        changes.insert(
            "likelihood".to_string(),
            FieldChange {
                from: json!(before.likelihood),
                to: json!(after.likelihood),
            },
        );
    }
    if req.impact.is_some() && before.impact != after.impact {
        changes.insert(
            "impact".to_string(),
            FieldChange {
                from: json!(before.impact),
                to: json!(after.impact),
            },
        );
    }

    changes
}

fn validate_rating(name: &str, value: i32) -> Result<(), RisksError> {
    if !(1..=5).contains(&value) {
        return Err(RisksError::Validation(format!(
            "{name} must be between 1 and 5"
        )));
    }
    Ok(())
}

fn validate_ratings(severity: i32, likelihood: i32, impact: i32) -> Result<(), RisksError> {
    validate_rating("severity", severity)?;
    validate_rating("likelihood", likelihood)?;
    validate_rating("impact", impact)
}

pub(super) fn load_linked_controls(
    conn: &mut PgConnection,
    risk_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<LinkedControlSummary>>, RisksError> {
    if risk_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, Uuid, String, String, String, Option<String>)> = risk_controls::table
        .inner_join(controls::table)
        .filter(risk_controls::risk_id.eq_any(risk_ids))
        .select((
            risk_controls::risk_id,
            controls::id,
            controls::code,
            controls::title,
            controls::status,
            controls::category,
        ))
        .load(conn)?;

    let mut map: HashMap<Uuid, Vec<LinkedControlSummary>> = HashMap::new();
    for (risk_id, id, code, title, status, category) in rows {
        let status: ControlStatus = status
            .parse()
            .map_err(|e| RisksError::Internal(format!("control {id}: {e}")))?;
        map.entry(risk_id).or_default().push(LinkedControlSummary {
            id,
            code,
            title,
            status,
            category,
        });
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RiskLevel;
    use chrono::Utc;

    fn risk(severity: i32, likelihood: i32) -> DbRisk {
        let now = Utc::now();
        DbRisk {
            id: Uuid::new_v4(),
            title: "Unpatched servers".to_string(),
            description: "Public-facing hosts behind on patches".to_string(),
            severity,
            likelihood,
            impact: 3,
            status: "IDENTIFIED".to_string(),
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn score_filters() {
        assert!(passes_score_filters(12, None, None, None));
        assert!(passes_score_filters(12, Some(10), Some(15), None));
        assert!(!passes_score_filters(9, Some(10), None, None));
        assert!(!passes_score_filters(16, None, Some(15), None));
        assert!(passes_score_filters(12, None, None, Some(RiskLevel::Medium)));
        assert!(!passes_score_filters(12, None, None, Some(RiskLevel::High)));
    }

    #[test]
    fn changes_restricted_to_submitted_fields() {
        let before = risk(4, 3);
        let mut after = before.clone();
        after.severity = 5;
        after.title = "Renamed".to_string();

        // severity submitted and changed; title changed but not submitted
        let req = UpdateRiskRequest {
            severity: Some(5),
            ..Default::default()
        };
        let changes = compute_changes(&before, &after, &req);

        assert_eq!(changes.len(), 1);
        let change = &changes["severity"];
        assert_eq!(change.from, serde_json::json!(4));
        assert_eq!(change.to, serde_json::json!(5));
    }

    #[test]
    fn no_op_update_produces_no_changes() {
        let before = risk(4, 3);
        let after = before.clone();
        let req = UpdateRiskRequest {
            severity: Some(4),
            likelihood: Some(3),
            title: Some(before.title.clone()),
            ..Default::default()
        };

        assert!(compute_changes(&before, &after, &req).is_empty());
    }

    #[test]
    fn rating_validation_bounds() {
        assert!(validate_ratings(1, 1, 1).is_ok());
        assert!(validate_ratings(5, 5, 5).is_ok());
        assert!(validate_ratings(0, 3, 3).is_err());
        assert!(validate_ratings(3, 6, 3).is_err());
        assert!(validate_ratings(3, 3, -1).is_err());
    }
}

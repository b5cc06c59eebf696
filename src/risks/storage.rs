use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::{risk_level, risk_score};
use crate::shared::schema::{risk_controls, risks};

use super::error::RisksError;
use super::types::{LinkedControlSummary, RiskStatus, RiskView};

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = risks)]
pub struct DbRisk {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: i32,
    pub likelihood: i32,
    pub impact: i32,
    pub status: String,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = risk_controls)]
pub struct DbRiskControl {
    pub risk_id: Uuid,
    pub control_id: Uuid,
}

/// Attaches the derived score and level; a stored status outside the
/// vocabulary is an error, not a silent relabel.
pub fn db_risk_to_view(
    db: DbRisk,
    controls: Vec<LinkedControlSummary>,
) -> Result<RiskView, RisksError> {
    let status: RiskStatus = db
        .status
        .parse()
        .map_err(|e| RisksError::Internal(format!("risk {}: {e}", db.id)))?;
    let score = risk_score(db.severity, db.likelihood);

    Ok(RiskView {
        id: db.id,
        title: db.title,
        description: db.description,
        severity: db.severity,
        likelihood: db.likelihood,
        impact: db.impact,
        status,
        owner_id: db.owner_id,
        score,
        level: risk_level(score),
        controls,
        created_at: db.created_at,
        updated_at: db.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RiskLevel;

    fn risk(status: &str) -> DbRisk {
        let now = Utc::now();
        DbRisk {
            id: Uuid::new_v4(),
            title: "Unpatched servers".to_string(),
            description: String::new(),
            severity: 4,
            likelihood: 4,
            impact: 3,
            status: status.to_string(),
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn view_carries_derived_score_and_level() {
        let view = db_risk_to_view(risk("ASSESSED"), Vec::new()).unwrap();
        assert_eq!(view.status, RiskStatus::Assessed);
        assert_eq!(view.score, 16);
        assert_eq!(view.level, RiskLevel::High);
    }

    #[test]
    fn unknown_status_is_an_error() {
        assert!(matches!(
            db_risk_to_view(risk("OPEN"), Vec::new()),
            Err(RisksError::Internal(_))
        ));
    }
}

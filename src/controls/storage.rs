use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::schema::{control_evidence, controls};

use super::error::ControlsError;
use super::types::{ControlStatus, ControlView, EvidenceType, EvidenceView};

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = controls)]
pub struct DbControl {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub category: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = control_evidence)]
pub struct DbEvidence {
    pub id: Uuid,
    pub control_id: Uuid,
    pub evidence_type: String,
    pub note: Option<String>,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored status strings outside the vocabulary surface as errors instead
/// of being relabeled to a default.
pub fn db_control_to_view(db: DbControl) -> Result<ControlView, ControlsError> {
    let status: ControlStatus = db
        .status
        .parse()
        .map_err(|e| ControlsError::Internal(format!("control {}: {e}", db.id)))?;

    Ok(ControlView {
        id: db.id,
        code: db.code,
        title: db.title,
        description: db.description,
        status,
        category: db.category,
        owner_id: db.owner_id,
        created_at: db.created_at,
        updated_at: db.updated_at,
    })
}

pub fn db_evidence_to_view(db: DbEvidence) -> Result<EvidenceView, ControlsError> {
    let evidence_type: EvidenceType = db
        .evidence_type
        .parse()
        .map_err(|e| ControlsError::Internal(format!("evidence {}: {e}", db.id)))?;

    Ok(EvidenceView {
        id: db.id,
        control_id: db.control_id,
        evidence_type,
        note: db.note,
        link: db.link,
        created_at: db.created_at,
    })
}

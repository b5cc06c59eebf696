use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// State transitions the register records. Entity deletion is absent on
/// purpose: control and risk rows are removed without an audit counterpart,
/// while evidence removal is tracked through EVIDENCE_DELETED.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Created,
    Updated,
    StatusChanged,
    EvidenceCreated,
    EvidenceDeleted,
    RiskControlLinked,
    RiskControlUnlinked,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::EvidenceCreated => "EVIDENCE_CREATED",
            Self::EvidenceDeleted => "EVIDENCE_DELETED",
            Self::RiskControlLinked => "RISK_CONTROL_LINKED",
            Self::RiskControlUnlinked => "RISK_CONTROL_UNLINKED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "UPDATED" => Ok(Self::Updated),
            "STATUS_CHANGED" => Ok(Self::StatusChanged),
            "EVIDENCE_CREATED" => Ok(Self::EvidenceCreated),
            "EVIDENCE_DELETED" => Ok(Self::EvidenceDeleted),
            "RISK_CONTROL_LINKED" => Ok(Self::RiskControlLinked),
            "RISK_CONTROL_UNLINKED" => Ok(Self::RiskControlUnlinked),
            _ => Err(format!("Unknown audit action: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntityType {
    Control,
    Risk,
    Evidence,
}

impl std::fmt::Display for AuditEntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Control => "CONTROL",
            Self::Risk => "RISK",
            Self::Evidence => "EVIDENCE",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AuditEntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONTROL" => Ok(Self::Control),
            "RISK" => Ok(Self::Risk),
            "EVIDENCE" => Ok(Self::Evidence),
            _ => Err(format!("Unknown audit entity type: {s}")),
        }
    }
}

/// One field transition inside an UPDATED / STATUS_CHANGED payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    pub from: serde_json::Value,
    pub to: serde_json::Value,
}

/// Structured audit payload, one shape per action family. Serialized
/// untagged so the stored JSON carries only the payload keys
/// (`{"snapshot": ...}`, `{"changes": ...}`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AuditMeta {
    Snapshot {
        snapshot: serde_json::Value,
    },
    Changes {
        changes: BTreeMap<String, FieldChange>,
    },
    #[serde(rename_all = "camelCase")]
    Link {
        control_id: Uuid,
        control_code: String,
        control_title: String,
    },
    #[serde(rename_all = "camelCase")]
    BulkDelete {
        bulk: bool,
        deleted_count: i64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventView {
    pub id: Uuid,
    pub action: AuditAction,
    pub entity_type: AuditEntityType,
    pub entity_id: String,
    pub control_id: Option<Uuid>,
    pub risk_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub items: Vec<AuditEventView>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventsQuery {
    pub control_id: Option<Uuid>,
    pub risk_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub entity_type: Option<AuditEntityType>,
    pub entity_id: Option<String>,
    pub limit: Option<i64>,
    /// Alias for `limit`, kept for dashboard callers.
    pub take: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEventsQuery {
    pub take: Option<i64>,
    pub cursor: Option<String>,
}

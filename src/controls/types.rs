use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlStatus {
    NotStarted,
    InProgress,
    Implemented,
    NotApplicable,
}

impl std::fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Implemented => "IMPLEMENTED",
            Self::NotApplicable => "NOT_APPLICABLE",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ControlStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(Self::NotStarted),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "IMPLEMENTED" => Ok(Self::Implemented),
            "NOT_APPLICABLE" => Ok(Self::NotApplicable),
            _ => Err(format!("Unknown control status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceType {
    Note,
    Link,
}

impl std::fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Note => "NOTE",
            Self::Link => "LINK",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EvidenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOTE" => Ok(Self::Note),
            "LINK" => Ok(Self::Link),
            _ => Err(format!("Unknown evidence type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlView {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub status: ControlStatus,
    pub category: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceView {
    pub id: Uuid,
    pub control_id: Uuid,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub note: Option<String>,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateControlRequest {
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to NOT_STARTED when omitted.
    pub status: Option<ControlStatus>,
    pub category: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateControlStatusRequest {
    pub status: ControlStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvidenceRequest {
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub note: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsQuery {
    /// Matches code or title, case-insensitive.
    pub search: Option<String>,
    pub category: Option<String>,
    /// Comma-separated status list.
    pub status: Option<String>,
    pub sort_key: Option<String>,
    pub sort_dir: Option<String>,
    pub take: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub ok: bool,
    pub deleted_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub ok: bool,
    pub deleted_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessBreakdown {
    pub implemented: i64,
    pub in_progress: i64,
    pub not_started: i64,
    pub not_applicable: i64,
    pub total: i64,
    pub total_applicable: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessByStatus {
    pub status: ControlStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub score: f64,
    pub score_percent: i64,
    pub breakdown: ReadinessBreakdown,
    pub by_status: Vec<ReadinessByStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReadiness {
    pub category: String,
    pub score: f64,
    pub score_percent: i64,
    pub breakdown: ReadinessBreakdown,
}

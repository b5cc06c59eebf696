use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::controls::types::ControlStatus;
use crate::scoring::RiskLevel;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskStatus {
    Identified,
    Assessed,
    Mitigated,
    Accepted,
    Closed,
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Identified => "IDENTIFIED",
            Self::Assessed => "ASSESSED",
            Self::Mitigated => "MITIGATED",
            Self::Accepted => "ACCEPTED",
            Self::Closed => "CLOSED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RiskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDENTIFIED" => Ok(Self::Identified),
            "ASSESSED" => Ok(Self::Assessed),
            "MITIGATED" => Ok(Self::Mitigated),
            "ACCEPTED" => Ok(Self::Accepted),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(format!("Unknown risk status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedControlSummary {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub status: ControlStatus,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: i32,
    pub likelihood: i32,
    pub impact: i32,
    pub status: RiskStatus,
    pub owner_id: Option<Uuid>,
    pub score: i32,
    pub level: RiskLevel,
    pub controls: Vec<LinkedControlSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRiskRequest {
    pub title: String,
    pub description: String,
    /// Ratings default to 1 when omitted; each must be in 1..=5.
    pub severity: Option<i32>,
    pub likelihood: Option<i32>,
    pub impact: Option<i32>,
    pub owner_id: Option<Uuid>,
}

/// Partial update; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRiskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<i32>,
    pub likelihood: Option<i32>,
    pub impact: Option<i32>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRiskStatusRequest {
    pub status: RiskStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RisksQuery {
    pub status: Option<RiskStatus>,
    /// Matches title or description, case-insensitive.
    pub search: Option<String>,
    pub min_score: Option<i32>,
    pub max_score: Option<i32>,
    pub level: Option<RiskLevel>,
    pub sort_key: Option<String>,
    pub sort_dir: Option<String>,
    pub take: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRiskResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_status_round_trips() {
        for status in [
            RiskStatus::Identified,
            RiskStatus::Assessed,
            RiskStatus::Mitigated,
            RiskStatus::Accepted,
            RiskStatus::Closed,
        ] {
            assert_eq!(status.to_string().parse::<RiskStatus>().unwrap(), status);
        }
        assert!("OPEN".parse::<RiskStatus>().is_err());
    }
}

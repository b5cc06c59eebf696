use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::scoring::RiskLevel;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub controls: ControlStats,
    pub risks: RiskStats,
    pub audit: AuditStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub with_evidence: i64,
    pub evidence_coverage_percent: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_level: LevelCounts,
    pub top_risks: Vec<TopRisk>,
    pub without_mitigations: i64,
    pub critical_without_mitigations: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LevelCounts {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopRisk {
    pub id: Uuid,
    pub title: String,
    pub score: i32,
    pub level: RiskLevel,
    pub mitigations: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_events: i64,
    #[serde(rename = "last24h")]
    pub last_24h: i64,
}

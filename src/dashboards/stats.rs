//! Dashboard aggregation. Row fetches are thin; the counting itself lives in
//! pure helpers so it can be tested without a database.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

use crate::scoring::{risk_level, risk_score, RiskLevel};
use crate::shared::schema::{audit_events, control_evidence, controls, risk_controls, risks};

use super::error::DashboardsError;
use super::types::{AuditStats, ControlStats, DashboardStats, LevelCounts, RiskStats, TopRisk};

pub const TOP_RISK_COUNT: usize = 5;

pub fn gather_stats(conn: &mut PgConnection) -> Result<DashboardStats, DashboardsError> {
    let control_rows: Vec<(Uuid, String)> =
        controls::table.select((controls::id, controls::status)).load(conn)?;
    let evidenced: Vec<Uuid> = control_evidence::table
        .select(control_evidence::control_id)
        .distinct()
        .load(conn)?;

    let risk_rows: Vec<(Uuid, String, i32, i32, String)> = risks::table
        .select((
            risks::id,
            risks::title,
            risks::severity,
            risks::likelihood,
            risks::status,
        ))
        .load(conn)?;
    let link_rows: Vec<Uuid> = risk_controls::table.select(risk_controls::risk_id).load(conn)?;

    let total_events: i64 = audit_events::table.count().get_result(conn)?;
    let since = Utc::now() - Duration::hours(24);
    let last_24h: i64 = audit_events::table
        .filter(audit_events::created_at.ge(since))
        .count()
        .get_result(conn)?;

    Ok(DashboardStats {
        controls: build_control_stats(&control_rows, &evidenced),
        risks: build_risk_stats(&risk_rows, &link_rows),
        audit: AuditStats {
            total_events,
            last_24h,
        },
    })
}

pub fn build_control_stats(rows: &[(Uuid, String)], evidenced: &[Uuid]) -> ControlStats {
    let mut by_status: BTreeMap<String, i64> = BTreeMap::new();
    for (_, status) in rows {
        *by_status.entry(status.clone()).or_insert(0) += 1;
    }

    let evidenced: HashSet<&Uuid> = evidenced.iter().collect();
    let with_evidence = rows.iter().filter(|(id, _)| evidenced.contains(id)).count() as i64;

    let total = rows.len() as i64;
    let evidence_coverage_percent = if total > 0 {
        ((with_evidence as f64 / total as f64) * 100.0).round() as i64
    } else {
        0
    };

    ControlStats {
        total,
        by_status,
        with_evidence,
        evidence_coverage_percent,
    }
}

pub fn build_risk_stats(rows: &[(Uuid, String, i32, i32, String)], links: &[Uuid]) -> RiskStats {
    let mut mitigations: HashMap<Uuid, i64> = HashMap::new();
    for risk_id in links {
        *mitigations.entry(*risk_id).or_insert(0) += 1;
    }

    let mut by_status: BTreeMap<String, i64> = BTreeMap::new();
    let mut by_level = LevelCounts::default();
    let mut without_mitigations = 0;
    let mut critical_without_mitigations = 0;
    let mut top: Vec<TopRisk> = Vec::with_capacity(rows.len());

    for (id, title, severity, likelihood, status) in rows {
        *by_status.entry(status.clone()).or_insert(0) += 1;

        let score = risk_score(*severity, *likelihood);
        let level = risk_level(score);
        match level {
            RiskLevel::Critical => by_level.critical += 1,
            RiskLevel::High => by_level.high += 1,
            RiskLevel::Medium => by_level.medium += 1,
            RiskLevel::Low => by_level.low += 1,
        }

        let mitigation_count = mitigations.get(id).copied().unwrap_or(0);
        if mitigation_count == 0 {
            without_mitigations += 1;
            if matches!(level, RiskLevel::Critical | RiskLevel::High) {
                critical_without_mitigations += 1;
            }
        }

        top.push(TopRisk {
            id: *id,
            title: title.clone(),
            score,
            level,
            mitigations: mitigation_count,
        });
    }

    top.sort_by(|a, b| b.score.cmp(&a.score));
    top.truncate(TOP_RISK_COUNT);

    RiskStats {
        total: rows.len() as i64,
        by_status,
        by_level,
        top_risks: top,
        without_mitigations,
        critical_without_mitigations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(sev: i32, lik: i32, status: &str) -> (Uuid, String, i32, i32, String) {
        (Uuid::new_v4(), "r".to_string(), sev, lik, status.to_string())
    }

    #[test]
    fn control_stats_count_coverage() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let rows = vec![
            (a, "IMPLEMENTED".to_string()),
            (b, "NOT_STARTED".to_string()),
            (c, "NOT_STARTED".to_string()),
        ];
        let stats = build_control_stats(&rows, &[a]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.with_evidence, 1);
        assert_eq!(stats.evidence_coverage_percent, 33);
        assert_eq!(stats.by_status.get("NOT_STARTED"), Some(&2));
    }

    #[test]
    fn control_stats_empty_register() {
        let stats = build_control_stats(&[], &[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.evidence_coverage_percent, 0);
    }

    #[test]
    fn coverage_percent_rounds_half_up() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rows = vec![
            (a, "IMPLEMENTED".to_string()),
            (b, "IMPLEMENTED".to_string()),
        ];
        let stats = build_control_stats(&rows, &[a]);
        assert_eq!(stats.evidence_coverage_percent, 50);
    }

    #[test]
    fn risk_stats_bucket_by_level() {
        let rows = vec![
            risk(1, 1, "IDENTIFIED"),
            risk(3, 3, "IDENTIFIED"),
            risk(4, 4, "ASSESSED"),
            risk(5, 5, "ASSESSED"),
        ];
        let stats = build_risk_stats(&rows, &[]);
        assert_eq!(stats.by_level.low, 1);
        assert_eq!(stats.by_level.medium, 1);
        assert_eq!(stats.by_level.high, 1);
        assert_eq!(stats.by_level.critical, 1);
        assert_eq!(stats.by_status.get("IDENTIFIED"), Some(&2));
    }

    #[test]
    fn unmitigated_counters_track_linkage() {
        let linked = risk(5, 5, "IDENTIFIED");
        let unlinked_critical = risk(5, 5, "IDENTIFIED");
        let unlinked_high = risk(4, 4, "IDENTIFIED");
        let unlinked_low = risk(1, 1, "IDENTIFIED");
        let links = vec![linked.0];
        let rows = vec![linked, unlinked_critical, unlinked_high, unlinked_low];
        let stats = build_risk_stats(&rows, &links);
        assert_eq!(stats.without_mitigations, 3);
        assert_eq!(stats.critical_without_mitigations, 2);
    }

    #[test]
    fn top_risks_capped_and_sorted() {
        let rows: Vec<_> = (1..=5).map(|s| risk(s, 5, "IDENTIFIED")).collect();
        let mut rows = rows;
        rows.push(risk(1, 1, "IDENTIFIED"));
        rows.push(risk(2, 1, "IDENTIFIED"));
        let stats = build_risk_stats(&rows, &[]);
        assert_eq!(stats.top_risks.len(), TOP_RISK_COUNT);
        assert_eq!(stats.top_risks[0].score, 25);
        assert!(stats
            .top_risks
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn mitigation_counts_per_risk() {
        let r = risk(3, 3, "MITIGATED");
        let links = vec![r.0, r.0, r.0];
        let stats = build_risk_stats(&[r], &links);
        assert_eq!(stats.top_risks[0].mitigations, 3);
        assert_eq!(stats.without_mitigations, 0);
    }
}

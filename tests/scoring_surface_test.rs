//! Every surface that reports a risk level (risk views, list filters, the
//! dashboard buckets) must agree with the scoring engine. A drift between
//! any two of them would present the same risk differently in different
//! endpoints.

use chrono::Utc;
use uuid::Uuid;

use regserver::dashboards::stats::build_risk_stats;
use regserver::risks::service::passes_score_filters;
use regserver::risks::storage::{db_risk_to_view, DbRisk};
use regserver::scoring::{risk_level, risk_score, RiskLevel};

fn db_risk(severity: i32, likelihood: i32) -> DbRisk {
    let now = Utc::now();
    DbRisk {
        id: Uuid::new_v4(),
        title: "Unpatched edge device".to_string(),
        description: String::new(),
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
fn view_level_matches_scoring_engine() {
    for severity in 1..=5 {
        for likelihood in 1..=5 {
            let view = db_risk_to_view(db_risk(severity, likelihood), Vec::new()).unwrap();
            assert_eq!(view.score, risk_score(severity, likelihood));
            assert_eq!(view.level, risk_level(view.score));
        }
    }
}

#[test]
fn level_filter_matches_scoring_engine() {
    for severity in 1..=5 {
        for likelihood in 1..=5 {
            let score = risk_score(severity, likelihood);
            let level = risk_level(score);
            assert!(passes_score_filters(score, None, None, Some(level)));
            for other in [
                RiskLevel::Low,
                RiskLevel::Medium,
                RiskLevel::High,
                RiskLevel::Critical,
            ] {
                if other != level {
                    assert!(!passes_score_filters(score, None, None, Some(other)));
                }
            }
        }
    }
}

#[test]
fn dashboard_buckets_match_scoring_engine() {
    let rows: Vec<(Uuid, String, i32, i32, String)> = (1..=5)
        .flat_map(|s| (1..=5).map(move |l| (Uuid::new_v4(), "r".to_string(), s, l, "IDENTIFIED".to_string())))
        .collect();

    let stats = build_risk_stats(&rows, &[]);
    let mut expected = [0i64; 4];
    for (_, _, s, l, _) in &rows {
        match risk_level(risk_score(*s, *l)) {
            RiskLevel::Low => expected[0] += 1,
            RiskLevel::Medium => expected[1] += 1,
            RiskLevel::High => expected[2] += 1,
            RiskLevel::Critical => expected[3] += 1,
        }
    }
    assert_eq!(stats.by_level.low, expected[0]);
    assert_eq!(stats.by_level.medium, expected[1]);
    assert_eq!(stats.by_level.high, expected[2]);
    assert_eq!(stats.by_level.critical, expected[3]);
    assert_eq!(
        stats.top_risks.first().map(|r| r.score),
        Some(25),
    );
}

#[test]
fn boundary_scores_sit_in_documented_buckets() {
    assert_eq!(risk_level(6), RiskLevel::Low);
    assert_eq!(risk_level(7), RiskLevel::Medium);
    assert_eq!(risk_level(12), RiskLevel::Medium);
    // 13..=20 only contains the products 15, 16 and 20, but the bucket is
    // defined over the whole range.
    assert_eq!(risk_level(13), RiskLevel::High);
    assert_eq!(risk_level(20), RiskLevel::High);
    assert_eq!(risk_level(21), RiskLevel::Critical);
    assert_eq!(risk_level(25), RiskLevel::Critical);
}

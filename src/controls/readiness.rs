//! Readiness aggregation: overall and per-category scores over the
//! register's control statuses. Read-only; rows are folded into counts in
//! process and handed to the scoring engine.

use diesel::prelude::*;
use std::collections::BTreeMap;

use crate::scoring::{readiness_score, score_percent, StatusCounts};
use crate::shared::schema::controls;

use super::error::ControlsError;
use super::types::{
    CategoryReadiness, ControlStatus, ReadinessBreakdown, ReadinessByStatus, ReadinessResponse,
};

const UNCATEGORIZED: &str = "Uncategorized";

pub fn get_readiness(conn: &mut PgConnection) -> Result<ReadinessResponse, ControlsError> {
    let statuses: Vec<String> = controls::table.select(controls::status).load(conn)?;
    let counts = fold_counts(statuses.iter().map(String::as_str));

    Ok(build_readiness(&counts))
}

pub fn get_readiness_by_category(
    conn: &mut PgConnection,
) -> Result<Vec<CategoryReadiness>, ControlsError> {
    let rows: Vec<(Option<String>, String)> = controls::table
        .select((controls::category, controls::status))
        .load(conn)?;

    Ok(build_category_readiness(rows))
}

pub fn build_readiness(counts: &StatusCounts) -> ReadinessResponse {
    let score = readiness_score(counts);

    ReadinessResponse {
        score,
        score_percent: score_percent(score),
        breakdown: breakdown(counts),
        by_status: vec![
            ReadinessByStatus {
                status: ControlStatus::Implemented,
                count: counts.implemented,
            },
            ReadinessByStatus {
                status: ControlStatus::InProgress,
                count: counts.in_progress,
            },
            ReadinessByStatus {
                status: ControlStatus::NotStarted,
                count: counts.not_started,
            },
            ReadinessByStatus {
                status: ControlStatus::NotApplicable,
                count: counts.not_applicable,
            },
        ],
    }
}

pub fn build_category_readiness(rows: Vec<(Option<String>, String)>) -> Vec<CategoryReadiness> {
    let mut by_category: BTreeMap<String, StatusCounts> = BTreeMap::new();

    for (category, status) in rows {
        let category = category.unwrap_or_else(|| UNCATEGORIZED.to_string());
        let counts = by_category.entry(category).or_default();
        bump(counts, &status);
    }

    let mut result: Vec<CategoryReadiness> = by_category
        .into_iter()
        .map(|(category, counts)| {
            let score = readiness_score(&counts);
            CategoryReadiness {
                category,
                score,
                score_percent: score_percent(score),
                breakdown: breakdown(&counts),
            }
        })
        .collect();

    // BTreeMap already yields alphabetical order; only the Uncategorized
    // bucket has to move to the end.
    result.sort_by(|a, b| {
        let a_last = a.category == UNCATEGORIZED;
        let b_last = b.category == UNCATEGORIZED;
        a_last.cmp(&b_last).then_with(|| a.category.cmp(&b.category))
    });

    result
}

fn fold_counts<'a>(statuses: impl Iterator<Item = &'a str>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for status in statuses {
        bump(&mut counts, status);
    }
    counts
}

fn bump(counts: &mut StatusCounts, status: &str) {
    match status.parse::<ControlStatus>() {
        Ok(ControlStatus::Implemented) => counts.implemented += 1,
        Ok(ControlStatus::InProgress) => counts.in_progress += 1,
        Ok(ControlStatus::NotApplicable) => counts.not_applicable += 1,
        // Unknown strings cannot enter through the API; counting them as
        // not-started keeps the denominator honest if one ever appears.
        Ok(ControlStatus::NotStarted) | Err(_) => counts.not_started += 1,
    }
}

fn breakdown(counts: &StatusCounts) -> ReadinessBreakdown {
    ReadinessBreakdown {
        implemented: counts.implemented,
        in_progress: counts.in_progress,
        not_started: counts.not_started,
        not_applicable: counts.not_applicable,
        total: counts.total(),
        total_applicable: counts.applicable(),
    }
}

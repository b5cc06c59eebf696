//! Risk scoring: `severity * likelihood` bucketed into a level.
//!
//! The impact rating is recorded on risks but intentionally not part of the
//! score. One bucketing is canonical for the whole service; the risk query
//! filter and the dashboard aggregation both call [`risk_level`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown risk level: {s}")),
        }
    }
}

/// Risk score in 1..=25 for ratings in 1..=5.
pub fn risk_score(severity: i32, likelihood: i32) -> i32 {
    severity * likelihood
}

/// Canonical bucketing: low <= 6, medium 7..=12, high 13..=20, critical >= 21.
pub fn risk_level(score: i32) -> RiskLevel {
    if score <= 6 {
        RiskLevel::Low
    } else if score <= 12 {
        RiskLevel::Medium
    } else if score <= 20 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_severity_times_likelihood() {
        assert_eq!(risk_score(5, 4), 20);
        assert_eq!(risk_score(1, 1), 1);
        assert_eq!(risk_score(5, 5), 25);
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(risk_level(1), RiskLevel::Low);
        assert_eq!(risk_level(6), RiskLevel::Low);
        assert_eq!(risk_level(7), RiskLevel::Medium);
        assert_eq!(risk_level(12), RiskLevel::Medium);
        assert_eq!(risk_level(13), RiskLevel::High);
        assert_eq!(risk_level(20), RiskLevel::High);
        assert_eq!(risk_level(21), RiskLevel::Critical);
        assert_eq!(risk_level(25), RiskLevel::Critical);
    }

    #[test]
    fn five_by_four_is_high_not_critical() {
        assert_eq!(risk_level(risk_score(5, 4)), RiskLevel::High);
    }

    #[test]
    fn max_ratings_are_critical() {
        assert_eq!(risk_level(risk_score(5, 5)), RiskLevel::Critical);
    }

    #[test]
    fn level_round_trips_through_strings() {
        for level in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            assert_eq!(level.to_string().parse::<RiskLevel>().unwrap(), level);
        }
        assert!("severe".parse::<RiskLevel>().is_err());
    }
}

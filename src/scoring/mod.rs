pub mod readiness;
pub mod risk;

pub use readiness::{readiness_score, score_percent, StatusCounts};
pub use risk::{risk_level, risk_score, RiskLevel};

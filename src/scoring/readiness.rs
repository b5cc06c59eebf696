//! Readiness scoring over control status counts.
//!
//! The score is the weighted fraction of applicable controls considered
//! implemented: IMPLEMENTED counts fully, IN_PROGRESS counts half, and
//! NOT_APPLICABLE controls are excluded from the denominator. The result is
//! clamped to [0, 1] and rounded to 4 decimal places so that any two
//! evaluations over the same counts yield the same bits.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub implemented: i64,
    pub in_progress: i64,
    pub not_started: i64,
    pub not_applicable: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.implemented + self.in_progress + self.not_started + self.not_applicable
    }

    /// Controls that count toward the readiness denominator.
    pub fn applicable(&self) -> i64 {
        self.implemented + self.in_progress + self.not_started
    }
}

/// Readiness score in [0, 1], rounded to 4 decimal places.
pub fn readiness_score(counts: &StatusCounts) -> f64 {
    let applicable = counts.applicable();
    if applicable == 0 {
        return 0.0;
    }

    let achieved = counts.implemented as f64 + 0.5 * counts.in_progress as f64;
    let raw = achieved / applicable as f64;
    (round4(raw)).clamp(0.0, 1.0)
}

/// Integer percentage view of a readiness score.
pub fn score_percent(score: f64) -> i64 {
    (score * 100.0).round() as i64
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(implemented: i64, in_progress: i64, not_started: i64, not_applicable: i64) -> StatusCounts {
        StatusCounts {
            implemented,
            in_progress,
            not_started,
            not_applicable,
        }
    }

    #[test]
    fn empty_set_scores_zero() {
        assert_eq!(readiness_score(&StatusCounts::default()), 0.0);
    }

    #[test]
    fn only_not_applicable_scores_zero() {
        assert_eq!(readiness_score(&counts(0, 0, 0, 7)), 0.0);
    }

    #[test]
    fn all_implemented_scores_one() {
        assert_eq!(readiness_score(&counts(12, 0, 0, 0)), 1.0);
        assert_eq!(score_percent(1.0), 100);
    }

    #[test]
    fn mixed_set_scores_three_quarters() {
        // 2 implemented + 2 in progress: (2 + 1) / 4
        assert_eq!(readiness_score(&counts(2, 2, 0, 0)), 0.75);
        assert_eq!(score_percent(0.75), 75);
    }

    #[test]
    fn not_applicable_excluded_from_denominator() {
        // 1 implemented + 1 not started, 5 N/A ignored
        assert_eq!(readiness_score(&counts(1, 0, 1, 5)), 0.5);
    }

    #[test]
    fn result_is_rounded_to_four_decimals() {
        // 1 / 3 = 0.3333...
        assert_eq!(readiness_score(&counts(1, 0, 2, 0)), 0.3333);
        // 2 / 3 = 0.6666... rounds up
        assert_eq!(readiness_score(&counts(2, 0, 1, 0)), 0.6667);
    }

    #[test]
    fn in_progress_counts_half() {
        assert_eq!(readiness_score(&counts(0, 1, 0, 0)), 0.5);
        assert_eq!(readiness_score(&counts(0, 3, 1, 0)), 0.375);
    }

    #[test]
    fn percent_rounds_to_nearest_integer() {
        assert_eq!(score_percent(0.3333), 33);
        assert_eq!(score_percent(0.6667), 67);
        assert_eq!(score_percent(0.005), 1);
        assert_eq!(score_percent(0.0), 0);
    }

    #[test]
    fn totals_and_applicable() {
        let c = counts(1, 2, 3, 4);
        assert_eq!(c.total(), 10);
        assert_eq!(c.applicable(), 6);
    }
}

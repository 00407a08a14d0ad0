use crate::model::TaskResult;
use serde::Serialize;

/// Spread of per-task readiness scores for one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadinessSpread {
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub lowest: f64,
    pub highest: f64,
}

impl ReadinessSpread {
    /// `None` when the analysis has no task results. Quartiles interpolate between ranks.
    pub fn from_results(results: &[TaskResult]) -> Option<Self> {
        let mut scores: Vec<f64> = results
            .iter()
            .map(|r| r.ai_readiness_score)
            .filter(|s| s.is_finite())
            .collect();
        if scores.is_empty() {
            return None;
        }
        scores.sort_by(f64::total_cmp);
        Some(Self {
            mean: scores.iter().sum::<f64>() / scores.len() as f64,
            median: quantile(&scores, 0.5),
            p25: quantile(&scores, 0.25),
            p75: quantile(&scores, 0.75),
            lowest: scores[0],
            highest: scores[scores.len() - 1],
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Readiness score band used for coloring and badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

pub fn score_band(score: f64) -> ScoreBand {
    if score >= 75.0 {
        ScoreBand::High
    } else if score >= 50.0 {
        ScoreBand::Medium
    } else {
        ScoreBand::Low
    }
}

/// Threshold at which a task counts as ready for automation.
pub const AUTOMATION_READY_SCORE: f64 = 70.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use crate::report::fixtures::task;

    fn results(scores: &[f64]) -> Vec<TaskResult> {
        scores
            .iter()
            .map(|&s| task("Task", s, Difficulty::Medium, ""))
            .collect()
    }

    #[test]
    fn no_results_no_spread() {
        assert!(ReadinessSpread::from_results(&[]).is_none());
    }

    #[test]
    fn single_task_spread_collapses() {
        let s = ReadinessSpread::from_results(&results(&[80.0])).unwrap();
        assert_eq!((s.median, s.p25, s.p75), (80.0, 80.0, 80.0));
    }

    #[test]
    fn spread_on_unsorted_scores() {
        let s = ReadinessSpread::from_results(&results(&[90.0, 10.0, 50.0, 30.0])).unwrap();
        assert_eq!(s.mean, 45.0);
        assert_eq!(s.median, 40.0);
        assert_eq!(s.p25, 25.0);
        assert_eq!(s.p75, 60.0);
        assert_eq!((s.lowest, s.highest), (10.0, 90.0));
    }

    #[test]
    fn bands() {
        assert_eq!(score_band(75.0), ScoreBand::High);
        assert_eq!(score_band(74.9), ScoreBand::Medium);
        assert_eq!(score_band(50.0), ScoreBand::Medium);
        assert_eq!(score_band(49.0), ScoreBand::Low);
    }
}

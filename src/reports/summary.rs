use super::table::ResultRow;
use crate::evaluator::stats;
use crate::search::{SearchOutcome, SearchState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
    /// Candidates that had a value for this metric.
    pub count: usize,
}

impl MetricRange {
    fn over<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<f64>> + Clone,
    {
        let count = values.clone().into_iter().flatten().count();
        stats::range(values).map(|(min, max)| Self { min, max, count })
    }
}

/// Ranges over all candidates with a value for each metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub candidates: usize,
    pub ti_max: Option<MetricRange>,
    pub ti_mean: Option<MetricRange>,
    pub focality: Option<MetricRange>,
    pub composite: Option<MetricRange>,
    /// Candidates whose ROI selection had no elements.
    pub empty_roi_candidates: usize,
}

impl SummaryStats {
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        Self {
            candidates: rows.len(),
            ti_max: MetricRange::over(rows.iter().map(|r| r.ti_max_roi)),
            ti_mean: MetricRange::over(rows.iter().map(|r| r.ti_mean_roi)),
            focality: MetricRange::over(rows.iter().map(|r| r.focality)),
            composite: MetricRange::over(rows.iter().map(|r| r.composite_index)),
            empty_roi_candidates: rows.iter().filter(|r| r.n_elements == 0).count(),
        }
    }
}

/// Everything written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub state: SearchState,
    pub total_candidates: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub channel_limit_exceeded: bool,
    pub stats: SummaryStats,
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn new(outcome: &SearchOutcome, stats: SummaryStats) -> Self {
        let mut warnings = outcome.warnings.clone();
        if outcome.channel_limit_exceeded {
            warnings.push(
                "Channel limit restricts the current splits; not every balanced ratio was reachable"
                    .to_string(),
            );
        }
        if !outcome.skipped.is_empty() {
            warnings.push(format!(
                "{} candidates failed evaluation and were skipped",
                outcome.skipped.len()
            ));
        }
        if outcome.state == SearchState::Cancelled {
            warnings.push(format!(
                "Search was cancelled after {} of {} candidates",
                outcome.evaluated, outcome.total_candidates
            ));
        }
        Self {
            state: outcome.state,
            total_candidates: outcome.total_candidates,
            evaluated: outcome.evaluated,
            skipped: outcome.skipped.len(),
            channel_limit_exceeded: outcome.channel_limit_exceeded,
            stats,
            warnings,
        }
    }
}

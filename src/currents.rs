use serde::{Deserialize, Serialize};
use tracing::warn;

/// Decimals used for currents in signatures unless the step needs more.
pub const SIGNATURE_DECIMALS: usize = 3;
/// Finest precision a signature ever carries.
pub const MAX_DECIMALS: usize = 9;

/// A (channel 1, channel 2) current split that sums to the total budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentPair {
    pub ch1: f64,
    pub ch2: f64,
}

impl CurrentPair {
    pub fn new(ch1: f64, ch2: f64) -> Self {
        Self { ch1, ch2 }
    }

    pub fn total(&self) -> f64 {
        self.ch1 + self.ch2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentRatios {
    /// Valid splits, descending in `ch1`.
    pub pairs: Vec<CurrentPair>,
    /// Set when the limit cuts off part of the split range: either below half the
    /// total, or so close to the total that `min_current` was clamped to `step`.
    pub channel_limit_exceeded: bool,
    /// Tolerance used for bound and sum checks.
    pub epsilon: f64,
    /// Decimals needed to tell every generated level apart.
    pub decimals: usize,
}

impl CurrentRatios {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Enumerates current splits from `limit` (or `total`) downwards in `step` decrements.
pub fn generate(total: f64, step: f64, limit: Option<f64>) -> CurrentRatios {
    let epsilon = step * 0.01;
    let upper = limit.unwrap_or(total);

    let min_current = match limit {
        Some(l) => (total - l).max(step),
        None => step,
    };
    let channel_limit_exceeded =
        limit.is_some_and(|l| total - l > l + epsilon || total - l < step - epsilon);

    let mut pairs = Vec::new();
    if step > 0.0 && upper.is_finite() {
        // Multiplying out each level keeps the drift of repeated subtraction below epsilon.
        let mut k = 0u64;
        loop {
            let ch1 = upper - k as f64 * step;
            if ch1 < min_current - epsilon {
                break;
            }
            let ch2 = total - ch1;
            let in_bounds = |v: f64| v >= step - epsilon && v <= upper + epsilon;
            if in_bounds(ch1) && in_bounds(ch2) {
                pairs.push(CurrentPair::new(ch1, ch2));
            }
            k += 1;
        }
    }

    if channel_limit_exceeded {
        warn!(
            "⚠️  Channel limit {:?} restricts the splits of total current {}; not every balanced ratio is reachable ({} valid pairs).",
            limit,
            total,
            pairs.len()
        );
    }

    CurrentRatios {
        pairs,
        channel_limit_exceeded,
        epsilon,
        decimals: current_decimals(total, step, limit),
    }
}

/// Fewest decimals (at least [`SIGNATURE_DECIMALS`]) that represent `total`, `step`
/// and `limit` exactly, so every level `upper - k * step` formats uniquely.
pub fn current_decimals(total: f64, step: f64, limit: Option<f64>) -> usize {
    [Some(total), Some(step), limit]
        .into_iter()
        .flatten()
        .map(decimals_of)
        .fold(SIGNATURE_DECIMALS, usize::max)
}

fn decimals_of(value: f64) -> usize {
    (0..=MAX_DECIMALS)
        .find(|&d| {
            let scaled = value * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() <= 1e-6
        })
        .unwrap_or(MAX_DECIMALS)
}

/// Formats a current with at most three decimals, keeping at least one.
pub fn format_current(value: f64) -> String {
    format_current_to(value, SIGNATURE_DECIMALS)
}

/// Formats a current with at most `decimals` decimals, keeping at least one.
pub fn format_current_to(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals.clamp(1, MAX_DECIMALS), value);
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Weighted mean; `None` for empty input or zero total weight.
pub fn weighted_average(values: &[f64], weights: &[f32]) -> Option<f64> {
    let (sum, total) = values
        .iter()
        .zip(weights)
        .fold((0.0f64, 0.0f64), |(s, t), (&v, &w)| {
            (s + v * w as f64, t + w as f64)
        });
    if values.is_empty() || total <= 0.0 {
        return None;
    }
    Some(sum / total)
}

/// Value below which `percentile` percent of the total weight lies.
pub fn weighted_percentile(values: &[f64], weights: &[f32], percentile: f64) -> Option<f64> {
    let mut pairs: Vec<(f64, f64)> = values
        .iter()
        .zip(weights)
        .map(|(&v, &w)| (v, w as f64))
        .collect();
    let total: f64 = pairs.iter().map(|p| p.1).sum();
    if pairs.is_empty() || total <= 0.0 {
        return None;
    }

    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let target = (percentile / 100.0).clamp(0.0, 1.0) * total;

    let mut cumulative = 0.0;
    for &(v, w) in &pairs {
        cumulative += w;
        if cumulative >= target && w > 0.0 {
            return Some(v);
        }
    }
    pairs.iter().rev().find(|p| p.1 > 0.0).map(|p| p.0)
}

pub fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Inclusive (min, max) of the present values.
pub fn range<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

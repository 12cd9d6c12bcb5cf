use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownPoint {
    pub label: String,
    pub value: f64,
}

impl BreakdownPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// First candidate that is non-blank after trimming, or `fallback`.
pub fn resolve_label<'a>(
    candidates: impl IntoIterator<Item = Option<&'a str>>,
    fallback: &str,
) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|label| !label.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Sums `(label, amount)` pairs per label.
///
/// Labels whose total is not positive are omitted. The result is ordered by
/// value, largest first, with ties broken by label so identical input always
/// yields identical output.
pub fn build_breakdown(pairs: impl IntoIterator<Item = (String, f64)>) -> Vec<BreakdownPoint> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for (label, amount) in pairs {
        *totals.entry(label).or_insert(0.0) += amount;
    }

    let mut points: Vec<BreakdownPoint> = totals
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(label, value)| BreakdownPoint { label, value })
        .collect();

    points.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.label.cmp(&b.label))
    });
    points
}

/// Re-groups already built breakdowns, e.g. the same category seen in two units.
pub fn merge_breakdowns<'a>(
    breakdowns: impl IntoIterator<Item = &'a [BreakdownPoint]>,
) -> Vec<BreakdownPoint> {
    build_breakdown(
        breakdowns
            .into_iter()
            .flatten()
            .map(|p| (p.label.clone(), p.value)),
    )
}

pub fn top(points: &[BreakdownPoint], limit: usize) -> Vec<BreakdownPoint> {
    points.iter().take(limit).cloned().collect()
}

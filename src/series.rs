use crate::config::EngineConfig;
use crate::filler::filler_values;
use crate::normalizer::NormalizedEntry;
use crate::schema::EntryKind;
use crate::utils::{month_sort_key, month_start, next_month_start, prev_month_start};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    /// Month and two-digit year, e.g. "Jan 24"
    pub label: String,
    pub income: f64,
    pub expense: f64,
    /// Unix timestamp of the first day of the month, 00:00 UTC
    pub sort_key: i64,
    /// Placeholder month generated to pad a short series; not real activity
    pub is_synthetic: bool,
}

// Internal accumulator for one calendar month
#[derive(Default)]
struct MonthBucket {
    income: f64,
    expense: f64,
    synthetic: bool,
}

/// Buckets normalized entries into a fixed trailing window of calendar months.
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    window_months: usize,
    label_format: String,
    as_of: NaiveDate,
}

impl SeriesBuilder {
    pub fn new(window_months: usize, label_format: impl Into<String>, as_of: NaiveDate) -> Self {
        Self {
            window_months: window_months.max(1),
            label_format: label_format.into(),
            as_of,
        }
    }

    pub fn from_config(config: &EngineConfig, as_of: NaiveDate) -> Self {
        Self::new(config.window_months, config.month_label_format.clone(), as_of)
    }

    pub fn window_months(&self) -> usize {
        self.window_months
    }

    pub fn build(&self, entries: &[NormalizedEntry], filler_multiplier: f64) -> Vec<MonthlyPoint> {
        let mut grid: BTreeMap<NaiveDate, MonthBucket> = BTreeMap::new();

        for entry in entries {
            let Some(date) = entry.occurred_at else {
                continue;
            };
            let bucket = grid.entry(month_start(date)).or_default();
            match entry.kind {
                EntryKind::Income => bucket.income += entry.amount,
                EntryKind::Expense => bucket.expense += entry.amount,
            }
        }

        while grid.len() > self.window_months {
            grid.pop_first();
        }

        let missing = self.window_months - grid.len();
        if missing > 0 {
            debug!(
                "Padding monthly series with {} synthetic month(s) ({} real)",
                missing,
                grid.len()
            );

            // Filler occupies the months right before the oldest real month, or
            // ends at the reference month when there is no dated activity.
            let mut month = grid
                .keys()
                .next()
                .copied()
                .unwrap_or_else(|| next_month_start(self.as_of));

            for position in (0..missing).rev() {
                month = prev_month_start(month);
                let (income, expense) = filler_values(position, filler_multiplier);
                grid.entry(month).or_insert(MonthBucket {
                    income,
                    expense,
                    synthetic: true,
                });
            }
        }

        grid.into_iter()
            .map(|(month, bucket)| MonthlyPoint {
                label: self.format_label(month),
                income: bucket.income,
                expense: bucket.expense,
                sort_key: month_sort_key(month),
                is_synthetic: bucket.synthetic,
            })
            .collect()
    }

    fn format_label(&self, month: NaiveDate) -> String {
        let mut label = String::new();
        if write!(label, "{}", month.format(&self.label_format)).is_err() {
            return month.format("%Y-%m").to_string();
        }
        label
    }
}

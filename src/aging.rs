use crate::normalizer::billing_income;
use crate::schema::{BillingRecord, CollectionStatus};
use crate::utils::{non_negative_days, percentage, safe_ratio};
use serde::{Deserialize, Serialize};

/// Billing records classified by collection status. Every record lands in
/// exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesAging {
    pub pending_count: usize,
    pub paid_count: usize,
    pub overdue_count: usize,
    pub pending_amount: f64,
    pub paid_amount: f64,
    pub overdue_amount: f64,
}

impl ReceivablesAging {
    pub fn record(&mut self, status: CollectionStatus, amount: f64) {
        match status {
            CollectionStatus::Pending => {
                self.pending_count += 1;
                self.pending_amount += amount;
            }
            CollectionStatus::Paid => {
                self.paid_count += 1;
                self.paid_amount += amount;
            }
            CollectionStatus::Overdue => {
                self.overdue_count += 1;
                self.overdue_amount += amount;
            }
        }
    }

    pub fn total_count(&self) -> usize {
        self.pending_count + self.paid_count + self.overdue_count
    }

    pub fn total_amount(&self) -> f64 {
        self.pending_amount + self.paid_amount + self.overdue_amount
    }

    pub fn merge(&mut self, other: &ReceivablesAging) {
        self.pending_count += other.pending_count;
        self.paid_count += other.paid_count;
        self.overdue_count += other.overdue_count;
        self.pending_amount += other.pending_amount;
        self.paid_amount += other.paid_amount;
        self.overdue_amount += other.overdue_amount;
    }
}

/// Duration metrics of the request → invoice → payment cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingCycle {
    pub avg_days_to_invoice: f64,
    pub avg_days_to_collect: f64,
    pub overdue_pct: f64,
    /// Records that had both a request and an invoice date
    pub invoiced_samples: usize,
    /// Records that had both an invoice and a payment date
    pub collected_samples: usize,
}

impl AgingCycle {
    /// Sample-weighted mean of several cycles; `overdue_pct` is recomputed
    /// against `total_income`.
    pub fn combine<'a>(
        cycles: impl IntoIterator<Item = &'a AgingCycle>,
        overdue_amount: f64,
        total_income: f64,
    ) -> Self {
        let mut invoice_days = 0.0;
        let mut collect_days = 0.0;
        let mut invoiced_samples = 0;
        let mut collected_samples = 0;

        for cycle in cycles {
            invoice_days += cycle.avg_days_to_invoice * cycle.invoiced_samples as f64;
            collect_days += cycle.avg_days_to_collect * cycle.collected_samples as f64;
            invoiced_samples += cycle.invoiced_samples;
            collected_samples += cycle.collected_samples;
        }

        Self {
            avg_days_to_invoice: safe_ratio(invoice_days, invoiced_samples as f64),
            avg_days_to_collect: safe_ratio(collect_days, collected_samples as f64),
            overdue_pct: percentage(overdue_amount, total_income),
            invoiced_samples,
            collected_samples,
        }
    }
}

/// Classifies billing records and measures how long invoicing and
/// collection take.
///
/// Each record's amount is its resolved billing income (0 when it has none).
/// Duration means only include records carrying both endpoints; negative
/// spans count as 0 days.
pub fn compute_aging(records: &[BillingRecord], total_income: f64) -> (ReceivablesAging, AgingCycle) {
    let mut aging = ReceivablesAging::default();
    let mut invoice_days = 0i64;
    let mut collect_days = 0i64;
    let mut invoiced_samples = 0usize;
    let mut collected_samples = 0usize;

    for record in records {
        aging.record(record.collection_status, billing_income(record));

        if let (Some(requested), Some(invoiced)) = (record.request_date, record.invoice_date) {
            invoice_days += non_negative_days(requested, invoiced);
            invoiced_samples += 1;
        }

        if let (Some(invoiced), Some(paid)) = (record.invoice_date, record.payment_date) {
            collect_days += non_negative_days(invoiced, paid);
            collected_samples += 1;
        }
    }

    let cycle = AgingCycle {
        avg_days_to_invoice: safe_ratio(invoice_days as f64, invoiced_samples as f64),
        avg_days_to_collect: safe_ratio(collect_days as f64, collected_samples as f64),
        overdue_pct: percentage(aging.overdue_amount, total_income),
        invoiced_samples,
        collected_samples,
    };

    (aging, cycle)
}

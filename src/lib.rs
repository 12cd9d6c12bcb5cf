//! # Financial KPI Engine
//!
//! Aggregates the transactional records of independent business units
//! (diagnostics-lab billing and medical-device sales/inventory) into KPI
//! aggregates: totals, margin, monthly income/expense series, category
//! breakdowns and receivables aging. Unit aggregates are then rolled up into
//! a consolidated, company-wide view.
//!
//! ## Core Concepts
//!
//! - **Normalized entry**: a source record reduced to `{amount, kind, date}`
//! - **Monthly series**: a fixed trailing window of calendar months; short
//!   series are padded with placeholder months flagged `is_synthetic`
//! - **Breakdown**: income grouped by a per-unit dimension (payment method,
//!   insurer, product line)
//! - **Aging**: billing records classified as pending / paid / overdue, plus
//!   invoicing and collection durations
//! - **Consolidation**: totals summed, ratios recomputed, series rebuilt from
//!   the raw entries of every unit
//!
//! Aggregation is a pure function of the record snapshot. It never fails:
//! malformed numbers count as zero, malformed dates as absent, and empty
//! denominators yield zero ratios.
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_kpi_engine::*;
//! use chrono::NaiveDate;
//!
//! let snapshot = RecordSnapshot {
//!     sales: vec![SaleRecord {
//!         total: Some(500.0),
//!         date: NaiveDate::from_ymd_opt(2024, 3, 10),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let config = EngineConfig::default().with_as_of(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
//! let dashboard = compute_dashboard(&config, &snapshot).unwrap();
//! assert_eq!(dashboard.consolidated.income, 500.0);
//! ```

pub mod aggregator;
pub mod aging;
pub mod breakdown;
pub mod config;
pub mod consolidator;
pub mod error;
pub mod filler;
pub mod highlights;
pub mod ingestion;
pub mod normalizer;
pub mod schema;
pub mod series;
pub mod utils;

pub use aggregator::{BusinessUnit, DeviceUnit, KpiAggregate, LabUnit, UnitAggregator, UnitReport};
pub use aging::{compute_aging, AgingCycle, ReceivablesAging};
pub use breakdown::{build_breakdown, BreakdownPoint};
pub use config::{EngineConfig, LabBreakdownDimension, UnitConfig};
pub use consolidator::Consolidator;
pub use error::{KpiError, Result};
pub use highlights::Highlights;
pub use ingestion::{JsonFileSource, RecordSource};
pub use normalizer::{normalize, NormalizedEntry, NormalizedRecord, SourceRecord};
pub use schema::*;
pub use series::{MonthlyPoint, SeriesBuilder};

use chrono::{Local, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything the dashboards render: one report per unit plus the
/// consolidated view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDashboard {
    pub as_of: NaiveDate,
    pub units: Vec<UnitReport>,
    pub consolidated: KpiAggregate,
    pub highlights: Highlights,
}

impl KpiDashboard {
    pub fn unit(&self, name: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.unit == name)
    }
}

pub struct KpiEngine {
    config: EngineConfig,
    series: SeriesBuilder,
    as_of: NaiveDate,
}

impl KpiEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let as_of = config.as_of.unwrap_or_else(|| Local::now().date_naive());
        let series = SeriesBuilder::from_config(&config, as_of);

        Ok(Self {
            config,
            series,
            as_of,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn compute(&self, snapshot: &RecordSnapshot) -> KpiDashboard {
        info!(
            "Computing KPIs as of {}: {} billing, {} sales, {} movement record(s)",
            self.as_of,
            snapshot.billing.len(),
            snapshot.sales.len(),
            snapshot.movements.len()
        );

        let lab = LabUnit::new(
            &self.config.lab,
            &snapshot.billing,
            self.config.lab_breakdown,
            &self.config.fallback_category,
        );
        let devices = DeviceUnit::new(
            &self.config.devices,
            &snapshot.sales,
            &snapshot.movements,
            &snapshot.products,
            &self.config.fallback_category,
        );

        let units: [&dyn BusinessUnit; 2] = [&lab, &devices];
        self.compute_units(&units)
    }

    /// Aggregates an arbitrary set of units and consolidates them.
    pub fn compute_units(&self, units: &[&dyn BusinessUnit]) -> KpiDashboard {
        let aggregator = UnitAggregator::new(&self.series, self.config.highlight_limit);
        let reports: Vec<UnitReport> = units.iter().map(|u| aggregator.aggregate(*u)).collect();

        let consolidated = Consolidator::new(&self.series).consolidate(&reports);
        let highlights = Highlights::consolidated(&reports, self.config.highlight_limit);

        debug!(
            "Consolidated margin {:.2}% over {} operation(s)",
            consolidated.margin_pct, consolidated.operation_count
        );

        KpiDashboard {
            as_of: self.as_of,
            units: reports,
            consolidated,
            highlights,
        }
    }

    pub fn compute_from(&self, source: &dyn RecordSource) -> Result<KpiDashboard> {
        let snapshot = source.snapshot()?;
        Ok(self.compute(&snapshot))
    }
}

pub fn compute_dashboard(config: &EngineConfig, snapshot: &RecordSnapshot) -> Result<KpiDashboard> {
    let engine = KpiEngine::new(config.clone())?;
    Ok(engine.compute(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn config() -> EngineConfig {
        EngineConfig::default().with_as_of(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
    }

    #[test]
    fn test_end_to_end_dashboard() {
        let snapshot = RecordSnapshot {
            billing: vec![BillingRecord {
                amount: Some(1000.0),
                collection_status: CollectionStatus::Paid,
                payment_method: Some("Card".to_string()),
                payment_date: date(2024, 3, 3),
                ..Default::default()
            }],
            sales: vec![SaleRecord {
                total: Some(2000.0),
                date: date(2024, 2, 14),
                category: Some("Imaging".to_string()),
                agent: Some("Marta".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let dashboard = compute_dashboard(&config(), &snapshot).unwrap();

        assert_eq!(dashboard.units.len(), 2);
        assert_eq!(dashboard.unit("Diagnostics Lab").unwrap().aggregate.income, 1000.0);
        assert_eq!(dashboard.unit("Medical Devices").unwrap().aggregate.income, 2000.0);
        assert_eq!(dashboard.consolidated.income, 3000.0);
        assert_eq!(dashboard.consolidated.operation_count, 2);
        assert_eq!(dashboard.consolidated.real_months().count(), 2);
        assert_eq!(dashboard.highlights.top_categories[0].label, "Imaging");
        assert_eq!(dashboard.highlights.top_agents[0].label, "Marta");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            window_months: 0,
            ..config()
        };
        assert!(KpiEngine::new(config).is_err());
    }

    #[test]
    fn test_as_of_defaults_to_today() {
        let before = Local::now().date_naive();
        let engine = KpiEngine::new(EngineConfig::default()).unwrap();
        let after = Local::now().date_naive();
        assert!(before <= engine.as_of() && engine.as_of() <= after);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let snapshot = RecordSnapshot {
            sales: vec![SaleRecord {
                total: Some(10.0),
                date: date(2024, 1, 1),
                ..Default::default()
            }],
            ..Default::default()
        };
        let engine = KpiEngine::new(config()).unwrap();
        let first = engine.compute(&snapshot);
        let second = engine.compute(&snapshot);
        assert_eq!(first.consolidated, second.consolidated);
    }
}

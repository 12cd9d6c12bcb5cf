use crate::aging::{compute_aging, AgingCycle, ReceivablesAging};
use crate::breakdown::{build_breakdown, resolve_label, BreakdownPoint};
use crate::config::{LabBreakdownDimension, UnitConfig};
use crate::highlights::Highlights;
use crate::normalizer::{
    normalize, billing_income, sale_income, NormalizedEntry, NormalizedRecord, SourceRecord,
};
use crate::schema::{BillingRecord, InventoryMovement, Product, SaleRecord};
use crate::series::{MonthlyPoint, SeriesBuilder};
use crate::utils::{percentage, safe_ratio};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiAggregate {
    pub income: f64,
    pub expense: f64,
    pub profit: f64,
    pub margin_pct: f64,
    pub operation_count: usize,
    pub avg_income_per_operation: f64,
    pub monthly: Vec<MonthlyPoint>,
    pub breakdown: Vec<BreakdownPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aging: Option<ReceivablesAging>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aging_cycle: Option<AgingCycle>,
}

impl KpiAggregate {
    /// Builds an aggregate from raw totals. Profit, margin and the average
    /// are always derived here, never summed.
    pub fn from_totals(
        income: f64,
        expense: f64,
        operation_count: usize,
        monthly: Vec<MonthlyPoint>,
        breakdown: Vec<BreakdownPoint>,
    ) -> Self {
        let profit = income - expense;
        Self {
            income,
            expense,
            profit,
            margin_pct: percentage(profit, income),
            operation_count,
            avg_income_per_operation: safe_ratio(income, operation_count as f64),
            monthly,
            breakdown,
            aging: None,
            aging_cycle: None,
        }
    }

    pub fn with_aging(mut self, aging: ReceivablesAging, cycle: AgingCycle) -> Self {
        self.aging = Some(aging);
        self.aging_cycle = Some(cycle);
        self
    }

    pub fn real_months(&self) -> impl Iterator<Item = &MonthlyPoint> {
        self.monthly.iter().filter(|p| !p.is_synthetic)
    }
}

/// Aggregation result for one business unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitReport {
    pub unit: String,
    pub aggregate: KpiAggregate,
    pub highlights: Highlights,
    /// Income per sales agent, full list
    #[serde(skip)]
    pub agents: Vec<BreakdownPoint>,
    /// Normalized entries the aggregate was built from. The consolidated
    /// series is rebuilt from these rather than from formatted points.
    #[serde(skip)]
    pub entries: Vec<NormalizedEntry>,
    #[serde(skip)]
    pub filler_multiplier: f64,
}

/// A business line whose records are aggregated on their own before
/// consolidation.
pub trait BusinessUnit {
    fn name(&self) -> &str;

    fn filler_multiplier(&self) -> f64;

    /// One normalized contribution per source record, including empty ones.
    fn normalized_records(&self) -> Vec<NormalizedRecord>;

    /// `(category, income)` for every income-bearing record.
    fn category_pairs(&self) -> Vec<(String, f64)>;

    /// `(agent, income)` for every income-bearing record that names an agent.
    fn agent_pairs(&self) -> Vec<(String, f64)> {
        Vec::new()
    }

    /// Receivables aging, for units that bill and collect.
    fn receivables(&self, _total_income: f64) -> Option<(ReceivablesAging, AgingCycle)> {
        None
    }
}

/// The diagnostics lab: billing and collection records.
pub struct LabUnit<'a> {
    config: &'a UnitConfig,
    records: &'a [BillingRecord],
    dimension: LabBreakdownDimension,
    fallback_category: &'a str,
}

impl<'a> LabUnit<'a> {
    pub fn new(
        config: &'a UnitConfig,
        records: &'a [BillingRecord],
        dimension: LabBreakdownDimension,
        fallback_category: &'a str,
    ) -> Self {
        Self {
            config,
            records,
            dimension,
            fallback_category,
        }
    }

    fn category_of(&self, record: &BillingRecord) -> String {
        let candidate = match self.dimension {
            LabBreakdownDimension::PaymentMethod => record.payment_method.as_deref(),
            LabBreakdownDimension::Insurer => record.insurer.as_deref(),
        };
        resolve_label([candidate], self.fallback_category)
    }
}

impl BusinessUnit for LabUnit<'_> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn filler_multiplier(&self) -> f64 {
        self.config.filler_multiplier
    }

    fn normalized_records(&self) -> Vec<NormalizedRecord> {
        self.records
            .iter()
            .map(|r| normalize(SourceRecord::Billing(r)))
            .collect()
    }

    fn category_pairs(&self) -> Vec<(String, f64)> {
        self.records
            .iter()
            .map(|r| (r, billing_income(r)))
            .filter(|(_, income)| *income > 0.0)
            .map(|(r, income)| (self.category_of(r), income))
            .collect()
    }

    fn receivables(&self, total_income: f64) -> Option<(ReceivablesAging, AgingCycle)> {
        Some(compute_aging(self.records, total_income))
    }
}

/// Medical-device sales plus the inventory purchases that feed them.
pub struct DeviceUnit<'a> {
    config: &'a UnitConfig,
    sales: &'a [SaleRecord],
    movements: &'a [InventoryMovement],
    catalog: HashMap<&'a str, &'a Product>,
    fallback_category: &'a str,
}

impl<'a> DeviceUnit<'a> {
    pub fn new(
        config: &'a UnitConfig,
        sales: &'a [SaleRecord],
        movements: &'a [InventoryMovement],
        products: &'a [Product],
        fallback_category: &'a str,
    ) -> Self {
        let catalog = products
            .iter()
            .filter_map(|p| p.id.as_deref().map(|id| (id, p)))
            .collect();

        Self {
            config,
            sales,
            movements,
            catalog,
            fallback_category,
        }
    }

    fn product(&self, product_id: Option<&str>) -> Option<&'a Product> {
        product_id.and_then(|id| self.catalog.get(id).copied())
    }

    fn category_of(&self, sale: &SaleRecord) -> String {
        let first_item = sale.items.first();
        let item_category = first_item.and_then(|item| item.category.as_deref());
        let catalog_category = self
            .product(first_item.and_then(|item| item.product_id.as_deref()))
            .and_then(|p| p.category.as_deref());

        resolve_label(
            [sale.category.as_deref(), item_category, catalog_category],
            self.fallback_category,
        )
    }
}

impl BusinessUnit for DeviceUnit<'_> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn filler_multiplier(&self) -> f64 {
        self.config.filler_multiplier
    }

    fn normalized_records(&self) -> Vec<NormalizedRecord> {
        let sales = self.sales.iter().map(|s| normalize(SourceRecord::Sale(s)));
        let movements = self.movements.iter().map(|m| {
            normalize(SourceRecord::Movement {
                movement: m,
                product: self.product(m.product_id.as_deref()),
            })
        });
        sales.chain(movements).collect()
    }

    fn category_pairs(&self) -> Vec<(String, f64)> {
        self.sales
            .iter()
            .map(|s| (s, sale_income(s)))
            .filter(|(_, income)| *income > 0.0)
            .map(|(s, income)| (self.category_of(s), income))
            .collect()
    }

    fn agent_pairs(&self) -> Vec<(String, f64)> {
        self.sales
            .iter()
            .filter_map(|s| {
                let agent = s.agent.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
                Some((agent.to_string(), sale_income(s)))
            })
            .collect()
    }
}

/// Runs normalization, series, breakdown and aging for a single unit.
pub struct UnitAggregator<'a> {
    series: &'a SeriesBuilder,
    highlight_limit: usize,
}

impl<'a> UnitAggregator<'a> {
    pub fn new(series: &'a SeriesBuilder, highlight_limit: usize) -> Self {
        Self {
            series,
            highlight_limit,
        }
    }

    pub fn aggregate(&self, unit: &dyn BusinessUnit) -> UnitReport {
        let records = unit.normalized_records();

        let mut income = 0.0;
        let mut expense = 0.0;
        let mut operation_count = 0;
        let mut entries = Vec::with_capacity(records.len());

        for record in &records {
            if record.is_empty() {
                continue;
            }
            operation_count += 1;
            income += record.income_amount();
            expense += record.expense_amount();
            entries.extend(record.entries());
        }

        let skipped = records.len() - operation_count;
        if skipped > 0 {
            debug!(
                "Unit '{}': {} of {} record(s) contributed no income or expense",
                unit.name(),
                skipped,
                records.len()
            );
        }

        let undated = entries.iter().filter(|e| e.occurred_at.is_none()).count();
        if undated > 0 {
            debug!(
                "Unit '{}': {} entr(y/ies) without a usable date kept in totals only",
                unit.name(),
                undated
            );
        }

        let monthly = self.series.build(&entries, unit.filler_multiplier());
        let breakdown = build_breakdown(unit.category_pairs());
        let agents = build_breakdown(unit.agent_pairs());

        let mut aggregate =
            KpiAggregate::from_totals(income, expense, operation_count, monthly, breakdown);
        if let Some((aging, cycle)) = unit.receivables(income) {
            aggregate = aggregate.with_aging(aging, cycle);
        }

        debug!(
            "Unit '{}': income {:.2}, expense {:.2}, {} operation(s)",
            unit.name(),
            aggregate.income,
            aggregate.expense,
            aggregate.operation_count
        );

        UnitReport {
            unit: unit.name().to_string(),
            highlights: Highlights::for_unit(&aggregate.breakdown, &agents, self.highlight_limit),
            aggregate,
            agents,
            entries,
            filler_multiplier: unit.filler_multiplier(),
        }
    }
}

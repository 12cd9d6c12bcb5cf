use crate::aggregator::{KpiAggregate, UnitReport};
use crate::aging::{AgingCycle, ReceivablesAging};
use crate::breakdown::BreakdownPoint;
use crate::normalizer::NormalizedEntry;
use crate::series::SeriesBuilder;
use log::debug;

/// Rolls unit reports up into the company-wide aggregate.
pub struct Consolidator<'a> {
    series: &'a SeriesBuilder,
}

impl<'a> Consolidator<'a> {
    pub fn new(series: &'a SeriesBuilder) -> Self {
        Self { series }
    }

    pub fn consolidate(&self, reports: &[UnitReport]) -> KpiAggregate {
        let income: f64 = reports.iter().map(|r| r.aggregate.income).sum();
        let expense: f64 = reports.iter().map(|r| r.aggregate.expense).sum();
        let operation_count: usize = reports.iter().map(|r| r.aggregate.operation_count).sum();

        // Re-bucket the raw entries of every unit so months line up even when
        // units were active in different months.
        let entries: Vec<NormalizedEntry> = reports
            .iter()
            .flat_map(|r| r.entries.iter().copied())
            .collect();
        let filler_multiplier: f64 = reports.iter().map(|r| r.filler_multiplier).sum();
        let monthly = self.series.build(&entries, filler_multiplier);

        let breakdown = reports
            .iter()
            .filter(|r| r.aggregate.income > 0.0)
            .map(|r| BreakdownPoint::new(r.unit.clone(), r.aggregate.income))
            .collect();

        let mut aggregate =
            KpiAggregate::from_totals(income, expense, operation_count, monthly, breakdown);

        let agings: Vec<&ReceivablesAging> = reports
            .iter()
            .filter_map(|r| r.aggregate.aging.as_ref())
            .collect();
        if !agings.is_empty() {
            let mut aging = ReceivablesAging::default();
            for unit_aging in &agings {
                aging.merge(unit_aging);
            }
            let cycle = AgingCycle::combine(
                reports.iter().filter_map(|r| r.aggregate.aging_cycle.as_ref()),
                aging.overdue_amount,
                income,
            );
            aggregate = aggregate.with_aging(aging, cycle);
        }

        debug!(
            "Consolidated {} unit(s): income {:.2}, expense {:.2}, {} operation(s)",
            reports.len(),
            aggregate.income,
            aggregate.expense,
            aggregate.operation_count
        );

        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlights::Highlights;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn report(unit: &str, entries: Vec<NormalizedEntry>, operations: usize) -> UnitReport {
        let income: f64 = entries
            .iter()
            .filter(|e| e.kind == crate::schema::EntryKind::Income)
            .map(|e| e.amount)
            .sum();
        let expense: f64 = entries
            .iter()
            .filter(|e| e.kind == crate::schema::EntryKind::Expense)
            .map(|e| e.amount)
            .sum();

        UnitReport {
            unit: unit.to_string(),
            aggregate: KpiAggregate::from_totals(income, expense, operations, Vec::new(), Vec::new()),
            highlights: Highlights::default(),
            agents: Vec::new(),
            entries,
            filler_multiplier: 1.0,
        }
    }

    #[test]
    fn test_sums_totals_and_recomputes_ratios() {
        let lab = report(
            "Lab",
            vec![NormalizedEntry::income(1000.0, Some(day(2024, 1, 5)))],
            1,
        );
        let devices = report(
            "Devices",
            vec![
                NormalizedEntry::income(2000.0, Some(day(2024, 1, 9))),
                NormalizedEntry::expense(1500.0, Some(day(2024, 1, 9))),
            ],
            3,
        );

        let series = SeriesBuilder::new(6, "%b %y", day(2024, 1, 31));
        let consolidated = Consolidator::new(&series).consolidate(&[lab, devices]);

        assert_eq!(consolidated.income, 3000.0);
        assert_eq!(consolidated.expense, 1500.0);
        assert_eq!(consolidated.profit, 1500.0);
        assert_eq!(consolidated.margin_pct, 50.0);
        assert_eq!(consolidated.operation_count, 4);
        assert_eq!(consolidated.avg_income_per_operation, 750.0);
        assert_eq!(
            consolidated.breakdown,
            vec![
                BreakdownPoint::new("Lab", 1000.0),
                BreakdownPoint::new("Devices", 2000.0),
            ]
        );

        let january: Vec<_> = consolidated.real_months().collect();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].income, 3000.0);
        assert_eq!(january[0].expense, 1500.0);
        assert!(consolidated.aging.is_none());
    }

    #[test]
    fn test_disjoint_months_merge_chronologically() {
        let lab = report(
            "Lab",
            vec![
                NormalizedEntry::income(10.0, Some(day(2024, 1, 5))),
                NormalizedEntry::income(30.0, Some(day(2024, 3, 5))),
            ],
            2,
        );
        let devices = report(
            "Devices",
            vec![NormalizedEntry::income(20.0, Some(day(2024, 2, 5)))],
            1,
        );

        let series = SeriesBuilder::new(6, "%b %y", day(2024, 3, 31));
        let consolidated = Consolidator::new(&series).consolidate(&[lab, devices]);

        let real: Vec<(String, f64)> = consolidated
            .real_months()
            .map(|p| (p.label.clone(), p.income))
            .collect();
        assert_eq!(
            real,
            vec![
                ("Jan 24".to_string(), 10.0),
                ("Feb 24".to_string(), 20.0),
                ("Mar 24".to_string(), 30.0),
            ]
        );
        assert!(consolidated
            .monthly
            .windows(2)
            .all(|w| w[0].sort_key < w[1].sort_key));
    }

    #[test]
    fn test_zero_income_units_left_out_of_breakdown() {
        let lab = report("Lab", Vec::new(), 0);
        let devices = report(
            "Devices",
            vec![NormalizedEntry::income(5.0, None)],
            1,
        );

        let series = SeriesBuilder::new(6, "%b %y", day(2024, 3, 31));
        let consolidated = Consolidator::new(&series).consolidate(&[lab, devices]);

        assert_eq!(consolidated.breakdown, vec![BreakdownPoint::new("Devices", 5.0)]);
        assert_eq!(consolidated.monthly.len(), 6);
        assert!(consolidated.monthly.iter().all(|p| p.is_synthetic));
        assert_eq!(consolidated.monthly[0].income, 42_000.0 * 2.0);
    }

    #[test]
    fn test_consolidates_aging_from_billing_units() {
        let mut lab = report(
            "Lab",
            vec![NormalizedEntry::income(400.0, Some(day(2024, 2, 1)))],
            1,
        );
        let mut aging = ReceivablesAging::default();
        aging.record(crate::schema::CollectionStatus::Overdue, 400.0);
        lab.aggregate = lab.aggregate.clone().with_aging(
            aging,
            AgingCycle {
                avg_days_to_invoice: 4.0,
                avg_days_to_collect: 0.0,
                overdue_pct: 100.0,
                invoiced_samples: 1,
                collected_samples: 0,
            },
        );
        let devices = report(
            "Devices",
            vec![NormalizedEntry::income(600.0, Some(day(2024, 2, 1)))],
            1,
        );

        let series = SeriesBuilder::new(6, "%b %y", day(2024, 2, 29));
        let consolidated = Consolidator::new(&series).consolidate(&[lab, devices]);

        let aging = consolidated.aging.unwrap();
        assert_eq!(aging.overdue_count, 1);
        let cycle = consolidated.aging_cycle.unwrap();
        assert_eq!(cycle.avg_days_to_invoice, 4.0);
        assert_eq!(cycle.overdue_pct, 40.0);
    }

    #[test]
    fn test_consolidates_more_than_two_units() {
        let lab = report("Lab", vec![NormalizedEntry::income(100.0, None)], 1);
        let mut devices = report("Devices", vec![NormalizedEntry::income(300.0, None)], 2);
        devices.filler_multiplier = 0.5;
        let mut pharmacy = report(
            "Pharmacy",
            vec![
                NormalizedEntry::income(200.0, None),
                NormalizedEntry::expense(50.0, None),
            ],
            2,
        );
        pharmacy.filler_multiplier = 0.5;

        let series = SeriesBuilder::new(6, "%b %y", day(2024, 3, 31));
        let consolidated = Consolidator::new(&series).consolidate(&[lab, devices, pharmacy]);

        assert_eq!(consolidated.income, 600.0);
        assert_eq!(consolidated.expense, 50.0);
        assert_eq!(consolidated.operation_count, 5);
        assert_eq!(
            consolidated.breakdown,
            vec![
                BreakdownPoint::new("Lab", 100.0),
                BreakdownPoint::new("Devices", 300.0),
                BreakdownPoint::new("Pharmacy", 200.0),
            ]
        );
        assert!(consolidated.monthly.iter().all(|p| p.is_synthetic));
        assert_eq!(consolidated.monthly[0].income, 42_000.0 * 2.0);
    }
}

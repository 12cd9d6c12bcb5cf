use anyhow::Context;
use financial_kpi_engine::*;
use std::path::PathBuf;

fn export_monthly_csv(aggregate: &KpiAggregate, filename: &str) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;
    writer.write_record(["Month", "Income", "Expense", "Synthetic"])?;

    for point in &aggregate.monthly {
        writer.write_record([
            point.label.clone(),
            format!("{:.2}", point.income),
            format!("{:.2}", point.expense),
            point.is_synthetic.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let snapshot_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/snapshot.json"));

    let config = match args.next() {
        Some(path) => EngineConfig::from_path(&path)
            .with_context(|| format!("loading engine config from {}", path))?,
        None => EngineConfig::default(),
    };

    let engine = KpiEngine::new(config)?;
    let dashboard = engine
        .compute_from(&JsonFileSource::new(&snapshot_path))
        .with_context(|| format!("reading records from {}", snapshot_path.display()))?;

    println!("KPI dashboard as of {}", dashboard.as_of);
    for (name, aggregate) in dashboard
        .units
        .iter()
        .map(|u| (u.unit.as_str(), &u.aggregate))
        .chain(std::iter::once(("Consolidated", &dashboard.consolidated)))
    {
        println!(
            "  {:<16} income {:>12.2}  expense {:>12.2}  margin {:>6.2}%  ops {}",
            name, aggregate.income, aggregate.expense, aggregate.margin_pct, aggregate.operation_count
        );
    }

    export_monthly_csv(&dashboard.consolidated, "consolidated_monthly.csv")?;
    println!("\nConsolidated monthly series written to consolidated_monthly.csv");

    println!("\n{}", serde_json::to_string_pretty(&dashboard)?);

    Ok(())
}

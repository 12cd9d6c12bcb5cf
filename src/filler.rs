use crate::error::{KpiError, Result};

/// Placeholder income for the six positions of a default window, oldest first.
/// Longer windows cycle through it.
pub const FILLER_INCOME_CURVE: [f64; 6] = [42_000.0, 45_500.0, 44_000.0, 48_500.0, 51_000.0, 53_500.0];

/// Placeholder expense as a fraction of placeholder income.
pub const FILLER_EXPENSE_RATIO: f64 = 0.62;

/// Deterministic `(income, expense)` for a synthetic month at `position`
/// (0 = oldest slot of the window), scaled by the unit multiplier.
pub fn filler_values(position: usize, multiplier: f64) -> (f64, f64) {
    let income = FILLER_INCOME_CURVE[position % FILLER_INCOME_CURVE.len()] * multiplier;
    (income, income * FILLER_EXPENSE_RATIO)
}

pub fn validate_multiplier(unit: &str, multiplier: f64) -> Result<()> {
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(KpiError::InvalidFillerMultiplier {
            unit: unit.to_string(),
            value: multiplier,
        });
    }
    Ok(())
}

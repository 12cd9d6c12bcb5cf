//! Reduces heterogeneous source records to `{amount, kind, date}` entries.
//!
//! Every source field that has more than one candidate (income amount,
//! expense amount, date, unit cost) is resolved through an ordered
//! [`FieldPriority`] list: the first accessor that yields an acceptable
//! value wins and later ones are never consulted.

use crate::schema::{
    BillingRecord, EntryKind, InventoryMovement, MovementType, Product, SaleRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEntry {
    pub amount: f64,
    pub kind: EntryKind,
    pub occurred_at: Option<NaiveDate>,
}

impl NormalizedEntry {
    pub fn income(amount: f64, occurred_at: Option<NaiveDate>) -> Self {
        Self {
            amount,
            kind: EntryKind::Income,
            occurred_at,
        }
    }

    pub fn expense(amount: f64, occurred_at: Option<NaiveDate>) -> Self {
        Self {
            amount,
            kind: EntryKind::Expense,
            occurred_at,
        }
    }
}

/// What a single source record contributes: at most one entry of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalizedRecord {
    pub income: Option<NormalizedEntry>,
    pub expense: Option<NormalizedEntry>,
}

impl NormalizedRecord {
    /// A record that contributes nothing is not an operation.
    pub fn is_empty(&self) -> bool {
        self.income.is_none() && self.expense.is_none()
    }

    pub fn income_amount(&self) -> f64 {
        self.income.map(|e| e.amount).unwrap_or(0.0)
    }

    pub fn expense_amount(&self) -> f64 {
        self.expense.map(|e| e.amount).unwrap_or(0.0)
    }

    pub fn entries(&self) -> impl Iterator<Item = NormalizedEntry> {
        self.income.into_iter().chain(self.expense)
    }
}

/// One candidate source for a resolved field.
pub struct FieldPriority<R, T> {
    pub field: &'static str,
    pub read: fn(&R) -> Option<T>,
}

/// Walks `priorities` in order and returns the first value accepted by
/// `accept`, together with the name of the field it came from.
pub fn resolve_first<R, T>(
    record: &R,
    priorities: &[FieldPriority<R, T>],
    accept: impl Fn(&T) -> bool,
) -> Option<(&'static str, T)> {
    priorities
        .iter()
        .find_map(|p| (p.read)(record).filter(|v| accept(v)).map(|v| (p.field, v)))
}

fn is_positive(value: &f64) -> bool {
    *value > 0.0
}

fn billing_invoiced_amount(r: &BillingRecord) -> Option<f64> {
    r.invoiced_amount
}

fn billing_nominal_amount(r: &BillingRecord) -> Option<f64> {
    r.amount
}

fn billing_itemized_provider_payments(r: &BillingRecord) -> Option<f64> {
    if r.provider_payments.is_empty() {
        return None;
    }
    Some(
        r.provider_payments
            .iter()
            .map(|p| p.amount.unwrap_or(0.0))
            .sum(),
    )
}

fn billing_provider_payment(r: &BillingRecord) -> Option<f64> {
    r.provider_payment
}

fn billing_cost(r: &BillingRecord) -> Option<f64> {
    r.cost
}

fn billing_payment_date(r: &BillingRecord) -> Option<NaiveDate> {
    r.payment_date
}

fn billing_invoice_date(r: &BillingRecord) -> Option<NaiveDate> {
    r.invoice_date
}

fn billing_request_date(r: &BillingRecord) -> Option<NaiveDate> {
    r.request_date
}

fn billing_created_at(r: &BillingRecord) -> Option<NaiveDate> {
    r.created_at
}

pub const BILLING_INCOME: &[FieldPriority<BillingRecord, f64>] = &[
    FieldPriority {
        field: "invoiced_amount",
        read: billing_invoiced_amount,
    },
    FieldPriority {
        field: "amount",
        read: billing_nominal_amount,
    },
];

pub const BILLING_EXPENSE: &[FieldPriority<BillingRecord, f64>] = &[
    FieldPriority {
        field: "provider_payments",
        read: billing_itemized_provider_payments,
    },
    FieldPriority {
        field: "provider_payment",
        read: billing_provider_payment,
    },
    FieldPriority {
        field: "cost",
        read: billing_cost,
    },
];

pub const BILLING_DATE: &[FieldPriority<BillingRecord, NaiveDate>] = &[
    FieldPriority {
        field: "payment_date",
        read: billing_payment_date,
    },
    FieldPriority {
        field: "invoice_date",
        read: billing_invoice_date,
    },
    FieldPriority {
        field: "request_date",
        read: billing_request_date,
    },
    FieldPriority {
        field: "created_at",
        read: billing_created_at,
    },
];

fn sale_total(r: &SaleRecord) -> Option<f64> {
    r.total
}

// Line items without a quantity count once.
fn sale_items_total(r: &SaleRecord) -> Option<f64> {
    if r.items.is_empty() {
        return None;
    }
    Some(
        r.items
            .iter()
            .map(|item| item.quantity.unwrap_or(1.0) * item.unit_price.unwrap_or(0.0))
            .sum(),
    )
}

fn sale_date(r: &SaleRecord) -> Option<NaiveDate> {
    r.date
}

fn sale_created_at(r: &SaleRecord) -> Option<NaiveDate> {
    r.created_at
}

pub const SALE_INCOME: &[FieldPriority<SaleRecord, f64>] = &[
    FieldPriority {
        field: "total",
        read: sale_total,
    },
    FieldPriority {
        field: "items",
        read: sale_items_total,
    },
];

pub const SALE_DATE: &[FieldPriority<SaleRecord, NaiveDate>] = &[
    FieldPriority {
        field: "date",
        read: sale_date,
    },
    FieldPriority {
        field: "created_at",
        read: sale_created_at,
    },
];

/// Unit-cost candidates for a movement: the cost recorded on the movement
/// itself and the one listed in the product catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCostSources {
    pub recorded: Option<f64>,
    pub catalog: Option<f64>,
}

fn recorded_unit_cost(s: &UnitCostSources) -> Option<f64> {
    s.recorded
}

fn catalog_unit_cost(s: &UnitCostSources) -> Option<f64> {
    s.catalog
}

fn movement_date(r: &InventoryMovement) -> Option<NaiveDate> {
    r.date
}

fn movement_created_at(r: &InventoryMovement) -> Option<NaiveDate> {
    r.created_at
}

pub const MOVEMENT_UNIT_COST: &[FieldPriority<UnitCostSources, f64>] = &[
    FieldPriority {
        field: "unit_cost",
        read: recorded_unit_cost,
    },
    FieldPriority {
        field: "catalog.unit_cost",
        read: catalog_unit_cost,
    },
];

pub const MOVEMENT_DATE: &[FieldPriority<InventoryMovement, NaiveDate>] = &[
    FieldPriority {
        field: "date",
        read: movement_date,
    },
    FieldPriority {
        field: "created_at",
        read: movement_created_at,
    },
];

/// A raw record tagged with the stream it came from.
#[derive(Debug, Clone, Copy)]
pub enum SourceRecord<'a> {
    Billing(&'a BillingRecord),
    Sale(&'a SaleRecord),
    Movement {
        movement: &'a InventoryMovement,
        product: Option<&'a Product>,
    },
}

pub fn normalize(record: SourceRecord<'_>) -> NormalizedRecord {
    match record {
        SourceRecord::Billing(billing) => normalize_billing(billing),
        SourceRecord::Sale(sale) => normalize_sale(sale),
        SourceRecord::Movement { movement, product } => normalize_movement(movement, product),
    }
}

/// Income of a billing record as used everywhere (totals, breakdown, aging).
/// Absent or non-positive amounts resolve to 0.
pub fn billing_income(record: &BillingRecord) -> f64 {
    resolve_first(record, BILLING_INCOME, |_| true)
        .map(|(_, amount)| amount)
        .filter(is_positive)
        .unwrap_or(0.0)
}

pub fn sale_income(record: &SaleRecord) -> f64 {
    resolve_first(record, SALE_INCOME, |_| true)
        .map(|(_, amount)| amount)
        .filter(is_positive)
        .unwrap_or(0.0)
}

pub fn normalize_billing(record: &BillingRecord) -> NormalizedRecord {
    let occurred_at = resolve_first(record, BILLING_DATE, |_| true).map(|(_, d)| d);
    let income = billing_income(record);
    let expense = resolve_first(record, BILLING_EXPENSE, is_positive).map(|(_, amount)| amount);

    NormalizedRecord {
        income: (income > 0.0).then(|| NormalizedEntry::income(income, occurred_at)),
        expense: expense.map(|amount| NormalizedEntry::expense(amount, occurred_at)),
    }
}

pub fn normalize_sale(record: &SaleRecord) -> NormalizedRecord {
    let occurred_at = resolve_first(record, SALE_DATE, |_| true).map(|(_, d)| d);
    let income = sale_income(record);

    NormalizedRecord {
        income: (income > 0.0).then(|| NormalizedEntry::income(income, occurred_at)),
        expense: None,
    }
}

/// Inbound movements cost `quantity × unit cost`; every other movement
/// contributes nothing.
pub fn normalize_movement(
    movement: &InventoryMovement,
    product: Option<&Product>,
) -> NormalizedRecord {
    if movement.movement_type != MovementType::Inbound {
        return NormalizedRecord::default();
    }

    let sources = UnitCostSources {
        recorded: movement.unit_cost,
        catalog: product.and_then(|p| p.unit_cost),
    };
    let unit_cost = resolve_first(&sources, MOVEMENT_UNIT_COST, is_positive)
        .map(|(_, cost)| cost)
        .unwrap_or(0.0);
    let amount = movement.quantity.unwrap_or(0.0) * unit_cost;
    let occurred_at = resolve_first(movement, MOVEMENT_DATE, |_| true).map(|(_, d)| d);

    NormalizedRecord {
        income: None,
        expense: (amount > 0.0).then(|| NormalizedEntry::expense(amount, occurred_at)),
    }
}

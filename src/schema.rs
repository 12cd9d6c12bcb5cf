use crate::utils::{deserialize_lenient_amount, deserialize_lenient_date, deserialize_lenient_text};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    #[default]
    #[schemars(description = "Invoiced or requested but not yet collected. Also used for missing or unrecognised statuses.")]
    Pending,

    #[schemars(description = "Collected in full.")]
    Paid,

    #[schemars(description = "Past due and not collected.")]
    Overdue,
}

impl CollectionStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "paid" | "pagado" | "pagada" | "cobrado" | "cobrada" | "collected" => Self::Paid,
            "overdue" | "vencido" | "vencida" | "late" | "moroso" | "morosa" => Self::Overdue,
            _ => Self::Pending,
        }
    }
}

impl<'de> Deserialize<'de> for CollectionStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = deserialize_lenient_text(deserializer)?;
        Ok(label
            .as_deref()
            .map(Self::from_label)
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    #[schemars(description = "Stock received (purchase). Costs money and is aggregated as an expense.")]
    Inbound,

    #[schemars(description = "Stock leaving the warehouse. Revenue is tracked by the sale, not the movement.")]
    Outbound,

    #[default]
    #[schemars(description = "Missing or unrecognised movement type. Ignored by aggregation.")]
    Unknown,
}

impl MovementType {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "inbound" | "in" | "entrada" | "purchase" | "compra" => Self::Inbound,
            "outbound" | "out" | "salida" | "sale" | "venta" => Self::Outbound,
            _ => Self::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for MovementType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = deserialize_lenient_text(deserializer)?;
        Ok(label
            .as_deref()
            .map(Self::from_label)
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProviderPayment {
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub provider: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub amount: Option<f64>,
}

/// A diagnostics-lab billing/collection record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BillingRecord {
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>", description = "Nominal amount of the study or service")]
    pub amount: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>", description = "Final invoiced amount. Takes precedence over `amount` when present.")]
    pub invoiced_amount: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>", description = "Internal cost of the service. Lowest-priority expense source.")]
    pub cost: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>", description = "Single payment made to an external provider")]
    pub provider_payment: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Itemized payments to external providers. Their sum is the highest-priority expense source.")]
    pub provider_payments: Vec<ProviderPayment>,

    #[serde(default)]
    pub collection_status: CollectionStatus,

    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub payment_method: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub insurer: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    #[schemars(with = "Option<NaiveDate>")]
    pub request_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    #[schemars(with = "Option<NaiveDate>")]
    pub invoice_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    #[schemars(with = "Option<NaiveDate>")]
    pub payment_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    #[schemars(with = "Option<NaiveDate>")]
    pub created_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SaleItem {
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub product_id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub quantity: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub unit_price: Option<f64>,
}

/// A medical-device sales transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SaleRecord {
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>", description = "Invoice total. When absent, the line items are summed instead.")]
    pub total: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    #[schemars(with = "Option<NaiveDate>")]
    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    #[schemars(with = "Option<NaiveDate>")]
    pub created_at: Option<NaiveDate>,

    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>", description = "Product line of the sale")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>", description = "Sales agent credited with the sale")]
    pub agent: Option<String>,

    #[serde(default)]
    pub items: Vec<SaleItem>,
}

/// A warehouse stock movement for the device unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InventoryMovement {
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub product_id: Option<String>,

    #[serde(default)]
    pub movement_type: MovementType,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub quantity: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>", description = "Unit cost recorded on the movement. Falls back to the product catalog when absent.")]
    pub unit_cost: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    #[schemars(with = "Option<NaiveDate>")]
    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    #[schemars(with = "Option<NaiveDate>")]
    pub created_at: Option<NaiveDate>,
}

/// Catalog entry used to look up unit costs and product lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    #[schemars(with = "Option<String>")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub unit_cost: Option<f64>,
}

/// Everything the engine needs for one computation, as read from the record stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecordSnapshot {
    #[serde(default)]
    pub billing: Vec<BillingRecord>,

    #[serde(default)]
    pub sales: Vec<SaleRecord>,

    #[serde(default)]
    pub movements: Vec<InventoryMovement>,

    #[serde(default)]
    pub products: Vec<Product>,
}

impl RecordSnapshot {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RecordSnapshot)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = RecordSnapshot::schema_as_json().unwrap();
        assert!(schema_json.contains("billing"));
        assert!(schema_json.contains("invoiced_amount"));
        assert!(schema_json.contains("movement_type"));
    }

    #[test]
    fn test_lenient_billing_deserialization() {
        let json = r#"{
            "id": 17,
            "amount": "1.500,00",
            "invoiced_amount": null,
            "provider_payment": "abc",
            "collection_status": "Pagado",
            "payment_method": "  ",
            "request_date": "2024-01-01",
            "invoice_date": "not a date",
            "payment_date": "2024-02-09T10:00:00.000Z"
        }"#;

        let record: BillingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_deref(), Some("17"));
        assert_eq!(record.amount, Some(1500.0));
        assert_eq!(record.invoiced_amount, None);
        assert_eq!(record.provider_payment, Some(0.0));
        assert_eq!(record.collection_status, CollectionStatus::Paid);
        assert_eq!(record.payment_method, None);
        assert_eq!(record.request_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(record.invoice_date, None);
        assert_eq!(record.payment_date, NaiveDate::from_ymd_opt(2024, 2, 9));
        assert!(record.provider_payments.is_empty());
    }

    #[test]
    fn test_unknown_status_defaults_to_pending() {
        let record: BillingRecord = serde_json::from_str(r#"{"collection_status": "???"}"#).unwrap();
        assert_eq!(record.collection_status, CollectionStatus::Pending);

        let record: BillingRecord = serde_json::from_str(r#"{"collection_status": null}"#).unwrap();
        assert_eq!(record.collection_status, CollectionStatus::Pending);

        assert_eq!(CollectionStatus::from_label("VENCIDO"), CollectionStatus::Overdue);
    }

    #[test]
    fn test_movement_type_labels() {
        let movement: InventoryMovement =
            serde_json::from_str(r#"{"movement_type": "Entrada", "quantity": 10}"#).unwrap();
        assert_eq!(movement.movement_type, MovementType::Inbound);
        assert_eq!(movement.quantity, Some(10.0));

        assert_eq!(MovementType::from_label("salida"), MovementType::Outbound);
        assert_eq!(MovementType::from_label("transfer"), MovementType::Unknown);
    }

    #[test]
    fn test_dot_grouped_amounts_deserialize() {
        let record: BillingRecord = serde_json::from_str(
            r#"{"amount": "1.250.000", "cost": "$ 2.500.000", "payment_date": "2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(record.amount, Some(1_250_000.0));
        assert_eq!(record.cost, Some(2_500_000.0));
    }
}

use crate::error::{KpiError, Result};
use crate::filler::validate_multiplier;
use crate::utils::validate_label_format;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_WINDOW_MONTHS: usize = 6;
pub const DEFAULT_LABEL_FORMAT: &str = "%b %y";
pub const DEFAULT_HIGHLIGHT_LIMIT: usize = 3;
pub const DEFAULT_FALLBACK_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LabBreakdownDimension {
    #[default]
    #[schemars(description = "Group lab income by how the patient or payer paid (cash, card, transfer, ...)")]
    PaymentMethod,

    #[schemars(description = "Group lab income by the insurer covering the study")]
    Insurer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct UnitConfig {
    #[schemars(description = "Display name of the business unit, also used as its label in the consolidated breakdown")]
    pub name: String,

    #[schemars(
        description = "Scale applied to the placeholder months that pad a short series. 0.0 renders flat zero filler."
    )]
    pub filler_multiplier: f64,
}

impl UnitConfig {
    pub fn new(name: impl Into<String>, filler_multiplier: f64) -> Self {
        Self {
            name: name.into(),
            filler_multiplier,
        }
    }

    pub fn lab() -> Self {
        Self::new("Diagnostics Lab", 1.0)
    }

    pub fn devices() -> Self {
        Self::new("Medical Devices", 0.6)
    }

    fn validate(&self) -> Result<()> {
        validate_multiplier(&self.name, self.filler_multiplier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(
        description = "Reference date. When no unit has dated activity, the filler series ends in this month. Defaults to today."
    )]
    pub as_of: Option<NaiveDate>,

    #[schemars(description = "Number of trailing months kept in every monthly series")]
    pub window_months: usize,

    #[schemars(description = "chrono strftime pattern used for month labels")]
    pub month_label_format: String,

    pub lab: UnitConfig,

    pub devices: UnitConfig,

    pub lab_breakdown: LabBreakdownDimension,

    #[schemars(description = "How many entries each highlight list keeps")]
    pub highlight_limit: usize,

    #[schemars(description = "Label used when a record has no usable category")]
    pub fallback_category: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            as_of: None,
            window_months: DEFAULT_WINDOW_MONTHS,
            month_label_format: DEFAULT_LABEL_FORMAT.to_string(),
            lab: UnitConfig::lab(),
            devices: UnitConfig::devices(),
            lab_breakdown: LabBreakdownDimension::default(),
            highlight_limit: DEFAULT_HIGHLIGHT_LIMIT,
            fallback_category: DEFAULT_FALLBACK_CATEGORY.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_months == 0 {
            return Err(KpiError::InvalidWindow(self.window_months));
        }
        validate_label_format(&self.month_label_format)?;
        self.lab.validate()?;
        self.devices.validate()?;
        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }
}

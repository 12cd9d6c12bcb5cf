use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpiError {
    #[error("Invalid series window {0}: must be at least 1 month")]
    InvalidWindow(usize),

    #[error("Invalid filler multiplier {value} for unit '{unit}': must be finite and non-negative")]
    InvalidFillerMultiplier { unit: String, value: f64 },

    #[error("Invalid month label format '{0}'")]
    InvalidLabelFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KpiError>;

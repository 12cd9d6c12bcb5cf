use crate::error::Result;
use crate::schema::RecordSnapshot;
use log::debug;
use std::path::{Path, PathBuf};

/// Anything that can hand the engine a consistent snapshot of records.
///
/// The engine never scans storage on its own; callers plug in whatever
/// store they keep records in.
pub trait RecordSource {
    fn snapshot(&self) -> Result<RecordSnapshot>;
}

impl RecordSource for RecordSnapshot {
    fn snapshot(&self) -> Result<RecordSnapshot> {
        Ok(self.clone())
    }
}

impl RecordSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn record_count(&self) -> usize {
        self.billing.len() + self.sales.len() + self.movements.len()
    }
}

/// Reads a snapshot from a JSON document on disk every time it is asked.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonFileSource {
    fn snapshot(&self) -> Result<RecordSnapshot> {
        let snapshot = RecordSnapshot::from_path(&self.path)?;
        debug!(
            "Loaded {} record(s) from {}",
            snapshot.record_count(),
            self.path.display()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KpiError;

    #[test]
    fn test_snapshot_from_json_with_missing_streams() {
        let snapshot = RecordSnapshot::from_json_str(
            r#"{"sales": [{"id": "S-1", "total": "500", "date": "2024-03-10"}]}"#,
        )
        .unwrap();

        assert!(snapshot.billing.is_empty());
        assert_eq!(snapshot.sales.len(), 1);
        assert_eq!(snapshot.sales[0].total, Some(500.0));
        assert_eq!(snapshot.record_count(), 1);
    }

    #[test]
    fn test_structural_errors_are_reported() {
        let result = RecordSnapshot::from_json_str(r#"{"billing": "nope"}"#);
        assert!(matches!(result, Err(KpiError::SerializationError(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = JsonFileSource::new("/definitely/not/here.json");
        assert!(matches!(source.snapshot(), Err(KpiError::IoError(_))));
    }
}

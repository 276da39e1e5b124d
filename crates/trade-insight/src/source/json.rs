//! JSON File Record Source
//!
//! Reads a snapshot export: one JSON document holding `as_of` and the flat
//! record arrays (see [`SnapshotRecords`]).

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::RecordSource;
use crate::error::Result;
use crate::snapshot::{Snapshot, SnapshotRecords};

pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("json:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn load(&self) -> Result<Snapshot> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let records: SnapshotRecords = serde_json::from_str(&raw).inspect_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "snapshot export is not valid JSON");
        })?;

        tracing::debug!(
            path = %self.path.display(),
            users = records.users.len(),
            trades = records.trades.len(),
            edges = records.edges.len(),
            "snapshot export parsed"
        );
        Snapshot::from_records(records)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightError;
    use crate::source::InMemorySource;
    use std::io::Write;

    #[tokio::test]
    async fn test_round_trips_demo_export() {
        let demo = InMemorySource::demo().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(demo.records()).unwrap().as_bytes())
            .unwrap();

        let loaded = JsonFileSource::new(file.path()).load().await.unwrap();
        let expected = demo.load().await.unwrap();
        assert_eq!(loaded, expected);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonFileSource::new(dir.path().join("absent.json"))
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::Io(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_export_is_not_retryable() {
        for body in [&br#"{"as_of": "not a time"}"#[..], b"{ not json"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(body).unwrap();

            let err = JsonFileSource::new(file.path()).load().await.unwrap_err();
            assert!(matches!(err, InsightError::Serialization(_)));
            assert!(!err.is_retryable());
        }
    }

    #[tokio::test]
    async fn test_invalid_records_are_rejected() {
        let json = r#"{
            "as_of": "2025-02-14T12:00:00Z",
            "users": [
                {"id": "a", "handle": "@a"},
                {"id": "a", "handle": "@a2"}
            ]
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let err = JsonFileSource::new(file.path()).load().await.unwrap_err();
        assert!(matches!(err, InsightError::InvalidRecord(_)));
    }
}

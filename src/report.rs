//! Report persistence: pretty-printed JSON at the configured path.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::aggregator::AggregateReport;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot write report to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes the report as indented JSON, creating the output directory if
/// needed. Any failure here is fatal to the run; the report only exists on
/// disk, so a write error means the invocation produced nothing.
pub fn write_report(report: &AggregateReport, path: &Path) -> Result<(), WriteError> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("wrote report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn sample_report() -> AggregateReport {
        let mut report = AggregateReport::new();
        report.insert("system_debug_data".into(), json!({"os": {"name": "Linux"}}));
        report.insert(
            "python_debug_data".into(),
            json!({"error": "python3 missing", "type": "execution_error"}),
        );
        report
    }

    #[test]
    fn writes_pretty_json_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/output/system_data.json");

        write_report(&sample_report(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'), "expected indented output");

        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["system_debug_data"]["os"]["name"], "Linux");
        assert_eq!(parsed["python_debug_data"]["error"], "python3 missing");
    }

    #[test]
    fn key_order_survives_serialization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_report(&sample_report(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let system = written.find("system_debug_data").unwrap();
        let python = written.find("python_debug_data").unwrap();
        assert!(system < python);
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = write_report(&sample_report(), &blocker.join("report.json")).unwrap_err();
        assert!(matches!(err, WriteError::CreateDir { .. }));
    }

    #[test]
    fn empty_report_writes_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_report(&AggregateReport::new(), &path).unwrap();

        let parsed: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, json!({}));
    }
}

//! Last-run summary persisted under `.relay/`.
//!
//! One JSON file per working directory recording what the most recent
//! batch did. Project state itself is never persisted here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const STATE_DIR: &str = ".relay";
const RECORD_FILE: &str = "last_run.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// RFC 3339 timestamp of when the batch finished.
    pub timestamp: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub had_errors: bool,
}

impl RunRecord {
    pub fn new(total: usize, succeeded: usize, failed: usize, had_errors: bool) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            total,
            succeeded,
            failed,
            had_errors,
        }
    }

    /// Loads the previous run's record, if any.
    pub fn load() -> Result<Option<Self>> {
        let path = Self::record_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read run record: {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse run record: {}", path.display()))?;
        Ok(Some(record))
    }

    pub fn save(&self) -> Result<()> {
        let dir = PathBuf::from(STATE_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {} directory", STATE_DIR))?;
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize run record")?;
        fs::write(Self::record_path(), content).context("Failed to write run record")?;
        Ok(())
    }

    fn record_path() -> PathBuf {
        PathBuf::from(STATE_DIR).join(RECORD_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_all_counters() {
        let record = RunRecord::new(10, 8, 2, true);
        let json = serde_json::to_string(&record).unwrap();
        let back: RunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total, 10);
        assert_eq!(back.succeeded, 8);
        assert_eq!(back.failed, 2);
        assert!(back.had_errors);
        assert!(!back.timestamp.is_empty());
    }
}

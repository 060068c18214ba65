//! Append-only decision audit trail (JSONL).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::types::RiskLevel;

/// One gate outcome, as persisted.
#[derive(Debug, Serialize)]
pub struct GateRecord {
    pub timestamp: String,
    pub id: String,
    pub host: String,
    pub risk: RiskLevel,
    pub threats: Vec<String>,
    pub pii: Vec<String>,
    pub outcome: &'static str,
}

impl GateRecord {
    pub fn new(
        host: &str,
        risk: RiskLevel,
        threats: Vec<String>,
        pii: Vec<String>,
        outcome: &'static str,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            id: uuid::Uuid::new_v4().to_string(),
            host: host.to_string(),
            risk,
            threats,
            pii,
            outcome,
        }
    }
}

/// JSONL writer. Failures are reported to the caller; the gate logs them as
/// warnings and carries on.
pub struct DecisionLog {
    path: PathBuf,
}

impl DecisionLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, record: &GateRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}

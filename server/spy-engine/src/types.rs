//! Input/output types for the spy engine (JSON contract with the caller).

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Severity (shared by findings and the overall risk level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  Medium,
  High,
  Critical,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
      Self::Critical => "critical",
    }
  }
}

impl std::fmt::Display for Severity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// One matched record attached to a finding for human review.
pub type EvidenceRow = serde_json::Map<String, serde_json::Value>;

/// Convert a typed evidence struct into a JSON object row.
pub fn evidence_row<T: Serialize>(row: &T) -> Result<EvidenceRow, EngineError> {
  match serde_json::to_value(row)? {
    serde_json::Value::Object(map) => Ok(map),
    other => Err(EngineError::validation(
      "evidence",
      &format!("expected an object, got {}", other),
    )),
  }
}

/// Output of one check that detected an actionable signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
  pub key: String,
  pub severity: Severity,
  pub score_delta: i32,
  pub title: String,
  pub detail: String,
  pub evidence: Vec<EvidenceRow>,
}

// ---------------------------------------------------------------------------
// Scan result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
  pub key: String,
  pub title: String,
  pub severity: Severity,
  pub score_delta: i32,
}

impl From<&Finding> for SummaryEntry {
  fn from(f: &Finding) -> Self {
    Self {
      key: f.key.clone(),
      title: f.title.clone(),
      severity: f.severity,
      score_delta: f.score_delta,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanMeta {
  pub scan_id: String,
  pub generated_at: String,
  /// Number of findings produced (not the number of checks run).
  pub check_count: usize,
  pub checks_run: usize,
  pub character_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
  pub score: u8,
  pub risk_level: Severity,
  pub findings: Vec<Finding>,
  pub summary: Vec<SummaryEntry>,
  pub meta: ScanMeta,
}

// ---------------------------------------------------------------------------
// Binary request/response envelope
// ---------------------------------------------------------------------------

/// One scan request read from stdin. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
  pub character_name: String,
  #[serde(default)]
  pub requested_by: Option<i64>,
  /// Caller asked for background processing.
  #[serde(default, rename = "async")]
  pub run_async: bool,
  /// Evaluate checks concurrently.
  #[serde(default)]
  pub parallel: bool,
  #[serde(default)]
  pub data: Dataset,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanResponse {
  Completed { result: ScanResult },
  Failed { error: String },
}

impl ScanResponse {
  pub fn failed(error: impl Into<String>) -> Self {
    Self::Failed {
      error: error.into(),
    }
  }
}

//! Check runner: evaluates registered checks and aggregates their findings.

use chrono::SecondsFormat;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::checks::{
  self, AltNetworkCheck, AssetIndicatorsCheck, Check, CorpHistoryCheck, WalletLinksCheck,
};
use crate::config::{Config, Watchlists};
use crate::context::ScanContext;
use crate::error::EngineError;
use crate::risk::score_to_risk_level;
use crate::types::*;

const SUMMARY_SIZE: usize = 3;

/// Runs an ordered list of checks. Order decides finding order and summary
/// tie-breaks.
pub struct Runner {
  checks: Vec<Box<dyn Check>>,
}

impl Runner {
  pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
    Self { checks }
  }

  /// Register the checks named in `config.checks`, wired to its watchlists.
  pub fn from_config(config: &Config) -> Result<Self, EngineError> {
    let checks = config
      .checks
      .iter()
      .map(|key| checks::build(key, &config.watchlists))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self::new(checks))
  }

  /// The built-in checks with the default watchlists.
  pub fn with_defaults() -> Self {
    let lists = Watchlists::default();
    let checks: Vec<Box<dyn Check>> = vec![
      Box::new(WalletLinksCheck::from_watchlists(&lists)),
      Box::new(AssetIndicatorsCheck::from_watchlists(&lists)),
      Box::new(CorpHistoryCheck::from_watchlists(&lists)),
      Box::new(AltNetworkCheck),
    ];
    Self::new(checks)
  }

  pub fn check_keys(&self) -> Vec<&str> {
    self.checks.iter().map(|c| c.key()).collect()
  }

  /// Evaluate every check in registration order on the calling thread.
  ///
  /// The first failing check aborts the scan.
  pub fn run(&self, ctx: &ScanContext) -> Result<ScanResult, EngineError> {
    let mut findings = Vec::new();
    for check in &self.checks {
      if let Some(finding) = evaluate_one(check.as_ref(), ctx)? {
        findings.push(finding);
      }
    }
    Ok(self.aggregate(ctx, findings))
  }

  /// Same result as [`Runner::run`], with checks evaluated on the rayon pool.
  ///
  /// Every check runs to completion; when several fail, the error reported
  /// is the first in registration order.
  pub fn run_parallel(&self, ctx: &ScanContext) -> Result<ScanResult, EngineError> {
    // Indexed collect keeps registration order.
    let outcomes: Vec<Result<Option<Finding>, EngineError>> = self
      .checks
      .par_iter()
      .map(|check| evaluate_one(check.as_ref(), ctx))
      .collect();
    let mut findings = Vec::new();
    for outcome in outcomes {
      if let Some(finding) = outcome? {
        findings.push(finding);
      }
    }
    Ok(self.aggregate(ctx, findings))
  }

  fn aggregate(&self, ctx: &ScanContext, findings: Vec<Finding>) -> ScanResult {
    let score = composite_score(&findings);
    let risk_level = score_to_risk_level(i64::from(score));
    let summary = build_summary(&findings);
    let generated_at = ctx.as_of.to_rfc3339_opts(SecondsFormat::Secs, true);

    info!(
      subject = ctx.subject_id,
      score,
      risk_level = %risk_level,
      findings = findings.len(),
      "scan complete"
    );

    ScanResult {
      score,
      risk_level,
      meta: ScanMeta {
        scan_id: scan_id(ctx, &generated_at),
        generated_at,
        check_count: findings.len(),
        checks_run: self.checks.len(),
        character_count: ctx.character_ids.len(),
      },
      findings,
      summary,
    }
  }
}

fn evaluate_one(check: &dyn Check, ctx: &ScanContext) -> Result<Option<Finding>, EngineError> {
  let outcome = check
    .evaluate(ctx)
    .map_err(|e| EngineError::check_failed(check.key(), e))?;
  match &outcome {
    Some(f) => debug!(
      check = check.key(),
      score_delta = f.score_delta,
      severity = %f.severity,
      evidence = f.evidence.len(),
      "finding"
    ),
    None => debug!(check = check.key(), "no finding"),
  }
  Ok(outcome)
}

/// Σ max(0, score_delta), clamped to 0..=100.
pub fn composite_score(findings: &[Finding]) -> u8 {
  let total: i64 = findings
    .iter()
    .map(|f| i64::from(f.score_delta.max(0)))
    .sum();
  total.clamp(0, 100) as u8
}

/// Top findings by descending score delta; equal deltas keep registration order.
pub fn build_summary(findings: &[Finding]) -> Vec<SummaryEntry> {
  let mut ranked: Vec<&Finding> = findings.iter().collect();
  ranked.sort_by(|a, b| b.score_delta.cmp(&a.score_delta));
  ranked
    .into_iter()
    .take(SUMMARY_SIZE)
    .map(SummaryEntry::from)
    .collect()
}

/// Stable id: hash of subject + linked characters + evaluation instant.
fn scan_id(ctx: &ScanContext, generated_at: &str) -> String {
  let mut hasher = blake3::Hasher::new();
  hasher.update(ctx.subject_id.to_string().as_bytes());
  hasher.update(b"|");
  for id in &ctx.character_ids {
    hasher.update(id.to_string().as_bytes());
    hasher.update(b",");
  }
  hasher.update(b"|");
  hasher.update(generated_at.as_bytes());
  let hex = hasher.finalize().to_hex();
  format!("scan-{}", &hex[..16])
}

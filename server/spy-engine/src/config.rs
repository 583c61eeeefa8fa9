//! Engine configuration with sane defaults.
//!
//! Loaded from TOML; every section and field is optional and falls back to
//! the defaults below.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::checks;
use crate::error::EngineError;

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV: &str = "SPY_ENGINE_CONFIG";

/// Longest accepted wallet lookback (100 years).
pub const MAX_WALLET_JOURNAL_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
  pub watchlists: Watchlists,
  pub scan: ScanSettings,
  /// Check keys in registration order.
  pub checks: Vec<String>,
}

/// Entity and item ids the checks match against.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Watchlists {
  #[serde(alias = "negative_character_ids")]
  pub hostile_character_ids: Vec<i64>,
  #[serde(alias = "negative_corporation_ids")]
  pub hostile_corporation_ids: Vec<i64>,
  #[serde(alias = "negative_alliance_ids")]
  pub hostile_alliance_ids: Vec<i64>,
  pub suspicious_type_ids: Vec<i64>,
  pub suspicious_group_ids: Vec<i64>,
  pub suspicious_category_ids: Vec<i64>,
}

/// Data windows and dispatch knobs for the surrounding scan service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
  /// Always hand scans to a background worker.
  #[serde(alias = "force_queue")]
  pub force_async: bool,
  /// Accounts with more characters than this go to a background worker.
  #[serde(alias = "queue_if_chars_gt")]
  pub async_if_characters_gt: usize,
  /// Wallet journal lookback.
  pub wallet_journal_days: u32,
  pub wallet_journal_limit: usize,
  pub asset_limit: usize,
  pub corp_history_limit: usize,
  /// Lifetime of a cached background result.
  pub cache_ttl_minutes: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      watchlists: Watchlists::default(),
      scan: ScanSettings::default(),
      checks: checks::DEFAULT_CHECKS.iter().map(|k| k.to_string()).collect(),
    }
  }
}

impl Default for Watchlists {
  fn default() -> Self {
    Self {
      hostile_character_ids: vec![90000001, 90000002],
      hostile_corporation_ids: vec![1000169],
      hostile_alliance_ids: vec![99000006],
      suspicious_type_ids: vec![1154, 2028],
      suspicious_group_ids: vec![130],
      suspicious_category_ids: vec![6],
    }
  }
}

impl Default for ScanSettings {
  fn default() -> Self {
    Self {
      force_async: false,
      async_if_characters_gt: 12,
      wallet_journal_days: 90,
      wallet_journal_limit: 1000,
      asset_limit: 2000,
      corp_history_limit: 100,
      cache_ttl_minutes: 30,
    }
  }
}

impl ScanSettings {
  /// Whether a scan over `character_count` characters should leave the
  /// request path.
  pub fn prefers_background(&self, requested: bool, character_count: usize) -> bool {
    self.force_async || requested || character_count > self.async_if_characters_gt
  }
}

impl Config {
  pub fn from_toml_str(raw: &str) -> Result<Self, EngineError> {
    let config: Config = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self, EngineError> {
    let raw = std::fs::read_to_string(path)?;
    Self::from_toml_str(&raw)
  }

  /// Load from `$SPY_ENGINE_CONFIG` when set, defaults otherwise.
  pub fn from_env() -> Result<Self, EngineError> {
    match std::env::var_os(CONFIG_ENV) {
      Some(path) => Self::load(Path::new(&path)),
      None => Ok(Self::default()),
    }
  }

  pub fn validate(&self) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for key in &self.checks {
      if !checks::is_known(key) {
        return Err(EngineError::UnknownCheck(key.clone()));
      }
      if !seen.insert(key.as_str()) {
        return Err(EngineError::config(format!("check {} listed twice", key)));
      }
    }

    let scan = &self.scan;
    for (name, value) in [
      ("scan.wallet_journal_days", scan.wallet_journal_days as usize),
      ("scan.wallet_journal_limit", scan.wallet_journal_limit),
      ("scan.asset_limit", scan.asset_limit),
      ("scan.corp_history_limit", scan.corp_history_limit),
    ] {
      if value == 0 {
        return Err(EngineError::config(format!("{} must be greater than zero", name)));
      }
    }
    if scan.wallet_journal_days > MAX_WALLET_JOURNAL_DAYS {
      return Err(EngineError::config(format!(
        "scan.wallet_journal_days must be at most {}",
        MAX_WALLET_JOURNAL_DAYS
      )));
    }
    Ok(())
  }
}

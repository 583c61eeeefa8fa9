//! Check trait and the built-in heuristic checks.

pub mod alt_network;
pub mod asset_indicators;
pub mod corp_history;
pub mod wallet_links;

use std::collections::HashSet;

use crate::config::Watchlists;
use crate::context::ScanContext;
use crate::error::EngineError;
use crate::types::Finding;

pub use alt_network::AltNetworkCheck;
pub use asset_indicators::AssetIndicatorsCheck;
pub use corp_history::CorpHistoryCheck;
pub use wallet_links::WalletLinksCheck;

/// Set of entity ids a check matches against.
pub type IdSet = HashSet<i64>;

/// One heuristic rule evaluated against a scan context.
///
/// Implementations must not mutate anything or perform I/O: the runner may
/// call them from several threads against the same context.
pub trait Check: Send + Sync {
  /// Stable key used in output and in the `checks` config list.
  fn key(&self) -> &str;

  fn description(&self) -> &str;

  /// `Ok(None)` means nothing actionable was found.
  fn evaluate(&self, ctx: &ScanContext) -> Result<Option<Finding>, EngineError>;
}

/// Built-in check keys, in default registration order.
pub const DEFAULT_CHECKS: [&str; 4] = [
  wallet_links::KEY,
  asset_indicators::KEY,
  corp_history::KEY,
  alt_network::KEY,
];

pub fn is_known(key: &str) -> bool {
  DEFAULT_CHECKS.contains(&key)
}

/// Construct a built-in check by key, wired to the given watchlists.
pub fn build(key: &str, lists: &Watchlists) -> Result<Box<dyn Check>, EngineError> {
  let check: Box<dyn Check> = match key {
    wallet_links::KEY => Box::new(WalletLinksCheck::from_watchlists(lists)),
    asset_indicators::KEY => Box::new(AssetIndicatorsCheck::from_watchlists(lists)),
    corp_history::KEY => Box::new(CorpHistoryCheck::from_watchlists(lists)),
    alt_network::KEY => Box::new(AltNetworkCheck),
    other => return Err(EngineError::UnknownCheck(other.to_string())),
  };
  Ok(check)
}

pub(crate) fn id_set(ids: impl IntoIterator<Item = i64>) -> IdSet {
  ids.into_iter().collect()
}

//! In-memory [`DataSource`] over a JSON export of character records.

use std::collections::HashSet;

use serde::Deserialize;

use crate::builder::{ActivityData, DataSource, LoadWindow};
use crate::context::{
  parse_optional, AssetEntry, CharacterRecord, CorpHistoryEntry, WalletEntry,
};
use crate::error::EngineError;

/// Flat record export. Missing collections are empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Dataset {
  pub characters: Vec<CharacterRecord>,
  pub wallet_journals: Vec<WalletEntry>,
  pub assets: Vec<AssetEntry>,
  pub corp_history: Vec<CorpHistoryEntry>,
}

impl DataSource for Dataset {
  fn find_character_by_name(&self, name: &str) -> Result<Option<CharacterRecord>, EngineError> {
    let wanted = name.to_lowercase();
    Ok(
      self
        .characters
        .iter()
        .find(|c| {
          c.character_name
            .as_deref()
            .is_some_and(|n| n.to_lowercase() == wanted)
        })
        .cloned(),
    )
  }

  fn find_owner_for_character(&self, character_id: i64) -> Result<Option<i64>, EngineError> {
    Ok(
      self
        .characters
        .iter()
        .find(|c| c.character_id == Some(character_id))
        .and_then(|c| c.owner_id),
    )
  }

  fn list_characters_for_owner(&self, owner_id: i64) -> Result<Vec<i64>, EngineError> {
    let mut seen = HashSet::new();
    Ok(
      self
        .characters
        .iter()
        .filter(|c| c.owner_id == Some(owner_id))
        .filter_map(|c| c.character_id)
        .filter(|id| seen.insert(*id))
        .collect(),
    )
  }

  fn load_activity(
    &self,
    character_ids: &[i64],
    window: &LoadWindow,
  ) -> Result<ActivityData, EngineError> {
    let ids: HashSet<i64> = character_ids.iter().copied().collect();
    let linked = |id: Option<i64>| id.is_some_and(|v| ids.contains(&v));

    // Newest first; rows without a usable date fall outside any window.
    let mut wallet: Vec<_> = self
      .wallet_journals
      .iter()
      .filter(|e| linked(e.character_id))
      .filter_map(|e| {
        parse_optional(e.date.as_deref())
          .filter(|d| *d >= window.wallet_since)
          .map(|d| (d, e))
      })
      .collect();
    wallet.sort_by(|a, b| b.0.cmp(&a.0));

    let mut history: Vec<_> = self
      .corp_history
      .iter()
      .filter(|e| linked(e.character_id))
      .collect();
    history.sort_by(|a, b| {
      let a = a.start_date.as_deref().unwrap_or("");
      let b = b.start_date.as_deref().unwrap_or("");
      b.cmp(a)
    });

    Ok(ActivityData {
      wallet_journals: wallet
        .into_iter()
        .take(window.wallet_limit)
        .map(|(_, e)| e.clone())
        .collect(),
      assets: self
        .assets
        .iter()
        .filter(|a| linked(a.character_id))
        .take(window.asset_limit)
        .cloned()
        .collect(),
      corp_history: history
        .into_iter()
        .take(window.corp_history_limit)
        .cloned()
        .collect(),
      characters: self
        .characters
        .iter()
        .filter(|c| linked(c.character_id))
        .cloned()
        .collect(),
    })
  }
}

//! Builds a [`ScanContext`] for a character name from a [`DataSource`].

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::ScanSettings;
use crate::context::{AssetEntry, CharacterRecord, CorpHistoryEntry, ScanContext, WalletEntry};
use crate::error::EngineError;

/// How much history to pull for one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadWindow {
  /// Oldest wallet journal entry to include.
  pub wallet_since: DateTime<Utc>,
  pub wallet_limit: usize,
  pub asset_limit: usize,
  pub corp_history_limit: usize,
}

impl LoadWindow {
  pub fn from_settings(settings: &ScanSettings, now: DateTime<Utc>) -> Result<Self, EngineError> {
    let days = settings.wallet_journal_days;
    let wallet_since = now
      .checked_sub_signed(Duration::days(i64::from(days)))
      .ok_or_else(|| {
        EngineError::config(format!("scan.wallet_journal_days {} is out of range", days))
      })?;
    Ok(Self {
      wallet_since,
      wallet_limit: settings.wallet_journal_limit,
      asset_limit: settings.asset_limit,
      corp_history_limit: settings.corp_history_limit,
    })
  }
}

/// The four record collections for a set of characters.
#[derive(Debug, Clone, Default)]
pub struct ActivityData {
  pub wallet_journals: Vec<WalletEntry>,
  pub assets: Vec<AssetEntry>,
  pub corp_history: Vec<CorpHistoryEntry>,
  pub characters: Vec<CharacterRecord>,
}

/// Where character and activity records come from.
pub trait DataSource {
  /// Case-insensitive exact name match.
  fn find_character_by_name(&self, name: &str) -> Result<Option<CharacterRecord>, EngineError>;

  fn find_owner_for_character(&self, character_id: i64) -> Result<Option<i64>, EngineError>;

  fn list_characters_for_owner(&self, owner_id: i64) -> Result<Vec<i64>, EngineError>;

  fn load_activity(
    &self,
    character_ids: &[i64],
    window: &LoadWindow,
  ) -> Result<ActivityData, EngineError>;
}

pub struct ContextBuilder<'a, S: DataSource> {
  source: &'a S,
  settings: &'a ScanSettings,
}

impl<'a, S: DataSource> ContextBuilder<'a, S> {
  pub fn new(source: &'a S, settings: &'a ScanSettings) -> Self {
    Self { source, settings }
  }

  /// Resolve `name` to its owning account and load every linked character.
  pub fn build_for_name(
    &self,
    name: &str,
    requested_by: Option<i64>,
    now: DateTime<Utc>,
  ) -> Result<ScanContext, EngineError> {
    let name = name.trim();
    if name.chars().count() < 2 {
      return Err(EngineError::validation(
        "character_name",
        "must be at least 2 characters",
      ));
    }

    let character = self
      .source
      .find_character_by_name(name)?
      .ok_or_else(|| EngineError::CharacterNotFound {
        name: name.to_string(),
      })?;

    let subject_id = character
      .character_id
      .filter(|id| *id > 0)
      .ok_or_else(|| EngineError::MissingCharacterId {
        name: name.to_string(),
      })?;

    let owner_id = self
      .source
      .find_owner_for_character(subject_id)?
      .ok_or(EngineError::NoLinkedAccount {
        character_id: subject_id,
      })?;

    let mut character_ids = self.source.list_characters_for_owner(owner_id)?;
    if character_ids.is_empty() {
      character_ids.push(subject_id);
    }

    let window = LoadWindow::from_settings(self.settings, now)?;
    let data = self.source.load_activity(&character_ids, &window)?;
    debug!(
      subject = subject_id,
      characters = character_ids.len(),
      wallet = data.wallet_journals.len(),
      assets = data.assets.len(),
      history = data.corp_history.len(),
      "context loaded"
    );

    let subject_name = character.character_name.unwrap_or_else(|| name.to_string());
    let mut ctx = ScanContext::new(subject_id, subject_name, character_ids, now)
      .with_wallet_journals(data.wallet_journals)
      .with_assets(data.assets)
      .with_corp_history(data.corp_history)
      .with_characters(data.characters);
    ctx.owner_id = Some(owner_id);
    ctx.requested_by = requested_by;
    Ok(ctx)
  }
}

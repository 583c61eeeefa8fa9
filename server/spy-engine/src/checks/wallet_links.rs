//! Wallet journal entries whose counterparty is on a hostile list.

use chrono::Duration;
use serde::Serialize;

use super::{id_set, Check, IdSet};
use crate::config::Watchlists;
use crate::context::{parse_optional, ScanContext, WalletEntry};
use crate::error::EngineError;
use crate::types::{evidence_row, Finding, Severity};

pub const KEY: &str = "negative_wallet_links";

const EVIDENCE_CAP: usize = 10;
const RECENT_DAYS: i64 = 30;

#[derive(Debug, Clone, Default)]
pub struct WalletLinksCheck {
  hostile_characters: IdSet,
  hostile_corporations: IdSet,
  hostile_alliances: IdSet,
}

#[derive(Debug, Serialize)]
struct WalletHit<'a> {
  character_id: Option<i64>,
  counterparty_id: i64,
  amount: f64,
  date: Option<&'a str>,
  ref_type: Option<&'a str>,
  reason: Option<&'a str>,
}

impl WalletLinksCheck {
  pub fn new(
    characters: impl IntoIterator<Item = i64>,
    corporations: impl IntoIterator<Item = i64>,
    alliances: impl IntoIterator<Item = i64>,
  ) -> Self {
    Self {
      hostile_characters: id_set(characters),
      hostile_corporations: id_set(corporations),
      hostile_alliances: id_set(alliances),
    }
  }

  pub fn from_watchlists(lists: &Watchlists) -> Self {
    Self::new(
      lists.hostile_character_ids.iter().copied(),
      lists.hostile_corporation_ids.iter().copied(),
      lists.hostile_alliance_ids.iter().copied(),
    )
  }

  fn is_hostile(&self, id: i64) -> bool {
    self.hostile_characters.contains(&id)
      || self.hostile_corporations.contains(&id)
      || self.hostile_alliances.contains(&id)
  }
}

/// Second party, then first party, then the generic counterparty field.
/// The first id present wins even if a later field would have matched.
pub fn resolve_counterparty(entry: &WalletEntry) -> Option<i64> {
  entry
    .second_party_id
    .or(entry.first_party_id)
    .or(entry.counterparty_id)
}

/// ⌊log10(1 + total) · 5⌋, capped at 20.
fn amount_score(total_abs_amount: f64) -> i32 {
  ((1.0 + total_abs_amount).log10() * 5.0).floor().clamp(0.0, 20.0) as i32
}

fn severity_for(score: i32) -> Severity {
  if score >= 40 {
    Severity::Critical
  } else if score >= 25 {
    Severity::High
  } else if score >= 15 {
    Severity::Medium
  } else {
    Severity::Low
  }
}

impl Check for WalletLinksCheck {
  fn key(&self) -> &str {
    KEY
  }

  fn description(&self) -> &str {
    "Wallet interactions with negative-standing entities."
  }

  fn evaluate(&self, ctx: &ScanContext) -> Result<Option<Finding>, EngineError> {
    let recent_since = ctx.as_of - Duration::days(RECENT_DAYS);
    let mut hits: Vec<WalletHit<'_>> = Vec::new();
    let mut recent_count = 0usize;
    let mut total_amount = 0.0f64;

    for entry in &ctx.wallet_journals {
      let Some(counterparty_id) = resolve_counterparty(entry) else {
        continue;
      };
      if !self.is_hostile(counterparty_id) {
        continue;
      }

      let amount = entry.amount.unwrap_or(0.0);
      if parse_optional(entry.date.as_deref()).is_some_and(|d| d >= recent_since) {
        recent_count += 1;
      }
      total_amount += amount.abs();

      hits.push(WalletHit {
        character_id: entry.character_id,
        counterparty_id,
        amount,
        date: entry.date.as_deref(),
        ref_type: entry.ref_type.as_deref(),
        reason: entry.reason.as_deref(),
      });
    }

    if hits.is_empty() {
      return Ok(None);
    }

    // Stable: equal amounts keep journal order.
    hits.sort_by(|a, b| b.amount.abs().total_cmp(&a.amount.abs()));

    let frequency_score = (hits.len() * 2).min(20) as i32;
    let recency_score = (recent_count * 2).min(10) as i32;
    let score_delta = (amount_score(total_amount) + frequency_score + recency_score).min(50);

    let evidence = hits
      .iter()
      .take(EVIDENCE_CAP)
      .map(evidence_row)
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Finding {
      key: KEY.to_string(),
      severity: severity_for(score_delta),
      score_delta,
      title: "Negative-standing wallet links".to_string(),
      detail: format!(
        "Found {} wallet links to negative entities. Total amount {:.2}.",
        hits.len(),
        total_amount
      ),
      evidence,
    }))
  }
}

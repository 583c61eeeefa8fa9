//! Hostile corporations/alliances in employment history, and corp hopping.

use std::collections::HashMap;

use chrono::Duration;
use serde::Serialize;

use super::{id_set, Check, IdSet};
use crate::config::Watchlists;
use crate::context::{parse_optional, CorpHistoryEntry, ScanContext};
use crate::error::EngineError;
use crate::types::{evidence_row, Finding, Severity};

pub const KEY: &str = "corp_alliance_history";

const EVIDENCE_CAP: usize = 10;
const RECENT_DAYS: i64 = 365;
const SWITCH_THRESHOLD: usize = 4;
const SWITCH_BONUS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedOn {
  CorporationId,
  AllianceId,
}

#[derive(Debug, Clone, Default)]
pub struct CorpHistoryCheck {
  hostile_corporations: IdSet,
  hostile_alliances: IdSet,
}

#[derive(Debug, Serialize)]
struct HistoryHit<'a> {
  character_id: Option<i64>,
  corporation_id: Option<i64>,
  alliance_id: Option<i64>,
  start_date: Option<&'a str>,
  matched_on: MatchedOn,
}

impl CorpHistoryCheck {
  pub fn new(
    corporations: impl IntoIterator<Item = i64>,
    alliances: impl IntoIterator<Item = i64>,
  ) -> Self {
    Self {
      hostile_corporations: id_set(corporations),
      hostile_alliances: id_set(alliances),
    }
  }

  pub fn from_watchlists(lists: &Watchlists) -> Self {
    Self::new(
      lists.hostile_corporation_ids.iter().copied(),
      lists.hostile_alliance_ids.iter().copied(),
    )
  }

  fn match_entry(&self, entry: &CorpHistoryEntry) -> Option<MatchedOn> {
    if entry
      .corporation_id
      .is_some_and(|id| self.hostile_corporations.contains(&id))
    {
      Some(MatchedOn::CorporationId)
    } else if entry
      .alliance_id
      .is_some_and(|id| self.hostile_alliances.contains(&id))
    {
      Some(MatchedOn::AllianceId)
    } else {
      None
    }
  }
}

/// Entries grouped per character (first-seen order), each group newest first.
///
/// Ordering compares the raw `start_date` text; a missing date compares as
/// the empty string and therefore lands last.
fn group_newest_first(history: &[CorpHistoryEntry]) -> Vec<Vec<&CorpHistoryEntry>> {
  let mut index: HashMap<i64, usize> = HashMap::new();
  let mut groups: Vec<Vec<&CorpHistoryEntry>> = Vec::new();

  for entry in history {
    let Some(character_id) = entry.character_id else {
      continue;
    };
    let slot = *index.entry(character_id).or_insert_with(|| {
      groups.push(Vec::new());
      groups.len() - 1
    });
    groups[slot].push(entry);
  }

  for group in &mut groups {
    group.sort_by(|a, b| {
      let a = a.start_date.as_deref().unwrap_or("");
      let b = b.start_date.as_deref().unwrap_or("");
      b.cmp(a)
    });
  }
  groups
}

fn severity_for(score: i32) -> Severity {
  if score >= 30 {
    Severity::High
  } else if score >= 15 {
    Severity::Medium
  } else {
    Severity::Low
  }
}

impl Check for CorpHistoryCheck {
  fn key(&self) -> &str {
    KEY
  }

  fn description(&self) -> &str {
    "Risk from negative corp/alliance history and frequent switches."
  }

  fn evaluate(&self, ctx: &ScanContext) -> Result<Option<Finding>, EngineError> {
    let recent_since = ctx.as_of - Duration::days(RECENT_DAYS);
    let mut hits: Vec<HistoryHit<'_>> = Vec::new();
    let mut switch_count = 0usize;

    for group in group_newest_first(&ctx.corp_history) {
      let mut last_corp: Option<i64> = None;

      for entry in group {
        if let Some(matched_on) = self.match_entry(entry) {
          hits.push(HistoryHit {
            character_id: entry.character_id,
            corporation_id: entry.corporation_id,
            alliance_id: entry.alliance_id,
            start_date: entry.start_date.as_deref(),
            matched_on,
          });
        }

        let is_recent =
          parse_optional(entry.start_date.as_deref()).is_some_and(|d| d >= recent_since);
        if !is_recent {
          continue;
        }
        // A recent entry with no corporation resets the walk.
        if let Some(prev) = last_corp {
          if entry.corporation_id != Some(prev) {
            switch_count += 1;
          }
        }
        last_corp = entry.corporation_id;
      }
    }

    if hits.is_empty() && switch_count == 0 {
      return Ok(None);
    }

    let switch_bonus = if switch_count >= SWITCH_THRESHOLD {
      SWITCH_BONUS
    } else {
      0
    };
    let score_delta = (hits.len().saturating_mul(6) + switch_bonus).min(40) as i32;

    let evidence = hits
      .iter()
      .take(EVIDENCE_CAP)
      .map(evidence_row)
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Finding {
      key: KEY.to_string(),
      severity: severity_for(score_delta),
      score_delta,
      title: "Corp/alliance history risk".to_string(),
      detail: format!(
        "Negative corp/alliance hits: {}. Recent switches: {}.",
        hits.len(),
        switch_count
      ),
      evidence,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  fn entry(character_id: i64, corp: i64, alliance: Option<i64>, date: &str) -> CorpHistoryEntry {
    CorpHistoryEntry {
      character_id: Some(character_id),
      corporation_id: Some(corp),
      alliance_id: alliance,
      start_date: Some(date.to_string()),
    }
  }

  fn ctx(history: Vec<CorpHistoryEntry>) -> ScanContext {
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
    ScanContext::new(1, "Test Char", vec![1, 2], now).with_corp_history(history)
  }

  #[test]
  fn frequent_recent_switches_earn_bonus_only() {
    let check = CorpHistoryCheck::new([1000169], [99000006]);
    let history = vec![
      entry(1, 501, None, "2024-03-01 00:00:00"),
      entry(1, 502, None, "2024-05-01 00:00:00"),
      entry(1, 503, None, "2024-07-01 00:00:00"),
      entry(1, 504, None, "2024-09-01 00:00:00"),
      entry(1, 505, None, "2024-11-01 00:00:00"),
    ];
    let finding = check.evaluate(&ctx(history)).unwrap().unwrap();

    assert_eq!(finding.score_delta, 15);
    assert_eq!(finding.severity, Severity::Medium);
    assert!(finding.evidence.is_empty());
    assert_eq!(finding.detail, "Negative corp/alliance hits: 0. Recent switches: 4.");
  }

  #[test]
  fn few_switches_still_report_without_bonus() {
    let check = CorpHistoryCheck::new([], []);
    let history = vec![
      entry(1, 501, None, "2024-06-01"),
      entry(1, 502, None, "2024-09-01"),
    ];
    let finding = check.evaluate(&ctx(history)).unwrap().unwrap();
    assert_eq!(finding.score_delta, 0);
    assert_eq!(finding.severity, Severity::Low);
  }

  #[test]
  fn recent_gap_without_corporation_counts_once_and_resets() {
    let check = CorpHistoryCheck::new([], []);
    let gap = CorpHistoryEntry {
      character_id: Some(1),
      corporation_id: None,
      alliance_id: None,
      start_date: Some("2024-08-01".into()),
    };
    // Newest first: 502, gap, 501.
    let history = vec![entry(1, 501, None, "2024-06-01"), gap, entry(1, 502, None, "2024-10-01")];
    let finding = check.evaluate(&ctx(history)).unwrap().unwrap();

    assert_eq!(finding.detail, "Negative corp/alliance hits: 0. Recent switches: 1.");
    assert_eq!(finding.score_delta, 0);
  }

  #[test]
  fn old_switches_do_not_count() {
    let check = CorpHistoryCheck::new([], []);
    let history = vec![
      entry(1, 501, None, "2019-01-01"),
      entry(1, 502, None, "2020-01-01"),
      entry(1, 503, None, "2021-01-01"),
    ];
    assert!(check.evaluate(&ctx(history)).unwrap().is_none());
  }

  #[test]
  fn hostile_corp_checked_before_alliance() {
    let check = CorpHistoryCheck::new([1000169], [99000006]);
    let history = vec![
      entry(1, 1000169, Some(99000006), "2015-01-01"),
      entry(2, 700, Some(99000006), "2016-01-01"),
    ];
    let finding = check.evaluate(&ctx(history)).unwrap().unwrap();

    assert_eq!(finding.evidence.len(), 2);
    assert_eq!(finding.evidence[0]["matched_on"], "corporation_id");
    assert_eq!(finding.evidence[1]["matched_on"], "alliance_id");
    assert_eq!(finding.evidence[1]["character_id"], 2);
    assert_eq!(finding.score_delta, 12);
    assert_eq!(finding.severity, Severity::Low);
  }

  #[test]
  fn evidence_capped_at_ten_and_score_at_forty() {
    let check = CorpHistoryCheck::new([1000169], []);
    let history = (0..12)
      .map(|i| entry(1, 1000169, None, &format!("2010-01-{:02}", i + 1)))
      .collect();
    let finding = check.evaluate(&ctx(history)).unwrap().unwrap();

    assert_eq!(finding.evidence.len(), 10);
    // newest first within the character
    assert_eq!(finding.evidence[0]["start_date"], "2010-01-12");
    assert_eq!(finding.score_delta, 40);
    assert_eq!(finding.severity, Severity::High);
  }

  #[test]
  fn missing_dates_sort_last() {
    let history = vec![
      CorpHistoryEntry {
        character_id: Some(1),
        corporation_id: Some(10),
        ..Default::default()
      },
      entry(1, 11, None, "2020-01-01"),
      entry(1, 12, None, "2021-01-01"),
    ];
    let groups = group_newest_first(&history);
    assert_eq!(groups.len(), 1);
    let corps: Vec<_> = groups[0].iter().map(|e| e.corporation_id).collect();
    assert_eq!(corps, vec![Some(12), Some(11), Some(10)]);
  }

  #[test]
  fn entries_without_character_are_ignored() {
    let check = CorpHistoryCheck::new([1000169], []);
    let orphan = CorpHistoryEntry {
      corporation_id: Some(1000169),
      start_date: Some("2024-12-01".into()),
      ..Default::default()
    };
    assert!(check.evaluate(&ctx(vec![orphan])).unwrap().is_none());
  }

  #[test]
  fn switches_are_counted_per_character() {
    let check = CorpHistoryCheck::new([], []);
    // interleaved characters: each has only one recent change
    let history = vec![
      entry(1, 501, None, "2024-06-01"),
      entry(2, 601, None, "2024-06-01"),
      entry(1, 502, None, "2024-08-01"),
      entry(2, 602, None, "2024-08-01"),
    ];
    let finding = check.evaluate(&ctx(history)).unwrap().unwrap();
    assert!(finding.detail.ends_with("Recent switches: 2."));
  }
}

//! Young or undatable characters on the owning account.

use serde::Serialize;

use super::Check;
use crate::context::{parse_optional, CharacterRecord, ScanContext};
use crate::error::EngineError;
use crate::types::{evidence_row, Finding, Severity};

pub const KEY: &str = "alt_network_anomalies";

const EVIDENCE_CAP: usize = 20;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgeSignal {
  #[serde(rename = "young_under_30d")]
  YoungUnder30d,
  #[serde(rename = "young_under_90d")]
  YoungUnder90d,
  #[serde(rename = "unknown")]
  Unknown,
  #[serde(rename = "normal")]
  Normal,
}

impl AgeSignal {
  pub fn from_age_days(age_days: Option<i64>) -> Self {
    match age_days {
      None => Self::Unknown,
      Some(d) if d < 30 => Self::YoungUnder30d,
      Some(d) if d < 90 => Self::YoungUnder90d,
      Some(_) => Self::Normal,
    }
  }
}

/// Stateless: the thresholds are fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AltNetworkCheck;

#[derive(Debug, Serialize)]
struct AltSignal<'a> {
  character_id: Option<i64>,
  character_name: Option<&'a str>,
  age_days: Option<i64>,
  signal: AgeSignal,
}

/// Whole days between the birthday and `as_of`, floored.
fn age_days(record: &CharacterRecord, ctx: &ScanContext) -> Option<i64> {
  parse_optional(record.birthday.as_deref())
    .map(|born| (ctx.as_of - born).num_seconds().div_euclid(SECONDS_PER_DAY))
}

fn severity_for(score: i32) -> Severity {
  if score >= 20 {
    Severity::High
  } else if score >= 10 {
    Severity::Medium
  } else {
    Severity::Low
  }
}

impl Check for AltNetworkCheck {
  fn key(&self) -> &str {
    KEY
  }

  fn description(&self) -> &str {
    "Young alts or missing history signals."
  }

  fn evaluate(&self, ctx: &ScanContext) -> Result<Option<Finding>, EngineError> {
    if ctx.characters.is_empty() {
      return Ok(None);
    }

    let (mut young_30, mut young_90, mut unknown) = (0usize, 0usize, 0usize);
    let mut flagged: Vec<AltSignal<'_>> = Vec::new();

    for record in &ctx.characters {
      let age = age_days(record, ctx);
      let signal = AgeSignal::from_age_days(age);
      match signal {
        AgeSignal::YoungUnder30d => young_30 += 1,
        AgeSignal::YoungUnder90d => young_90 += 1,
        AgeSignal::Unknown => unknown += 1,
        AgeSignal::Normal => continue,
      }
      flagged.push(AltSignal {
        character_id: record.character_id,
        character_name: record.character_name.as_deref(),
        age_days: age,
        signal,
      });
    }

    if flagged.is_empty() {
      return Ok(None);
    }

    let score_delta = (young_30 * 6 + young_90 * 3 + unknown * 2).min(30) as i32;
    let evidence = flagged
      .iter()
      .take(EVIDENCE_CAP)
      .map(evidence_row)
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Finding {
      key: KEY.to_string(),
      severity: severity_for(score_delta),
      score_delta,
      title: "Alt network anomalies".to_string(),
      detail: format!(
        "Young alts: {} under 30d, {} under 90d. Unknown ages: {}.",
        young_30, young_90, unknown
      ),
      evidence,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{DateTime, Duration, TimeZone, Utc};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
  }

  fn born_days_ago(id: i64, days: i64) -> CharacterRecord {
    let born = now() - Duration::days(days);
    CharacterRecord {
      character_id: Some(id),
      character_name: Some(format!("Char {}", id)),
      birthday: Some(born.format("%Y-%m-%d %H:%M:%S").to_string()),
      owner_id: Some(1),
    }
  }

  fn ctx(records: Vec<CharacterRecord>) -> ScanContext {
    ScanContext::new(1, "Char 1", vec![1], now()).with_characters(records)
  }

  #[test]
  fn ten_day_old_character_is_young() {
    let finding = AltNetworkCheck
      .evaluate(&ctx(vec![born_days_ago(1, 10)]))
      .unwrap()
      .unwrap();

    assert_eq!(finding.score_delta, 6);
    assert_eq!(finding.severity, Severity::Low);
    assert_eq!(finding.evidence.len(), 1);
    assert_eq!(finding.evidence[0]["signal"], "young_under_30d");
    assert_eq!(finding.evidence[0]["age_days"], 10);
  }

  #[test]
  fn classification_boundaries() {
    assert_eq!(AgeSignal::from_age_days(Some(-3)), AgeSignal::YoungUnder30d);
    assert_eq!(AgeSignal::from_age_days(Some(29)), AgeSignal::YoungUnder30d);
    assert_eq!(AgeSignal::from_age_days(Some(30)), AgeSignal::YoungUnder90d);
    assert_eq!(AgeSignal::from_age_days(Some(89)), AgeSignal::YoungUnder90d);
    assert_eq!(AgeSignal::from_age_days(Some(90)), AgeSignal::Normal);
    assert_eq!(AgeSignal::from_age_days(None), AgeSignal::Unknown);
  }

  #[test]
  fn partial_days_are_floored() {
    let mut record = born_days_ago(1, 0);
    record.birthday = Some("2025-01-14 18:00:00".into());
    assert_eq!(age_days(&record, &ctx(Vec::new())), Some(0));

    record.birthday = Some("2025-01-16 00:00:00".into());
    assert_eq!(age_days(&record, &ctx(Vec::new())), Some(-1));
  }

  #[test]
  fn unparseable_birthday_is_unknown() {
    let mut record = born_days_ago(7, 0);
    record.birthday = Some("sometime in 2003".into());
    let missing = CharacterRecord {
      character_id: Some(8),
      ..Default::default()
    };

    let finding = AltNetworkCheck
      .evaluate(&ctx(vec![record, missing]))
      .unwrap()
      .unwrap();
    assert_eq!(finding.score_delta, 4);
    assert_eq!(finding.evidence[0]["signal"], "unknown");
    assert!(finding.evidence[0]["age_days"].is_null());
    assert_eq!(finding.detail, "Young alts: 0 under 30d, 0 under 90d. Unknown ages: 2.");
  }

  #[test]
  fn all_normal_or_empty_is_absent() {
    assert!(AltNetworkCheck.evaluate(&ctx(Vec::new())).unwrap().is_none());
    let veterans = vec![born_days_ago(1, 400), born_days_ago(2, 90)];
    assert!(AltNetworkCheck.evaluate(&ctx(veterans)).unwrap().is_none());
  }

  #[test]
  fn mixed_network_scores_and_skips_normal() {
    let records = vec![
      born_days_ago(1, 2000),
      born_days_ago(2, 5),
      born_days_ago(3, 45),
      born_days_ago(4, 12),
    ];
    let finding = AltNetworkCheck.evaluate(&ctx(records)).unwrap().unwrap();

    assert_eq!(finding.score_delta, 15);
    assert_eq!(finding.severity, Severity::Medium);
    let ids: Vec<_> = finding
      .evidence
      .iter()
      .map(|row| row["character_id"].as_i64())
      .collect();
    assert_eq!(ids, vec![Some(2), Some(3), Some(4)]);
  }

  #[test]
  fn score_and_evidence_are_capped() {
    let records = (0..25).map(|i| born_days_ago(i, 1)).collect();
    let finding = AltNetworkCheck.evaluate(&ctx(records)).unwrap().unwrap();
    assert_eq!(finding.score_delta, 30);
    assert_eq!(finding.severity, Severity::High);
    assert_eq!(finding.evidence.len(), 20);
    assert_eq!(finding.evidence[19]["character_id"], 19);
  }
}

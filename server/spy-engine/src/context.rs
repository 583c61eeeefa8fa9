//! Scan context: the immutable snapshot every check reads from.
//!
//! Input records come from an external loader and are not trusted to be
//! well-typed, so id, amount and date fields deserialize leniently: anything
//! that is not a usable value becomes `None` instead of failing the scan.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WalletEntry {
  #[serde(default, deserialize_with = "lenient::id")]
  pub character_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::number")]
  pub amount: Option<f64>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub date: Option<String>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub first_party_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub second_party_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub counterparty_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub ref_type: Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssetEntry {
  #[serde(default, deserialize_with = "lenient::id")]
  pub character_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub type_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub group_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub category_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub quantity: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub location_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub location_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CorpHistoryEntry {
  #[serde(default, deserialize_with = "lenient::id")]
  pub character_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub corporation_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::id")]
  pub alliance_id: Option<i64>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub start_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CharacterRecord {
  #[serde(default, deserialize_with = "lenient::id")]
  pub character_id: Option<i64>,
  #[serde(default, alias = "name", deserialize_with = "lenient::text")]
  pub character_name: Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub birthday: Option<String>,
  /// Owning account; only the context builder reads it.
  #[serde(default, alias = "user_id", deserialize_with = "lenient::id")]
  pub owner_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Scan context
// ---------------------------------------------------------------------------

/// Everything the checks may look at for one subject. Built once per scan.
#[derive(Debug, Clone)]
pub struct ScanContext {
  pub subject_id: i64,
  pub subject_name: String,
  pub owner_id: Option<i64>,
  pub requested_by: Option<i64>,
  /// Subject plus every alt on the same owning account.
  pub character_ids: Vec<i64>,
  /// Reference instant for every age/recency computation in this scan.
  pub as_of: DateTime<Utc>,
  pub wallet_journals: Vec<WalletEntry>,
  pub assets: Vec<AssetEntry>,
  pub corp_history: Vec<CorpHistoryEntry>,
  pub characters: Vec<CharacterRecord>,
}

impl ScanContext {
  pub fn new(
    subject_id: i64,
    subject_name: impl Into<String>,
    character_ids: Vec<i64>,
    as_of: DateTime<Utc>,
  ) -> Self {
    Self {
      subject_id,
      subject_name: subject_name.into(),
      owner_id: None,
      requested_by: None,
      character_ids,
      as_of,
      wallet_journals: Vec::new(),
      assets: Vec::new(),
      corp_history: Vec::new(),
      characters: Vec::new(),
    }
  }

  pub fn with_wallet_journals(mut self, entries: Vec<WalletEntry>) -> Self {
    self.wallet_journals = entries;
    self
  }

  pub fn with_assets(mut self, entries: Vec<AssetEntry>) -> Self {
    self.assets = entries;
    self
  }

  pub fn with_corp_history(mut self, entries: Vec<CorpHistoryEntry>) -> Self {
    self.corp_history = entries;
    self
  }

  pub fn with_characters(mut self, records: Vec<CharacterRecord>) -> Self {
    self.characters = records;
    self
  }
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
];

/// Parse a stored timestamp. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let s = raw.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in NAIVE_FORMATS {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Parse an optional stored timestamp (missing → `None`).
pub fn parse_optional(raw: Option<&str>) -> Option<DateTime<Utc>> {
  raw.and_then(parse_timestamp)
}

// ---------------------------------------------------------------------------
// Lenient field deserializers
// ---------------------------------------------------------------------------

pub(crate) mod lenient {
  use serde::{Deserialize, Deserializer};
  use serde_json::Value;

  /// Integer ids: JSON integers, floats (truncated) and numeric strings.
  pub fn value_to_id(v: &Value) -> Option<i64> {
    match v {
      Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
      Value::String(s) => {
        let t = s.trim();
        t.parse::<i64>().ok().or_else(|| {
          t.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64)
        })
      }
      _ => None,
    }
  }

  pub fn value_to_number(v: &Value) -> Option<f64> {
    match v {
      Value::Number(n) => n.as_f64(),
      Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
      _ => None,
    }
  }

  pub fn value_to_text(v: &Value) -> Option<String> {
    match v {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
    }
  }

  pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_to_id))
  }

  pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_to_number))
  }

  pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_to_text))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn parses_common_timestamp_shapes() {
    let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(expected));
    assert_eq!(parse_timestamp("2024-01-02T05:04:05+02:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-01-02 03:04:05"), Some(expected));
    assert_eq!(parse_timestamp("2024-01-02T03:04:05"), Some(expected));
    assert_eq!(
      parse_timestamp("2024-01-02"),
      Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
    );
  }

  #[test]
  fn garbage_dates_are_none() {
    assert_eq!(parse_timestamp(""), None);
    assert_eq!(parse_timestamp("   "), None);
    assert_eq!(parse_timestamp("yesterday-ish"), None);
    assert_eq!(parse_optional(None), None);
  }

  #[test]
  fn malformed_ids_become_none() {
    let json = r#"{
      "character_id": "123",
      "amount": "-2500.5",
      "date": "2024-01-01 00:00:00",
      "first_party_id": 77.0,
      "second_party_id": "not-a-number",
      "counterparty_id": {"nested": true},
      "ref_type": "player_donation"
    }"#;
    let entry: WalletEntry = serde_json::from_str(json).unwrap();
    assert_eq!(entry.character_id, Some(123));
    assert_eq!(entry.amount, Some(-2500.5));
    assert_eq!(entry.first_party_id, Some(77));
    assert_eq!(entry.second_party_id, None);
    assert_eq!(entry.counterparty_id, None);
    assert_eq!(entry.reason, None);
  }

  #[test]
  fn character_record_accepts_aliases() {
    let json = r#"{"character_id": 5, "name": "Alt One", "birthday": null, "user_id": 9}"#;
    let record: CharacterRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.character_name.as_deref(), Some("Alt One"));
    assert_eq!(record.birthday, None);
    assert_eq!(record.owner_id, Some(9));
  }
}

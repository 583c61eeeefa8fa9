//! Assets whose type, group or category is on the suspicious list.

use serde::Serialize;

use super::{id_set, Check, IdSet};
use crate::config::Watchlists;
use crate::context::{AssetEntry, ScanContext};
use crate::error::EngineError;
use crate::types::{evidence_row, Finding, Severity};

pub const KEY: &str = "asset_item_indicators";

const EVIDENCE_CAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedOn {
  TypeId,
  GroupId,
  CategoryId,
}

#[derive(Debug, Clone, Default)]
pub struct AssetIndicatorsCheck {
  suspicious_types: IdSet,
  suspicious_groups: IdSet,
  suspicious_categories: IdSet,
}

#[derive(Debug, Serialize)]
struct AssetHit<'a> {
  character_id: Option<i64>,
  type_id: Option<i64>,
  group_id: Option<i64>,
  category_id: Option<i64>,
  quantity: Option<i64>,
  location_id: Option<i64>,
  location_type: Option<&'a str>,
  matched_on: MatchedOn,
}

impl AssetIndicatorsCheck {
  pub fn new(
    types: impl IntoIterator<Item = i64>,
    groups: impl IntoIterator<Item = i64>,
    categories: impl IntoIterator<Item = i64>,
  ) -> Self {
    Self {
      suspicious_types: id_set(types),
      suspicious_groups: id_set(groups),
      suspicious_categories: id_set(categories),
    }
  }

  pub fn from_watchlists(lists: &Watchlists) -> Self {
    Self::new(
      lists.suspicious_type_ids.iter().copied(),
      lists.suspicious_group_ids.iter().copied(),
      lists.suspicious_category_ids.iter().copied(),
    )
  }

  /// First matching dimension in type → group → category order.
  pub fn match_asset(&self, asset: &AssetEntry) -> Option<MatchedOn> {
    let hit = |id: Option<i64>, set: &IdSet| id.is_some_and(|v| set.contains(&v));
    if hit(asset.type_id, &self.suspicious_types) {
      Some(MatchedOn::TypeId)
    } else if hit(asset.group_id, &self.suspicious_groups) {
      Some(MatchedOn::GroupId)
    } else if hit(asset.category_id, &self.suspicious_categories) {
      Some(MatchedOn::CategoryId)
    } else {
      None
    }
  }
}

fn severity_for(match_count: usize) -> Severity {
  if match_count >= 8 {
    Severity::High
  } else if match_count >= 4 {
    Severity::Medium
  } else {
    Severity::Low
  }
}

impl Check for AssetIndicatorsCheck {
  fn key(&self) -> &str {
    KEY
  }

  fn description(&self) -> &str {
    "Suspicious assets or items found in character inventories."
  }

  fn evaluate(&self, ctx: &ScanContext) -> Result<Option<Finding>, EngineError> {
    let hits: Vec<AssetHit<'_>> = ctx
      .assets
      .iter()
      .filter_map(|asset| {
        self.match_asset(asset).map(|matched_on| AssetHit {
          character_id: asset.character_id,
          type_id: asset.type_id,
          group_id: asset.group_id,
          category_id: asset.category_id,
          quantity: asset.quantity,
          location_id: asset.location_id,
          location_type: asset.location_type.as_deref(),
          matched_on,
        })
      })
      .collect();

    if hits.is_empty() {
      return Ok(None);
    }

    let count = hits.len();
    let evidence = hits
      .iter()
      .take(EVIDENCE_CAP)
      .map(evidence_row)
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Finding {
      key: KEY.to_string(),
      severity: severity_for(count),
      score_delta: (count * 3).min(30) as i32,
      title: "Asset/item indicators".to_string(),
      detail: format!("Detected {} suspicious assets/items.", count),
      evidence,
    }))
  }
}

//! Composite score → risk level.

use crate::types::Severity;

/// Map a composite score onto a risk level. Lower bounds are inclusive.
///
/// Total over all integers; callers clamp to 0..=100 first when that matters.
pub fn score_to_risk_level(score: i64) -> Severity {
  if score >= 70 {
    Severity::Critical
  } else if score >= 40 {
    Severity::High
  } else if score >= 20 {
    Severity::Medium
  } else {
    Severity::Low
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn boundaries_match_table() {
    assert_eq!(score_to_risk_level(0), Severity::Low);
    assert_eq!(score_to_risk_level(19), Severity::Low);
    assert_eq!(score_to_risk_level(20), Severity::Medium);
    assert_eq!(score_to_risk_level(39), Severity::Medium);
    assert_eq!(score_to_risk_level(40), Severity::High);
    assert_eq!(score_to_risk_level(69), Severity::High);
    assert_eq!(score_to_risk_level(70), Severity::Critical);
    assert_eq!(score_to_risk_level(100), Severity::Critical);
  }

  #[test]
  fn out_of_range_scores_still_map() {
    assert_eq!(score_to_risk_level(-5), Severity::Low);
    assert_eq!(score_to_risk_level(250), Severity::Critical);
  }

  #[test]
  fn monotonic_non_decreasing() {
    let mut prev = score_to_risk_level(-10);
    for s in -9..=120 {
      let cur = score_to_risk_level(s);
      assert!(cur >= prev, "tier dropped at {}", s);
      prev = cur;
    }
  }
}

//! Structured error types for the spy engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("character not found: {name}")]
  CharacterNotFound { name: String },

  #[error("character id missing for {name}")]
  MissingCharacterId { name: String },

  #[error("no linked account for character {character_id}")]
  NoLinkedAccount { character_id: i64 },

  #[error("config: {0}")]
  Config(String),

  #[error("unknown check: {0}")]
  UnknownCheck(String),

  #[error("check {key} failed: {reason}")]
  CheckFailed { key: String, reason: String },

  #[error("data source: {0}")]
  Source(String),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("toml: {0}")]
  Toml(#[from] toml::de::Error),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config(msg.into())
  }

  pub fn data_source(msg: impl Into<String>) -> Self {
    Self::Source(msg.into())
  }

  pub fn check_failed(key: &str, cause: impl std::fmt::Display) -> Self {
    Self::CheckFailed {
      key: key.to_string(),
      reason: cause.to_string(),
    }
  }

  /// True for errors caused by the request itself (bad name, unknown subject).
  pub fn is_rejection(&self) -> bool {
    matches!(
      self,
      Self::Validation { .. }
        | Self::CharacterNotFound { .. }
        | Self::MissingCharacterId { .. }
        | Self::NoLinkedAccount { .. }
    )
  }

  /// Message safe to show to the person who requested the scan.
  ///
  /// Rejections keep their wording; anything else collapses to a generic
  /// failure so internals stay in the log.
  pub fn public_message(&self) -> String {
    if self.is_rejection() {
      self.to_string()
    } else {
      "Scan failed.".to_string()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejections_keep_their_message() {
    let err = EngineError::CharacterNotFound {
      name: "Nobody".into(),
    };
    assert_eq!(err.public_message(), "character not found: Nobody");

    let err = EngineError::NoLinkedAccount { character_id: 42 };
    assert!(err.public_message().contains("42"));
  }

  #[test]
  fn internal_faults_are_generic() {
    let err = EngineError::check_failed("negative_wallet_links", "boom");
    assert_eq!(err.to_string(), "check negative_wallet_links failed: boom");
    assert_eq!(err.public_message(), "Scan failed.");

    let err = EngineError::data_source("connection reset");
    assert_eq!(err.public_message(), "Scan failed.");
  }
}

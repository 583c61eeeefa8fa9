//! Spy Detection Engine: deterministic, rule-based espionage risk scoring.
//!
//! Evaluates heuristic checks (hostile wallet links, suspicious assets,
//! corp/alliance history, young alt networks) against a snapshot of one
//! account's activity and aggregates the findings into a 0-100 score and a
//! risk level.
//!
//! No DB, no network; callers supply the data through [`DataSource`] or build
//! a [`ScanContext`] directly.

pub mod builder;
pub mod checks;
pub mod config;
pub mod context;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod risk;
pub mod types;

pub use builder::{ContextBuilder, DataSource, LoadWindow};
pub use checks::Check;
pub use config::Config;
pub use context::ScanContext;
pub use dataset::Dataset;
pub use engine::Runner;
pub use error::EngineError;
pub use risk::score_to_risk_level;
pub use types::{Finding, ScanRequest, ScanResponse, ScanResult, Severity};

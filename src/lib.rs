//! # stockrecon
//!
//! Reconciles two tabular exports of an inventory system by composite key,
//! classifying every record as identical, differing, only in the new export,
//! or only in the old one.

pub mod cli;
pub mod commands;
pub mod data;
pub mod error;
pub mod output;
pub mod progress;
pub mod reconcile;

pub use data::{Dataset, Key, Record, Side};
pub use error::{ReconError, Result};
pub use reconcile::{
    reconcile, reconcile_by_keys, ClassificationResult, ReconcileOptions, ReconcileSummary,
    Reconciler,
};

/// Key columns used when none are given on the command line
pub const DEFAULT_KEY_COLUMNS: [&str; 2] = ["ItemNo", "LocationCode"];

pub fn default_key_columns() -> Vec<String> {
    DEFAULT_KEY_COLUMNS.iter().map(|k| k.to_string()).collect()
}

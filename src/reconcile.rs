//! Composite-key reconciliation of two snapshots
//!
//! Every key found in either dataset lands in exactly one of four sets:
//! identical, differing, only in the new snapshot, only in the old one.

use crate::data::{Dataset, Key, Record, Side};
use crate::error::{ReconError, Result};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Number of matched keys from which the column comparison runs on the rayon pool
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// What to do when a composite key repeats inside one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKeyPolicy {
    #[default]
    Fail,
    KeepFirst,
    KeepLast,
}

impl DuplicateKeyPolicy {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "keep-first" | "first" => Ok(Self::KeepFirst),
            "keep-last" | "last" => Ok(Self::KeepLast),
            _ => Err(format!(
                "Invalid duplicate policy: {}. Use 'fail', 'keep-first', or 'keep-last'",
                s
            )),
        }
    }
}

/// How differing column sets between the two snapshots are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnPolicy {
    /// Compare over the union of both schemas; a one-sided column always differs
    #[default]
    Union,
    /// Refuse to compare unless both snapshots have the same column set
    Strict,
}

/// Parameters for one reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOptions {
    pub key_columns: Vec<String>,
    pub duplicates: DuplicateKeyPolicy,
    pub columns: ColumnPolicy,
}

impl ReconcileOptions {
    pub fn new(key_columns: Vec<String>) -> Self {
        Self {
            key_columns,
            duplicates: DuplicateKeyPolicy::default(),
            columns: ColumnPolicy::default(),
        }
    }

    pub fn with_duplicates(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_column_policy(mut self, policy: ColumnPolicy) -> Self {
        self.columns = policy;
        self
    }
}

/// A key present on both sides with equal values everywhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRow {
    pub key: Key,
    pub old: Record,
    pub new: Record,
}

/// A key present on both sides with at least one differing column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DifferingRow {
    pub key: Key,
    pub old: Record,
    pub new: Record,
    /// Differing column names, in compared-column order
    pub diff_cols: Vec<String>,
}

/// A key present on one side only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlyRow {
    pub key: Key,
    pub record: Record,
}

/// Counts per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub count_identical: usize,
    pub count_differing: usize,
    pub count_only_new: usize,
    pub count_only_old: usize,
}

impl ReconcileSummary {
    pub fn total(&self) -> usize {
        self.count_identical + self.count_differing + self.count_only_new + self.count_only_old
    }

    pub fn has_differences(&self) -> bool {
        self.count_differing > 0 || self.count_only_new > 0 || self.count_only_old > 0
    }
}

/// The four disjoint sets produced by [`Reconciler::reconcile`]
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub key_columns: Vec<String>,
    pub old_columns: Vec<String>,
    pub new_columns: Vec<String>,
    /// Non-key columns of the schema union, old order first
    pub compared_columns: Vec<String>,
    pub matched_identical: Vec<MatchedRow>,
    pub matched_differing: Vec<DifferingRow>,
    pub only_in_new: Vec<OnlyRow>,
    pub only_in_old: Vec<OnlyRow>,
}

impl ClassificationResult {
    pub fn summary(&self) -> ReconcileSummary {
        ReconcileSummary {
            count_identical: self.matched_identical.len(),
            count_differing: self.matched_differing.len(),
            count_only_new: self.only_in_new.len(),
            count_only_old: self.only_in_old.len(),
        }
    }

    /// Every key of the result, across all four sets
    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.matched_identical
            .iter()
            .map(|r| &r.key)
            .chain(self.matched_differing.iter().map(|r| &r.key))
            .chain(self.only_in_new.iter().map(|r| &r.key))
            .chain(self.only_in_old.iter().map(|r| &r.key))
    }
}

/// A compared column and where it lives in each schema
#[derive(Debug, Clone)]
struct ComparedColumn {
    name: String,
    old: Option<usize>,
    new: Option<usize>,
}

/// Key-based snapshot reconciler
pub struct Reconciler;

impl Reconciler {
    /// Classify every key of `v1` and `v2` into the four result sets
    pub fn reconcile(
        v1: &Dataset,
        v2: &Dataset,
        options: &ReconcileOptions,
    ) -> Result<ClassificationResult> {
        Self::validate_key_columns(&options.key_columns)?;
        let old_positions = Self::resolve_key_positions(v1, Side::Old, &options.key_columns)?;
        let new_positions = Self::resolve_key_positions(v2, Side::New, &options.key_columns)?;

        if options.columns == ColumnPolicy::Strict {
            Self::check_same_columns(v1, v2)?;
        }

        let old_index = Self::index_keys(v1, Side::Old, &old_positions, options.duplicates)?;
        let new_index = Self::index_keys(v2, Side::New, &new_positions, options.duplicates)?;
        log::debug!(
            "Indexed {} keys in v1 and {} keys in v2",
            old_index.len(),
            new_index.len()
        );

        let columns = Self::compared_columns(v1, v2, &options.key_columns);

        let mut only_in_old = Vec::new();
        let mut common = Vec::new();
        for (key, &old_row) in &old_index {
            match new_index.get(key) {
                Some(&new_row) => common.push((key, old_row, new_row)),
                None => only_in_old.push(OnlyRow {
                    key: key.clone(),
                    record: v1.records()[old_row].clone(),
                }),
            }
        }

        let only_in_new: Vec<OnlyRow> = new_index
            .iter()
            .filter(|(key, _)| !old_index.contains_key(*key))
            .map(|(key, &new_row)| OnlyRow {
                key: key.clone(),
                record: v2.records()[new_row].clone(),
            })
            .collect();

        let compare = |&(_, old_row, new_row): &(&Key, usize, usize)| {
            diff_columns(&v1.records()[old_row], &v2.records()[new_row], &columns)
        };
        let diffs: Vec<Vec<String>> = if common.len() >= PARALLEL_THRESHOLD {
            log::debug!("Comparing {} matched keys in parallel", common.len());
            common.par_iter().map(compare).collect()
        } else {
            common.iter().map(compare).collect()
        };

        let mut matched_identical = Vec::new();
        let mut matched_differing = Vec::new();
        for ((key, old_row, new_row), diff_cols) in common.into_iter().zip(diffs) {
            let old = v1.records()[old_row].clone();
            let new = v2.records()[new_row].clone();
            if diff_cols.is_empty() {
                matched_identical.push(MatchedRow {
                    key: key.clone(),
                    old,
                    new,
                });
            } else {
                matched_differing.push(DifferingRow {
                    key: key.clone(),
                    old,
                    new,
                    diff_cols,
                });
            }
        }

        Ok(ClassificationResult {
            key_columns: options.key_columns.clone(),
            old_columns: v1.schema().to_vec(),
            new_columns: v2.schema().to_vec(),
            compared_columns: columns.into_iter().map(|c| c.name).collect(),
            matched_identical,
            matched_differing,
            only_in_new,
            only_in_old,
        })
    }

    fn validate_key_columns(key_columns: &[String]) -> Result<()> {
        if key_columns.is_empty() {
            return Err(ReconError::config("At least one key column is required"));
        }

        let mut seen = HashSet::new();
        for column in key_columns {
            if !seen.insert(column.as_str()) {
                return Err(ReconError::config(format!(
                    "Key column '{}' listed more than once",
                    column
                )));
            }
        }
        Ok(())
    }

    fn resolve_key_positions(
        dataset: &Dataset,
        side: Side,
        key_columns: &[String],
    ) -> Result<Vec<usize>> {
        key_columns
            .iter()
            .map(|column| {
                dataset
                    .schema()
                    .position(column)
                    .ok_or_else(|| ReconError::missing_key_column(side, column.as_str()))
            })
            .collect()
    }

    fn check_same_columns(v1: &Dataset, v2: &Dataset) -> Result<()> {
        let missing_in_new: Vec<&str> = v1
            .schema()
            .names()
            .filter(|c| !v2.schema().contains(c))
            .collect();
        let missing_in_old: Vec<&str> = v2
            .schema()
            .names()
            .filter(|c| !v1.schema().contains(c))
            .collect();

        if missing_in_new.is_empty() && missing_in_old.is_empty() {
            return Ok(());
        }

        Err(ReconError::schema_mismatch(format!(
            "column sets differ; missing in v2: [{}]; missing in v1: [{}]",
            missing_in_new.join(", "),
            missing_in_old.join(", ")
        )))
    }

    /// Map each key to its row, keeping first-appearance order
    fn index_keys(
        dataset: &Dataset,
        side: Side,
        positions: &[usize],
        policy: DuplicateKeyPolicy,
    ) -> Result<IndexMap<Key, usize>> {
        let mut index: IndexMap<Key, usize> = IndexMap::with_capacity(dataset.len());
        let mut dropped = 0usize;

        for row in 0..dataset.len() {
            let key = dataset.key_at(row, positions);
            if let Some(existing) = index.get_mut(&key) {
                match policy {
                    DuplicateKeyPolicy::Fail => {
                        return Err(ReconError::duplicate_key(side, key));
                    }
                    DuplicateKeyPolicy::KeepFirst => {}
                    DuplicateKeyPolicy::KeepLast => *existing = row,
                }
                dropped += 1;
            } else {
                index.insert(key, row);
            }
        }

        if dropped > 0 {
            log::warn!(
                "{} dataset: {} rows dropped because of duplicate keys ({:?})",
                side,
                dropped,
                policy
            );
        }

        Ok(index)
    }

    /// Union of non-key columns: v1 order, then columns only v2 has
    fn compared_columns(v1: &Dataset, v2: &Dataset, key_columns: &[String]) -> Vec<ComparedColumn> {
        let is_key = |name: &str| key_columns.iter().any(|k| k == name);

        let mut columns: Vec<ComparedColumn> = v1
            .schema()
            .names()
            .filter(|name| !is_key(*name))
            .map(|name| ComparedColumn {
                name: name.to_string(),
                old: v1.schema().position(name),
                new: v2.schema().position(name),
            })
            .collect();

        columns.extend(
            v2.schema()
                .names()
                .filter(|name| !is_key(*name) && !v1.schema().contains(*name))
                .map(|name| ComparedColumn {
                    name: name.to_string(),
                    old: None,
                    new: v2.schema().position(name),
                }),
        );

        columns
    }
}

/// Names of the columns whose values differ between two matched records
fn diff_columns(old: &Record, new: &Record, columns: &[ComparedColumn]) -> Vec<String> {
    columns
        .iter()
        .filter(|column| match (column.old, column.new) {
            (Some(o), Some(n)) => old.get(o) != new.get(n),
            _ => true,
        })
        .map(|column| column.name.clone())
        .collect()
}

/// Reconcile two datasets with the given options
pub fn reconcile(
    v1: &Dataset,
    v2: &Dataset,
    options: &ReconcileOptions,
) -> Result<ClassificationResult> {
    Reconciler::reconcile(v1, v2, options)
}

/// Reconcile with default policies on the given key columns
pub fn reconcile_by_keys(
    v1: &Dataset,
    v2: &Dataset,
    key_columns: &[&str],
) -> Result<ClassificationResult> {
    let options = ReconcileOptions::new(key_columns.iter().map(|k| k.to_string()).collect());
    Reconciler::reconcile(v1, v2, &options)
}

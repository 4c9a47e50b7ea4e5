//! Output writing and summary formatting

use crate::data::Record;
use crate::error::Result;
use crate::reconcile::{ClassificationResult, DifferingRow, OnlyRow, ReconcileSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the extra column carrying differing field names
pub const DIFF_COLS_COLUMN: &str = "diff_cols";

/// Suffix for values taken from the old snapshot in the differing file
pub const OLD_SUFFIX: &str = "_v1";

/// Suffix for values taken from the new snapshot in the differing file
pub const NEW_SUFFIX: &str = "_v2";

/// Where and how the four result files are written
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub outdir: PathBuf,
    pub prefix: String,
    pub delimiter: u8,
    /// Joins the names in the `diff_cols` column
    pub diff_separator: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("."),
            prefix: String::new(),
            delimiter: b',',
            diff_separator: ",".to_string(),
        }
    }
}

/// Locations of the four result files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub identical: PathBuf,
    pub differing: PathBuf,
    pub only_new: PathBuf,
    pub only_old: PathBuf,
}

impl OutputPaths {
    pub fn new(outdir: &Path, prefix: &str) -> Self {
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}_", prefix)
        };
        let file = |name: &str| outdir.join(format!("{}{}.csv", prefix, name));

        Self {
            identical: file("coinciden_completamente"),
            differing: file("difieren"),
            only_new: file("solo_en_v2"),
            only_old: file("solo_en_v1"),
        }
    }

    /// All four paths in reporting order
    pub fn all(&self) -> [&Path; 4] {
        [
            self.identical.as_path(),
            self.differing.as_path(),
            self.only_new.as_path(),
            self.only_old.as_path(),
        ]
    }
}

/// Writes a [`ClassificationResult`] as four delimited files
pub struct OutputWriter {
    options: OutputOptions,
}

impl OutputWriter {
    pub fn new(options: OutputOptions) -> Self {
        Self { options }
    }

    /// Write all four files, creating the output directory if needed
    pub fn write_all(&self, result: &ClassificationResult) -> Result<OutputPaths> {
        fs::create_dir_all(&self.options.outdir)?;
        let paths = OutputPaths::new(&self.options.outdir, &self.options.prefix);

        let identical = result.matched_identical.iter().map(|r| r.old.values());
        self.write_table(&paths.identical, &result.old_columns, identical)?;

        self.write_table(
            &paths.differing,
            &differing_header(result),
            result
                .matched_differing
                .iter()
                .map(|r| differing_row(result, r, &self.options.diff_separator)),
        )?;

        self.write_table(&paths.only_new, &result.new_columns, only_values(&result.only_in_new))?;
        self.write_table(&paths.only_old, &result.old_columns, only_values(&result.only_in_old))?;

        log::debug!("Wrote result files to {}", self.options.outdir.display());
        Ok(paths)
    }

    fn write_table<I, R>(&self, path: &Path, header: &[String], rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(path)?;

        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn only_values(rows: &[OnlyRow]) -> impl Iterator<Item = &[String]> + '_ {
    rows.iter().map(|r| r.record.values())
}

/// Header of the differing file: keys, `diff_cols`, old values, new values
pub fn differing_header(result: &ClassificationResult) -> Vec<String> {
    let mut header = result.key_columns.clone();
    header.push(DIFF_COLS_COLUMN.to_string());
    header.extend(
        result
            .compared_columns
            .iter()
            .map(|c| format!("{}{}", c, OLD_SUFFIX)),
    );
    header.extend(
        result
            .compared_columns
            .iter()
            .map(|c| format!("{}{}", c, NEW_SUFFIX)),
    );
    header
}

/// One row of the differing file; values absent from a side's schema are empty
pub fn differing_row(result: &ClassificationResult, row: &DifferingRow, separator: &str) -> Vec<String> {
    let lookup = |columns: &[String], record: &Record, name: &str| -> String {
        columns
            .iter()
            .position(|c| c == name)
            .and_then(|p| record.get(p))
            .unwrap_or_default()
            .to_string()
    };

    let mut values: Vec<String> = row.key.values().to_vec();
    values.push(row.diff_cols.join(separator));
    values.extend(
        result
            .compared_columns
            .iter()
            .map(|c| lookup(&result.old_columns, &row.old, c)),
    );
    values.extend(
        result
            .compared_columns
            .iter()
            .map(|c| lookup(&result.new_columns, &row.new, c)),
    );
    values
}

/// Everything reported about one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub old_source: String,
    pub new_source: String,
    pub key_columns: Vec<String>,
    pub summary: ReconcileSummary,
    pub outputs: OutputPaths,
    pub generated_at: DateTime<Utc>,
}

/// Pretty printer for run summaries
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print counts and output locations
    pub fn print_report(report: &RunReport) {
        let summary = &report.summary;
        println!("📊 Reconciliation summary");
        println!("├─ v1: {}", report.old_source);
        println!("├─ v2: {}", report.new_source);
        println!("├─ Keys: {}", report.key_columns.join(", "));
        println!("├─ ✅ Identical rows: {}", summary.count_identical);
        println!(
            "├─ {} Rows with differences (same key): {}",
            marker(summary.count_differing),
            summary.count_differing
        );
        println!(
            "├─ {} Only in v2: {}",
            marker(summary.count_only_new),
            summary.count_only_new
        );
        println!(
            "└─ {} Only in v1: {}",
            marker(summary.count_only_old),
            summary.count_only_old
        );

        println!();
        println!("📁 Generated files:");
        let paths = report.outputs.all();
        for (i, path) in paths.iter().enumerate() {
            let prefix = if i == paths.len() - 1 { "└─" } else { "├─" };
            println!("{} {}", prefix, path.display());
        }
    }

    /// Machine-readable `key=value` lines
    pub fn print_quiet(report: &RunReport) {
        let summary = &report.summary;
        println!("identical={}", summary.count_identical);
        println!("differing={}", summary.count_differing);
        println!("only_in_v2={}", summary.count_only_new);
        println!("only_in_v1={}", summary.count_only_old);
    }
}

fn marker(count: usize) -> &'static str {
    if count == 0 {
        "✅"
    } else {
        "❌"
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    pub fn format_report(report: &RunReport) -> Result<String> {
        Self::format(report)
    }
}

//! Command-line interface for stockrecon

use crate::reconcile::{ColumnPolicy, DuplicateKeyPolicy};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stockrecon")]
#[command(about = "Compare two CSV snapshots by composite key and write four classified result files")]
#[command(version)]
pub struct Cli {
    /// Original CSV export (v1)
    pub csv_v1: PathBuf,

    /// New CSV export (v2)
    pub csv_v2: PathBuf,

    /// Key columns forming the composite key, in order
    #[arg(long, num_args = 1.., default_values_t = crate::default_key_columns())]
    pub keys: Vec<String>,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub outdir: PathBuf,

    /// Prefix for output file names
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Field delimiter of the input and output files
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Separator used to join names in the diff_cols column
    #[arg(long, default_value = ",")]
    pub diff_separator: String,

    /// Duplicate key handling: "fail", "keep-first", or "keep-last"
    #[arg(long, default_value = "fail", value_parser = DuplicateKeyPolicy::parse)]
    pub duplicates: DuplicateKeyPolicy,

    /// Require both files to have the same column set
    #[arg(long)]
    pub strict_columns: bool,

    /// Summary format: "pretty", "json"
    #[arg(long, default_value = "pretty", value_parser = OutputFormat::parse)]
    pub format: OutputFormat,

    /// Quiet output (machine-readable counts)
    #[arg(long)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn column_policy(&self) -> ColumnPolicy {
        if self.strict_columns {
            ColumnPolicy::Strict
        } else {
            ColumnPolicy::Union
        }
    }
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Accept a single ASCII character, or `\t` / `tab` for tabs
fn parse_delimiter(s: &str) -> Result<u8, String> {
    if s == "\\t" || s.eq_ignore_ascii_case("tab") {
        return Ok(b'\t');
    }

    let bytes = s.as_bytes();
    if bytes.len() != 1 || !bytes[0].is_ascii() {
        return Err(format!(
            "Invalid delimiter: '{}'. Must be a single ASCII character.",
            s
        ));
    }

    if bytes[0] == b'"' || bytes[0] == b'\n' || bytes[0] == b'\r' {
        return Err(format!("Delimiter '{}' is not allowed", s.escape_default()));
    }

    Ok(bytes[0])
}

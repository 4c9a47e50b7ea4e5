//! Command implementation for the stockrecon CLI

use crate::cli::{Cli, OutputFormat};
use crate::data::{load_delimited, LoadOptions, Side};
use crate::error::Result;
use crate::output::{JsonFormatter, OutputOptions, OutputWriter, PrettyPrinter, RunReport};
use crate::progress::{Phase, ProgressReporter};
use crate::reconcile::{ReconcileOptions, Reconciler};

/// Load both snapshots, reconcile them, write the four files and print the summary
pub fn execute(cli: &Cli) -> Result<RunReport> {
    let machine_output = cli.quiet || cli.format == OutputFormat::Json;
    let mut progress = if machine_output {
        ProgressReporter::new_minimal()
    } else {
        ProgressReporter::new()
    };

    let load_options = LoadOptions {
        delimiter: cli.delimiter,
    };

    progress.start(Phase::Load);
    let v1 = load_delimited(&cli.csv_v1, Side::Old, &load_options)?;
    let v2 = load_delimited(&cli.csv_v2, Side::New, &load_options)?;
    progress.finish(&format!("Loaded {} rows from v1 and {} rows from v2", v1.len(), v2.len()));

    let options = ReconcileOptions::new(cli.keys.clone())
        .with_duplicates(cli.duplicates)
        .with_column_policy(cli.column_policy());

    progress.start(Phase::Compare);
    let result = Reconciler::reconcile(&v1, &v2, &options)?;
    let summary = result.summary();
    progress.finish(&format!("Classified {} keys", summary.total()));

    progress.start(Phase::Write);
    let writer = OutputWriter::new(OutputOptions {
        outdir: cli.outdir.clone(),
        prefix: cli.prefix.clone(),
        delimiter: cli.delimiter,
        diff_separator: cli.diff_separator.clone(),
    });
    let outputs = writer.write_all(&result)?;
    progress.finish(&format!("Wrote results to {}", cli.outdir.display()));

    log::debug!("Reconciliation finished in {:?}", progress.elapsed());

    let report = RunReport {
        old_source: v1.source().to_string(),
        new_source: v2.source().to_string(),
        key_columns: options.key_columns,
        summary,
        outputs,
        generated_at: chrono::Utc::now(),
    };

    if cli.quiet {
        PrettyPrinter::print_quiet(&report);
    } else {
        match cli.format {
            OutputFormat::Pretty => PrettyPrinter::print_report(&report),
            OutputFormat::Json => println!("{}", JsonFormatter::format_report(&report)?),
        }
    }

    Ok(report)
}

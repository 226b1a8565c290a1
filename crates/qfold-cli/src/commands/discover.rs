use crate::cli::DiscoverArgs;
use crate::config::PartialDiscoveryConfig;
use crate::error::{CliError, Result};
use crate::utils::io;
use crate::utils::progress::CliProgressHandler;
use qfold::engine::control::AttemptControl;
use qfold::engine::progress::{Progress, ProgressReporter};
use qfold::workflows::batch::{self, BatchEntry};
use std::time::Duration;
use tracing::{info, warn};

pub fn run(args: DiscoverArgs, show_progress: bool) -> Result<()> {
    let partial_config = PartialDiscoveryConfig::from_optional_file(args.config.as_deref())?;
    let tables = partial_config.load_tables()?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let sequences = collect_sequences(&args)?;
    info!(count = sequences.len(), "Collected input sequences.");

    std::fs::create_dir_all(&args.output)?;
    let summary_path = args
        .summary
        .clone()
        .unwrap_or_else(|| args.output.join("summary.csv"));

    let mut control = AttemptControl::new();
    if let Some(seconds) = args.time_limit {
        let budget = Duration::try_from_secs_f64(seconds).map_err(|_| {
            CliError::Argument(format!("time limit {seconds} is not a valid duration"))
        })?;
        control = control.with_timeout(budget);
    }

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting discovery for {} sequence(s)...", sequences.len());
    reporter.report(Progress::PhaseStart { name: "Discovery" });
    let report = batch::run(&sequences, &config, &tables, &control, &reporter);
    reporter.report(Progress::PhaseFinish);

    for record in report.records() {
        let path = io::write_discovery(&args.output, &record.to_export())?;
        info!(
            "Writing discovery {} (rigor {:.3}) to {:?}",
            record.id(),
            record.verdict().rigor_score,
            &path
        );
        println!(
            "✓ {} accepted (rigor {:.3}, energy {:.3} kcal/mol): {}",
            record.sequence(),
            record.verdict().rigor_score,
            record.report().total_energy,
            path.display()
        );
    }

    let rows: Vec<_> = report.entries.iter().map(BatchEntry::summary).collect();
    io::write_summary(&summary_path, &rows)?;
    println!(
        "Attempts: {}, accepted: {}, rejected: {}, errors: {}. Summary written to: {}",
        report.attempts,
        report.accepted,
        report.rejected,
        report.failed,
        summary_path.display()
    );

    if report.accepted == 0 {
        warn!("Run completed but no candidate was accepted.");
    }
    if report.attempts == 0 {
        if let Some(err) = report.entries.into_iter().find_map(|e| e.result.err()) {
            return Err(err.into());
        }
    }
    Ok(())
}

fn collect_sequences(args: &DiscoverArgs) -> Result<Vec<String>> {
    let mut sequences: Vec<String> = args.sequences.iter().map(|s| s.trim().to_string()).collect();
    if let Some(path) = &args.input {
        sequences.extend(io::read_sequences(path)?);
    }
    if sequences.is_empty() {
        return Err(CliError::Argument(
            "no sequences given; pass them as arguments or with --input".to_string(),
        ));
    }
    Ok(sequences)
}

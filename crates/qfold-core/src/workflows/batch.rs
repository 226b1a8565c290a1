use super::discover::{AttemptOutcome, AttemptSummary, attempt_discovery};
use super::record::DiscoveryRecord;
use crate::core::tables::ReferenceTables;
use crate::engine::config::DiscoveryConfig;
use crate::engine::control::AttemptControl;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug)]
pub struct BatchEntry {
    pub input: String,
    pub result: Result<AttemptOutcome, EngineError>,
}

impl BatchEntry {
    pub fn summary(&self) -> AttemptSummary {
        match &self.result {
            Ok(outcome) => outcome.summary(),
            Err(err) => AttemptSummary {
                sequence: self.input.clone(),
                outcome: "error".to_string(),
                id: None,
                seed: None,
                rigor_score: None,
                total_energy: None,
                detail: err.to_string(),
            },
        }
    }
}

/// Results of a batch run, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    /// Attempts that reached a terminal state, accepted or rejected.
    pub attempts: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn records(&self) -> impl Iterator<Item = &DiscoveryRecord> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().ok().and_then(AttemptOutcome::record))
    }
}

/// Runs one attempt per sequence. A rejection or an error for one sequence never stops the
/// others; each shares `control`, so cancelling it winds the whole batch down.
#[instrument(skip_all, name = "batch_driver", fields(sequences = sequences.len()))]
pub fn run<S>(
    sequences: &[S],
    config: &DiscoveryConfig,
    tables: &ReferenceTables,
    control: &AttemptControl,
    reporter: &ProgressReporter,
) -> BatchReport
where
    S: AsRef<str> + Sync,
{
    reporter.report(Progress::TaskStart {
        total_steps: sequences.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = sequences.iter();

    #[cfg(feature = "parallel")]
    let iterator = sequences.par_iter();

    // Attempts running side by side would interleave their phases, so only a lone attempt
    // reports through the batch reporter.
    let single = sequences.len() == 1;
    let entries: Vec<BatchEntry> = iterator
        .map(|input| {
            let input = input.as_ref();
            let silent = ProgressReporter::new();
            let attempt_reporter = if single { reporter } else { &silent };
            let result = attempt_discovery(input, config, tables, control, attempt_reporter);
            if let Err(err) = &result {
                warn!(sequence = input, error = %err, "Attempt failed.");
            }
            reporter.report(Progress::Message(attempt_message(input, &result)));
            reporter.report(Progress::TaskIncrement);
            BatchEntry {
                input: input.to_string(),
                result,
            }
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let mut report = BatchReport::default();
    for entry in &entries {
        match &entry.result {
            Ok(AttemptOutcome::Accepted(_)) => report.accepted += 1,
            Ok(AttemptOutcome::Rejected(_)) => report.rejected += 1,
            Err(_) => report.failed += 1,
        }
    }
    report.attempts = report.accepted + report.rejected;
    report.entries = entries;

    info!(
        attempts = report.attempts,
        accepted = report.accepted,
        rejected = report.rejected,
        failed = report.failed,
        "Batch finished."
    );
    report
}

fn attempt_message(input: &str, result: &Result<AttemptOutcome, EngineError>) -> String {
    match result {
        Ok(AttemptOutcome::Accepted(record)) => format!(
            "{input}: accepted (rigor {:.3})",
            record.verdict().rigor_score
        ),
        Ok(AttemptOutcome::Rejected(rejection)) => {
            format!("{input}: rejected, {}", rejection.reason)
        }
        Err(err) => format!("{input}: error, {err}"),
    }
}

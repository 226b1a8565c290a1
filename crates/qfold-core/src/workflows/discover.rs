use super::record::{DiscoveryRecord, DiscoveryRecordBuilder};
use crate::core::encoder::encode_str;
use crate::core::energy::evaluator::{EnergyEvaluator, EnergyReport, GAS_CONSTANT};
use crate::core::models::conformation::Conformation;
use crate::core::models::sequence::Sequence;
use crate::core::tables::ReferenceTables;
use crate::engine::config::DiscoveryConfig;
use crate::engine::control::{AttemptControl, InterruptReason};
use crate::engine::correlation::CorrelationSummary;
use crate::engine::error::EngineError;
use crate::engine::evolution::{EvolutionTrace, evolve};
use crate::engine::graph::{Basis, StateGraph};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::sampling::collapse;
use crate::engine::validation::{GateKind, ValidationVerdict, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Stream used by the primary collapse; replicates use `1..=R`.
const PRIMARY_STREAM: u64 = 0;

/// Draws per replicate. A replicate hypothesis is the raw draw from the evolved amplitudes,
/// not the Boltzmann-best of a pool, and equals draw 0 of a full pool on the same stream.
const REPLICATE_DRAWS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStage {
    Encoded,
    GraphBuilt,
    Evolved,
    Sampled,
    Scored,
}

impl fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttemptStage::Encoded => "encoded",
            AttemptStage::GraphBuilt => "graph-built",
            AttemptStage::Evolved => "evolved",
            AttemptStage::Sampled => "sampled",
            AttemptStage::Scored => "scored",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    FailedGates(Vec<GateKind>),
    /// Every gate passed but the rigor score did not exceed the threshold.
    BelowThreshold { rigor_score: f64, rigor_threshold: f64 },
    /// `stage` is the last stage completed before the attempt was stopped.
    Interrupted {
        stage: AttemptStage,
        reason: InterruptReason,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::FailedGates(gates) => {
                let names: Vec<&str> = gates.iter().map(|g| g.name()).collect();
                write!(f, "failed gates: {}", names.join(", "))
            }
            RejectionReason::BelowThreshold {
                rigor_score,
                rigor_threshold,
            } => write!(f, "rigor score {rigor_score:.3} <= {rigor_threshold}"),
            RejectionReason::Interrupted { stage, reason } => {
                write!(f, "interrupted after stage '{stage}' ({reason:?})")
            }
        }
    }
}

/// Terminal record of a rejected attempt. Carries every gate score when scoring was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionReport {
    pub sequence: Sequence,
    pub seed: u64,
    pub reason: RejectionReason,
    pub verdict: Option<ValidationVerdict>,
    pub best_energy: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Accepted(Box<DiscoveryRecord>),
    Rejected(RejectionReport),
}

impl AttemptOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AttemptOutcome::Accepted(_))
    }

    pub fn record(&self) -> Option<&DiscoveryRecord> {
        match self {
            AttemptOutcome::Accepted(record) => Some(record),
            AttemptOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectionReport> {
        match self {
            AttemptOutcome::Accepted(_) => None,
            AttemptOutcome::Rejected(report) => Some(report),
        }
    }

    /// The verdict, when the attempt reached scoring.
    pub fn verdict(&self) -> Option<&ValidationVerdict> {
        match self {
            AttemptOutcome::Accepted(record) => Some(record.verdict()),
            AttemptOutcome::Rejected(report) => report.verdict.as_ref(),
        }
    }

    pub fn seed(&self) -> u64 {
        match self {
            AttemptOutcome::Accepted(record) => record.seed(),
            AttemptOutcome::Rejected(report) => report.seed,
        }
    }

    pub fn summary(&self) -> AttemptSummary {
        match self {
            AttemptOutcome::Accepted(record) => AttemptSummary {
                sequence: record.sequence().to_string(),
                outcome: "accepted".to_string(),
                id: Some(record.id().to_string()),
                seed: Some(record.seed()),
                rigor_score: Some(record.verdict().rigor_score),
                total_energy: Some(record.report().total_energy),
                detail: String::new(),
            },
            AttemptOutcome::Rejected(report) => AttemptSummary {
                sequence: report.sequence.to_string(),
                outcome: "rejected".to_string(),
                id: None,
                seed: Some(report.seed),
                rigor_score: report.verdict.as_ref().map(|v| v.rigor_score),
                total_energy: report.best_energy,
                detail: report.reason.to_string(),
            },
        }
    }
}

/// One flat row per attempt, suitable for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub sequence: String,
    pub outcome: String,
    pub id: Option<String>,
    pub seed: Option<u64>,
    pub rigor_score: Option<f64>,
    pub total_energy: Option<f64>,
    pub detail: String,
}

/// Runs one full discovery attempt for `sequence`.
///
/// Malformed input and configuration errors surface as `Err`. Rejection, including an
/// interruption through `control`, is an ordinary `Ok(AttemptOutcome::Rejected)`.
#[instrument(skip_all, name = "discovery_attempt")]
pub fn attempt_discovery(
    sequence: &str,
    config: &DiscoveryConfig,
    tables: &ReferenceTables,
    control: &AttemptControl,
    reporter: &ProgressReporter,
) -> Result<AttemptOutcome, EngineError> {
    // === Stage: Encoded ===
    let encoded = encode_str(sequence)?;
    let sequence = encoded.sequence().clone();
    if config.sample_count < 1 {
        return Err(EngineError::InsufficientSamples {
            what: "sample_count",
            requested: config.sample_count,
        });
    }
    if config.replicate_count < 1 {
        return Err(EngineError::InsufficientSamples {
            what: "replicate_count",
            requested: config.replicate_count,
        });
    }
    config.validate()?;
    for operator in &config.evolution.operators {
        operator.validate()?;
    }

    let seed = config.seed.unwrap_or_else(draw_seed);
    info!(sequence = %sequence, seed, "Starting discovery attempt.");

    let interrupted = |stage: AttemptStage, reason: InterruptReason, best_energy: Option<f64>| {
        info!(%stage, ?reason, "Attempt rejected: interrupted.");
        AttemptOutcome::Rejected(RejectionReport {
            sequence: sequence.clone(),
            seed,
            reason: RejectionReason::Interrupted { stage, reason },
            verdict: None,
            best_energy,
        })
    };

    // === Stage: GraphBuilt ===
    let evaluator = EnergyEvaluator::new(tables, config.energy);
    let mut graph = reporter.phase("Building State Graph", || {
        StateGraph::build(
            &encoded,
            Basis::new(config.basis_side()),
            config.temperature,
            config.initial_amplitudes,
            &config.graph,
            tables,
            &evaluator,
        )
    });

    // === Stage: Evolved ===
    let (class_tag, reference) = tables.class_reference(config.class_tag.as_deref());
    let trace: EvolutionTrace = reporter.phase("Evolution", || {
        evolve(
            &mut graph,
            &config.evolution,
            GAS_CONSTANT * config.temperature,
            reference.target_composition(),
            &tables.correlation_thresholds(),
            control,
            reporter,
        )
    })?;
    if let Some(reason) = trace.interrupted {
        return Ok(interrupted(AttemptStage::GraphBuilt, reason, None));
    }
    let correlation = CorrelationSummary::from_correlations(graph.correlations());
    let graph = Arc::new(graph);

    // === Stage: Sampled ===
    let evaluate = |c: &Conformation| evaluator.evaluate(&sequence, c);
    let best = reporter
        .phase("Collapse", || {
            collapse(
                &graph,
                config.sample_count,
                config.temperature,
                seed,
                PRIMARY_STREAM,
                &evaluate,
            )
        })?
        .into_best()
        .ok_or_else(|| EngineError::Internal("collapse produced an empty pool".to_string()))?;
    info!(
        total_energy = best.report.total_energy,
        secondary_structure = %best.report.secondary_structure_string(),
        "Primary collapse complete."
    );
    if let Some(reason) = control.interruption() {
        return Ok(interrupted(
            AttemptStage::Sampled,
            reason,
            Some(best.report.total_energy),
        ));
    }

    reporter.report(Progress::PhaseStart { name: "Replicates" });
    reporter.report(Progress::TaskStart {
        total_steps: config.replicate_count as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = 1..=config.replicate_count as u64;

    #[cfg(feature = "parallel")]
    let iterator = (1..=config.replicate_count as u64).into_par_iter();

    let replicates: Vec<Option<EnergyReport>> = iterator
        .map(|stream| -> Result<Option<EnergyReport>, EngineError> {
            if control.interruption().is_some() {
                return Ok(None);
            }
            let pool = collapse(
                &graph,
                REPLICATE_DRAWS,
                config.temperature,
                seed,
                stream,
                &evaluate,
            )?;
            reporter.report(Progress::TaskIncrement);
            let draw = pool.into_best().ok_or_else(|| {
                EngineError::Internal(format!("replicate {stream} produced an empty pool"))
            })?;
            Ok(Some(draw.report))
        })
        .collect::<Result<_, _>>()?;
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let Some(replicates): Option<Vec<EnergyReport>> = replicates.into_iter().collect() else {
        let reason = control
            .interruption()
            .unwrap_or(InterruptReason::Cancelled);
        return Ok(interrupted(
            AttemptStage::Sampled,
            reason,
            Some(best.report.total_energy),
        ));
    };

    // === Stage: Scored ===
    let verdict = reporter.phase("Validation", || {
        Validator::new(&config.validation, tables).validate(
            &sequence,
            &best.report,
            config.class_tag.as_deref(),
            &replicates,
            config.rigor_threshold,
        )
    });

    if verdict.accepted {
        let record = DiscoveryRecordBuilder::new()
            .sequence(sequence.clone())
            .best(best.sample, best.report)
            .verdict(verdict)
            .seed(seed)
            .class_tag(class_tag)
            .trace(trace)
            .correlation(correlation)
            .build()?;
        info!(id = %record.id(), rigor_score = record.verdict().rigor_score, "Candidate accepted.");
        return Ok(AttemptOutcome::Accepted(Box::new(record)));
    }

    let reason = if verdict.all_gates_passed() {
        RejectionReason::BelowThreshold {
            rigor_score: verdict.rigor_score,
            rigor_threshold: verdict.rigor_threshold,
        }
    } else {
        RejectionReason::FailedGates(verdict.failed_gates())
    };
    info!(%reason, rigor_score = verdict.rigor_score, "Candidate rejected.");
    Ok(AttemptOutcome::Rejected(RejectionReport {
        sequence,
        seed,
        reason,
        best_energy: Some(best.report.total_energy),
        verdict: Some(verdict),
    }))
}

/// Fresh seed kept within `i64` range so it survives formats with signed integers.
fn draw_seed() -> u64 {
    rand::random::<u64>() >> 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{ConfigError, DiscoveryConfigBuilder};
    use crate::engine::validation::{PhysicsBounds, ValidationParams};

    fn config(seed: u64) -> DiscoveryConfig {
        DiscoveryConfigBuilder::new()
            .basis_size(36)
            .temperature(300.0)
            .sample_count(6)
            .replicate_count(3)
            .rigor_threshold(0.7)
            .seed(seed)
            .build()
            .unwrap()
    }

    fn attempt(seq: &str, config: &DiscoveryConfig) -> Result<AttemptOutcome, EngineError> {
        attempt_discovery(
            seq,
            config,
            &ReferenceTables::builtin(),
            &AttemptControl::new(),
            &ProgressReporter::new(),
        )
    }

    #[test]
    fn short_sequence_is_an_invalid_sequence_error() {
        assert!(matches!(
            attempt("AGPLA", &config(1)),
            Err(EngineError::InvalidSequence { .. })
        ));
    }

    #[test]
    fn zero_replicates_is_an_insufficient_samples_error() {
        let mut cfg = config(1);
        cfg.replicate_count = 0;
        assert!(matches!(
            attempt("AGPLAWATAFSAVAIK", &cfg),
            Err(EngineError::InsufficientSamples {
                what: "replicate_count",
                ..
            })
        ));
    }

    #[test]
    fn config_mutated_after_build_is_rejected_before_sampling() {
        let mut cfg = config(1);
        cfg.basis_size = 150;
        assert!(matches!(
            attempt("AGPLAWATAFSAVAIK", &cfg),
            Err(EngineError::Config {
                source: ConfigError::InvalidParameter {
                    parameter: "basis_size",
                    ..
                }
            })
        ));

        let mut cfg = config(1);
        cfg.temperature = 0.0;
        assert!(matches!(
            attempt("AGPLAWATAFSAVAIK", &cfg),
            Err(EngineError::Config {
                source: ConfigError::InvalidParameter {
                    parameter: "temperature",
                    ..
                }
            })
        ));
    }

    #[test]
    fn cancelled_attempt_is_rejected_not_failed() {
        let control = AttemptControl::new();
        control.cancel();
        let outcome = attempt_discovery(
            "AGPLAWATAFSAVAIK",
            &config(5),
            &ReferenceTables::builtin(),
            &control,
            &ProgressReporter::new(),
        )
        .unwrap();
        let report = outcome.rejection().unwrap();
        assert_eq!(report.seed, 5);
        assert_eq!(
            report.reason,
            RejectionReason::Interrupted {
                stage: AttemptStage::GraphBuilt,
                reason: InterruptReason::Cancelled
            }
        );
        assert!(outcome.verdict().is_none());
    }

    #[test]
    fn degenerate_sequence_is_rejected_by_the_quality_gate() {
        let outcome = attempt("KKKKKKKKKKKK", &config(9)).unwrap();
        let report = outcome.rejection().unwrap();
        match &report.reason {
            RejectionReason::FailedGates(gates) => assert!(gates.contains(&GateKind::Quality)),
            other => panic!("unexpected rejection reason: {other:?}"),
        }
        assert!(report.verdict.is_some());
    }

    #[test]
    fn permissive_attempt_with_zero_threshold_is_accepted() {
        let mut cfg = config(11);
        cfg.rigor_threshold = 0.0;
        cfg.validation = ValidationParams {
            physics: PhysicsBounds::permissive(),
            reality_tolerance: 10.0,
            min_survival: 0.0,
            ..ValidationParams::default()
        };
        let outcome = attempt("AGPLAWETKFSAVDIK", &cfg).unwrap();
        let record = outcome.record().expect("candidate should be accepted");
        assert_eq!(record.seed(), 11);
        assert_eq!(record.best_conformation().len(), 16);
        let export = record.to_export();
        assert_eq!(export.best_dihedrals.len(), 16);
        assert!(export.quality_passed && export.physics_passed);
        assert_eq!(outcome.summary().outcome, "accepted");
    }
}

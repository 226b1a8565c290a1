use super::config::EvolutionConfig;
use super::control::{AttemptControl, InterruptReason};
use super::correlation;
use super::error::EngineError;
use super::graph::{Amplitudes, StateGraph, renormalize};
use super::operators::{ConstraintOperator, OperatorContext};
use super::progress::{Progress, ProgressReporter};
use crate::core::models::conformation::SecondaryStructureFractions;
use crate::core::tables::reference::CorrelationThresholds;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// What happened during one call to [`evolve`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvolutionTrace {
    pub iterations: usize,
    pub converged: bool,
    /// Probability change `sum |d|a_k|^2|` over all nodes in the last iteration.
    pub final_change: f64,
    /// Mean pair-correlation strength after each iteration.
    pub mean_strength: Vec<f64>,
    pub interrupted: Option<InterruptReason>,
}

/// Evolves `graph` in place until convergence, the iteration cap, or an interruption.
///
/// Every operator weight is validated before the first iteration, so a misconfigured operator
/// never touches the graph. Correlations are recomputed after each iteration and left on the
/// graph for downstream diagnostics.
#[instrument(skip_all, name = "evolution_engine", fields(residues = graph.len()))]
pub fn evolve(
    graph: &mut StateGraph,
    config: &EvolutionConfig,
    thermal_energy: f64,
    target: SecondaryStructureFractions,
    thresholds: &CorrelationThresholds,
    control: &AttemptControl,
    reporter: &ProgressReporter,
) -> Result<EvolutionTrace, EngineError> {
    for operator in &config.operators {
        operator.validate()?;
    }

    reporter.report(Progress::TaskStart {
        total_steps: config.max_iterations as u64,
    });

    let mut trace = EvolutionTrace::default();
    for iteration in 0..config.max_iterations {
        if let Some(reason) = control.interruption() {
            info!(iteration, ?reason, "Evolution interrupted.");
            trace.interrupted = Some(reason);
            break;
        }

        let change = step(graph, &config.operators, thermal_energy, target);
        let correlations = correlation::compute(graph, thresholds);
        let mean_strength = correlation::mean_strength(&correlations);
        graph.set_correlations(correlations);

        trace.iterations += 1;
        trace.final_change = change;
        trace.mean_strength.push(mean_strength);
        debug!(iteration, change, mean_strength, "Evolution step complete.");
        reporter.report(Progress::TaskIncrement);
        reporter.status(|| format!("Evolution: change {change:.2e}"));

        if change < config.convergence_threshold {
            trace.converged = true;
            break;
        }
    }

    if trace.iterations == 0 {
        let correlations = correlation::compute(graph, thresholds);
        graph.set_correlations(correlations);
    }

    reporter.report(Progress::TaskFinish);
    info!(
        iterations = trace.iterations,
        converged = trace.converged,
        final_change = trace.final_change,
        "Evolution finished."
    );
    Ok(trace)
}

/// Applies every operator once, in order, and returns the total probability change.
pub fn step(
    graph: &mut StateGraph,
    operators: &[ConstraintOperator],
    thermal_energy: f64,
    target: SecondaryStructureFractions,
) -> f64 {
    let before: Vec<Vec<f64>> = graph.nodes().iter().map(|n| n.probabilities()).collect();

    for operator in operators {
        apply_operator(graph, operator, thermal_energy, target);
    }

    let mut change = 0.0;
    for (node, previous) in graph.nodes().iter().zip(&before) {
        for (a, p) in node.amplitudes.iter().zip(previous) {
            change += (a.norm_sqr() - p).abs();
        }
    }
    change
}

fn apply_operator(
    graph: &mut StateGraph,
    operator: &ConstraintOperator,
    thermal_energy: f64,
    target: SecondaryStructureFractions,
) {
    let snapshot: Vec<Amplitudes> = graph.nodes().iter().map(|n| n.amplitudes.clone()).collect();

    let updated: Vec<Amplitudes> = {
        let ctx = OperatorContext {
            graph: &*graph,
            snapshot: &snapshot,
            thermal_energy,
            target,
        };

        #[cfg(not(feature = "parallel"))]
        let iterator = 0..graph.len();

        #[cfg(feature = "parallel")]
        let iterator = (0..graph.len()).into_par_iter();

        iterator.map(|i| operator.apply(i, &ctx)).collect()
    };

    for (node, mut next) in graph.nodes_mut().iter_mut().zip(updated) {
        if renormalize(&mut next).is_none() {
            warn!(
                position = node.position,
                operator = operator.name(),
                "Amplitude vector collapsed; resetting to the Boltzmann amplitude."
            );
            next = node.equilibrium_amplitudes();
        }
        node.amplitudes = next;
    }
}

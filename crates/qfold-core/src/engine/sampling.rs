use super::error::EngineError;
use super::graph::StateGraph;
use crate::core::energy::evaluator::{EnergyError, EnergyReport, GAS_CONSTANT};
use crate::core::models::conformation::{Conformation, DihedralPair};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Input energies list is empty, cannot compute Boltzmann weights")]
    EmptyEnergies,
    #[error("Amplitude vector of residue {position} has no probability mass to sample from")]
    ZeroProbability { position: usize },
    #[error("All energies are non-finite, resulting in zero total Boltzmann weight")]
    ZeroTotalWeight,
    #[error("Invalid temperature: {0} K. Temperature must be positive and finite")]
    InvalidTemperature(f64),
    #[error("Failed to create weighted distribution: {source}")]
    DistributionError {
        #[from]
        source: rand::distributions::WeightedError,
    },
}

const SPLITMIX_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(SPLITMIX_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for draw `index` of random stream `stream` under the attempt seed `seed`.
///
/// Stream 0 is the primary collapse; streams `1..=R` are the replicate runs.
pub fn derive_seed(seed: u64, stream: u64, index: u64) -> u64 {
    splitmix64(splitmix64(splitmix64(seed) ^ stream) ^ index)
}

/// Normalized Boltzmann weights `exp(-(E - E_min) / RT)`.
#[instrument(level = "trace", skip_all, fields(thermal_energy = thermal_energy))]
pub fn boltzmann_weights(energies: &[f64], thermal_energy: f64) -> Result<Vec<f64>, SamplingError> {
    if energies.is_empty() {
        return Err(SamplingError::EmptyEnergies);
    }
    if !thermal_energy.is_finite() || thermal_energy <= 0.0 {
        return Err(SamplingError::InvalidTemperature(thermal_energy / GAS_CONSTANT));
    }

    let min_energy = energies
        .iter()
        .copied()
        .filter(|e| e.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !min_energy.is_finite() {
        return Err(SamplingError::ZeroTotalWeight);
    }

    let weights: Vec<f64> = energies
        .iter()
        .map(|&e| {
            if e.is_finite() {
                (-(e - min_energy) / thermal_energy).exp()
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// A concrete conformation drawn from an evolved graph.
#[derive(Debug, Clone)]
pub struct ConformationSample {
    conformation: Conformation,
    basis_indices: Vec<usize>,
    snapshot: Arc<StateGraph>,
}

impl ConformationSample {
    pub fn conformation(&self) -> &Conformation {
        &self.conformation
    }

    /// Basis state chosen for each residue.
    pub fn basis_indices(&self) -> &[usize] {
        &self.basis_indices
    }

    /// The graph this sample was drawn from.
    pub fn snapshot(&self) -> &StateGraph {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.conformation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conformation.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct WeightedSample {
    pub sample: ConformationSample,
    pub report: EnergyReport,
    /// Normalized Boltzmann weight within the pool.
    pub weight: f64,
    pub draw_index: usize,
    pub is_best: bool,
}

/// Samples from one collapse run, sorted by descending weight.
#[derive(Debug, Clone)]
pub struct SamplePool {
    samples: Vec<WeightedSample>,
}

impl SamplePool {
    pub fn samples(&self) -> &[WeightedSample] {
        &self.samples
    }

    pub fn best(&self) -> Option<&WeightedSample> {
        self.samples.first()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_best(self) -> Option<WeightedSample> {
        self.samples.into_iter().next()
    }
}

/// Draws `sample_count` conformations from `graph` and reweights them by Boltzmann factor.
///
/// Each draw owns a generator seeded from `(seed, stream, draw)`, so the pool is identical
/// whether draws run sequentially or in parallel.
#[instrument(skip_all, name = "collapse", fields(stream = stream, sample_count = sample_count))]
pub fn collapse<F>(
    graph: &Arc<StateGraph>,
    sample_count: usize,
    temperature: f64,
    seed: u64,
    stream: u64,
    evaluate: F,
) -> Result<SamplePool, EngineError>
where
    F: Fn(&Conformation) -> Result<EnergyReport, EnergyError> + Sync,
{
    if sample_count < 1 {
        return Err(EngineError::InsufficientSamples {
            what: "sample_count",
            requested: sample_count,
        });
    }
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(SamplingError::InvalidTemperature(temperature).into());
    }

    let distributions = graph
        .nodes()
        .iter()
        .map(|node| {
            let probabilities = node.probabilities();
            if probabilities.iter().sum::<f64>() <= 0.0 {
                return Err(SamplingError::ZeroProbability {
                    position: node.position,
                });
            }
            Ok(WeightedIndex::new(probabilities)?)
        })
        .collect::<Result<Vec<_>, SamplingError>>()?;

    #[cfg(not(feature = "parallel"))]
    let iterator = 0..sample_count;

    #[cfg(feature = "parallel")]
    let iterator = (0..sample_count).into_par_iter();

    let drawn: Vec<Result<(ConformationSample, EnergyReport), EnergyError>> = iterator
        .map(|draw| {
            let mut rng = StdRng::seed_from_u64(derive_seed(seed, stream, draw as u64));
            let sample = draw_one(graph, &distributions, &mut rng);
            let report = evaluate(&sample.conformation)?;
            Ok((sample, report))
        })
        .collect();

    let mut evaluated = Vec::with_capacity(sample_count);
    for result in drawn {
        evaluated.push(result?);
    }

    let energies: Vec<f64> = evaluated.iter().map(|(_, r)| r.total_energy).collect();
    let weights = boltzmann_weights(&energies, GAS_CONSTANT * temperature)?;

    let mut samples: Vec<WeightedSample> = evaluated
        .into_iter()
        .zip(weights)
        .enumerate()
        .map(|(draw_index, ((sample, report), weight))| WeightedSample {
            sample,
            report,
            weight,
            draw_index,
            is_best: false,
        })
        .collect();
    samples.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.draw_index.cmp(&b.draw_index))
    });
    if let Some(best) = samples.first_mut() {
        best.is_best = true;
        debug!(
            draw = best.draw_index,
            energy = best.report.total_energy,
            weight = best.weight,
            "Collapse complete."
        );
    }

    Ok(SamplePool { samples })
}

fn draw_one(
    graph: &Arc<StateGraph>,
    distributions: &[WeightedIndex<f64>],
    rng: &mut StdRng,
) -> ConformationSample {
    let basis = graph.basis();
    let mut basis_indices = Vec::with_capacity(distributions.len());
    let mut angles = Vec::with_capacity(distributions.len());
    for dist in distributions {
        let k = dist.sample(rng);
        let (phi_bin, psi_bin) = basis.bins(k);
        let phi = basis.angle_in_bin(phi_bin, rng.r#gen::<f64>());
        let psi = basis.angle_in_bin(psi_bin, rng.r#gen::<f64>());
        basis_indices.push(k);
        angles.push(DihedralPair::new(phi, psi));
    }
    ConformationSample {
        conformation: Conformation::new(angles),
        basis_indices,
        snapshot: Arc::clone(graph),
    }
}

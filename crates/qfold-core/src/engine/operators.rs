//! The closed family of constraint operators applied during evolution.
//!
//! Each operator transforms one node's amplitude vector given the node's local graph context.
//! They are dispatched through a single `match`; callers renormalize afterwards.

use super::error::EngineError;
use super::graph::{Amplitudes, ResidueNode, StateGraph};
use crate::core::models::conformation::{SecondaryStructure, SecondaryStructureFractions};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

const COMPOSITION_EPSILON: f64 = 1e-3;

/// Energy-conserving phase rotation `a_k <- a_k * exp(-i * w * E_k / RT)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBias {
    pub weight: f64,
}

/// Affine mix toward the Boltzmann amplitude, keeping each component's phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumBias {
    pub weight: f64,
}

/// Edge-weighted averaging with graph neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityBias {
    pub weight: f64,
}

/// Diagonal rescaling of helix, sheet and coil bins toward an experimental composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentalBias {
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConstraintOperator {
    EnergyBias(EnergyBias),
    EquilibriumBias(EquilibriumBias),
    StabilityBias(StabilityBias),
    ExperimentalBias(ExperimentalBias),
}

/// Read-only inputs shared by every operator application within one step.
#[derive(Debug, Clone, Copy)]
pub struct OperatorContext<'a> {
    pub graph: &'a StateGraph,
    /// Amplitudes of every node before the current operator was applied.
    pub snapshot: &'a [Amplitudes],
    pub thermal_energy: f64,
    pub target: SecondaryStructureFractions,
}

impl ConstraintOperator {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintOperator::EnergyBias(_) => "energy-bias",
            ConstraintOperator::EquilibriumBias(_) => "equilibrium-bias",
            ConstraintOperator::StabilityBias(_) => "stability-bias",
            ConstraintOperator::ExperimentalBias(_) => "experimental-bias",
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            ConstraintOperator::EnergyBias(p) => p.weight,
            ConstraintOperator::EquilibriumBias(p) => p.weight,
            ConstraintOperator::StabilityBias(p) => p.weight,
            ConstraintOperator::ExperimentalBias(p) => p.weight,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let weight = self.weight();
        let reason = if !weight.is_finite() {
            Some(format!("weight {weight} is not finite"))
        } else {
            match self {
                ConstraintOperator::EnergyBias(_) if weight < 0.0 => {
                    Some(format!("weight {weight} must be non-negative"))
                }
                ConstraintOperator::EquilibriumBias(_)
                | ConstraintOperator::StabilityBias(_)
                | ConstraintOperator::ExperimentalBias(_)
                    if !(0.0..=1.0).contains(&weight) =>
                {
                    Some(format!("weight {weight} must lie in [0, 1]"))
                }
                _ => None,
            }
        };
        match reason {
            Some(reason) => Err(EngineError::OperatorConfig {
                operator: self.name(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Applies the operator to node `index`, returning the unnormalized result.
    pub fn apply(&self, index: usize, ctx: &OperatorContext) -> Amplitudes {
        let node = &ctx.graph.nodes()[index];
        let current = &ctx.snapshot[index];
        match self {
            ConstraintOperator::EnergyBias(p) => {
                energy_bias(current, node, p.weight, ctx.thermal_energy)
            }
            ConstraintOperator::EquilibriumBias(p) => equilibrium_bias(current, node, p.weight),
            ConstraintOperator::StabilityBias(p) => stability_bias(index, current, p.weight, ctx),
            ConstraintOperator::ExperimentalBias(p) => experimental_bias(
                current,
                ctx.graph.basis_classes(),
                &ctx.target,
                p.weight,
            ),
        }
    }
}

fn energy_bias(current: &Amplitudes, node: &ResidueNode, weight: f64, thermal: f64) -> Amplitudes {
    Amplitudes::from_iterator(
        current.len(),
        current
            .iter()
            .zip(&node.basis_energies)
            .map(|(&a, &e)| a * Complex64::from_polar(1.0, -weight * e / thermal)),
    )
}

fn equilibrium_bias(current: &Amplitudes, node: &ResidueNode, weight: f64) -> Amplitudes {
    Amplitudes::from_iterator(
        current.len(),
        current.iter().zip(&node.equilibrium).map(|(&a, &eq)| {
            let magnitude = a.norm();
            let phase = if magnitude > 0.0 {
                a / magnitude
            } else {
                Complex64::new(1.0, 0.0)
            };
            a * (1.0 - weight) + phase * (weight * eq)
        }),
    )
}

fn stability_bias(index: usize, current: &Amplitudes, weight: f64, ctx: &OperatorContext) -> Amplitudes {
    let neighbors = ctx.graph.neighbors(index);
    let total_weight: f64 = neighbors.iter().map(|&(_, w)| w).sum();
    if neighbors.is_empty() || total_weight <= 0.0 {
        return current.clone();
    }
    let mut mean_field = Amplitudes::zeros(current.len());
    for &(j, w) in neighbors {
        mean_field.axpy(Complex64::new(w / total_weight, 0.0), &ctx.snapshot[j], Complex64::new(1.0, 0.0));
    }
    current * Complex64::new(1.0 - weight, 0.0) + mean_field * Complex64::new(weight, 0.0)
}

fn experimental_bias(
    current: &Amplitudes,
    classes: &[SecondaryStructure],
    target: &SecondaryStructureFractions,
    weight: f64,
) -> Amplitudes {
    let mut observed = [0.0; 3];
    for (a, class) in current.iter().zip(classes) {
        observed[class.index()] += a.norm_sqr();
    }
    let scale = SecondaryStructure::ALL.map(|class| {
        let t = target.get(class);
        let p = observed[class.index()];
        ((t + COMPOSITION_EPSILON) / (p + COMPOSITION_EPSILON)).powf(0.5 * weight)
    });
    Amplitudes::from_iterator(
        current.len(),
        current
            .iter()
            .zip(classes)
            .map(|(&a, class)| a * scale[class.index()]),
    )
}

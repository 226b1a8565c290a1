use super::{Bounds, Check, GateKind, GateOutcome, outcome_from_checks};
use crate::core::energy::evaluator::EnergyReport;
use serde::{Deserialize, Serialize};

/// Plausibility bounds on energies and descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PhysicsBounds {
    /// kcal/mol per residue.
    pub per_residue_energy: Bounds,
    pub max_instability: f64,
    /// `|net charge| <= charge_density * L`.
    pub charge_density: f64,
    pub gravy: Bounds,
    /// Floor on the larger of the mean helix and mean sheet propensities; sequences below it
    /// favour no ordered structure.
    pub min_structure_propensity: f64,
}

impl Default for PhysicsBounds {
    fn default() -> Self {
        Self {
            per_residue_energy: Bounds::new(-4.0, -0.1),
            max_instability: 40.0,
            charge_density: 0.2,
            gravy: Bounds::new(-2.0, 2.5),
            min_structure_propensity: 1.08,
        }
    }
}

impl PhysicsBounds {
    /// Bounds that admit every finite report.
    pub fn permissive() -> Self {
        Self {
            per_residue_energy: Bounds::unbounded(),
            max_instability: f64::INFINITY,
            charge_density: f64::INFINITY,
            gravy: Bounds::unbounded(),
            min_structure_propensity: f64::NEG_INFINITY,
        }
    }

    /// The only check that depends on the conformation rather than on the sequence.
    fn energy_check(&self, report: &EnergyReport) -> Check {
        Check::new(
            self.per_residue_energy.contains(report.per_residue_energy),
            format!(
                "per-residue energy {:.3} kcal/mol within {}",
                report.per_residue_energy, self.per_residue_energy
            ),
        )
    }

    fn checks(&self, report: &EnergyReport, length: usize) -> Vec<Check> {
        let d = &report.descriptors;
        let max_charge = self.charge_density * length as f64;
        let propensity = d.mean_helix_propensity.max(d.mean_sheet_propensity);
        vec![
            self.energy_check(report),
            Check::new(
                d.instability_index <= self.max_instability,
                format!(
                    "instability index {:.2} <= {}",
                    d.instability_index, self.max_instability
                ),
            ),
            Check::new(
                d.net_charge.abs() <= max_charge,
                format!("|net charge| {:.2} <= {max_charge:.2}", d.net_charge.abs()),
            ),
            Check::new(
                self.gravy.contains(d.gravy),
                format!("GRAVY {:.3} within {}", d.gravy, self.gravy),
            ),
            Check::new(
                propensity >= self.min_structure_propensity,
                format!(
                    "structure propensity {propensity:.3} >= {}",
                    self.min_structure_propensity
                ),
            ),
        ]
    }

    /// Whether the conformation-dependent bounds hold for `report`. Sequence-level descriptors
    /// are identical across conformations of one sequence and are judged once by [`evaluate`].
    pub fn admits_conformation(&self, report: &EnergyReport) -> bool {
        self.energy_check(report).passed
    }
}

pub fn evaluate(report: &EnergyReport, length: usize, bounds: &PhysicsBounds) -> GateOutcome {
    outcome_from_checks(GateKind::Physics, bounds.checks(report, length))
}

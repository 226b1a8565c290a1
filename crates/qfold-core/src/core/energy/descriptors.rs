use crate::core::models::residue::AminoAcid;
use crate::core::tables::instability::instability_index;
use crate::core::tables::properties::{
    self, PHYSIOLOGICAL_PH, WATER_MASS, chain_charge, helix_propensity, sheet_propensity,
};
use serde::{Deserialize, Serialize};

const PI_SEARCH_LOW: f64 = 0.0;
const PI_SEARCH_HIGH: f64 = 14.0;
const PI_TOLERANCE: f64 = 1e-4;
const PI_MAX_ITERATIONS: usize = 100;

/// Sequence-level physicochemical descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptors {
    /// Average mass in Da.
    pub molecular_weight: f64,
    /// Net charge at pH 7.4, termini included.
    pub net_charge: f64,
    /// Grand average of hydropathy (Kyte-Doolittle).
    pub gravy: f64,
    pub instability_index: f64,
    pub isoelectric_point: f64,
    /// Fraction of F, W and Y.
    pub aromaticity: f64,
    pub aliphatic_index: f64,
    pub mean_helix_propensity: f64,
    pub mean_sheet_propensity: f64,
}

impl Descriptors {
    pub fn compute(residues: &[AminoAcid]) -> Self {
        let molecular_weight = if residues.is_empty() {
            0.0
        } else {
            residues
                .iter()
                .map(|&aa| properties::residue_mass(aa))
                .sum::<f64>()
                + WATER_MASS
        };

        let x_ala = fraction(residues, |aa| aa == AminoAcid::Alanine);
        let x_val = fraction(residues, |aa| aa == AminoAcid::Valine);
        let x_ile_leu = fraction(residues, |aa| {
            matches!(aa, AminoAcid::Isoleucine | AminoAcid::Leucine)
        });

        Self {
            molecular_weight,
            net_charge: chain_charge(residues, PHYSIOLOGICAL_PH),
            gravy: mean(residues, properties::hydropathy),
            instability_index: instability_index(residues),
            isoelectric_point: isoelectric_point(residues),
            aromaticity: fraction(residues, AminoAcid::is_aromatic),
            aliphatic_index: 100.0 * (x_ala + 2.9 * x_val + 3.9 * x_ile_leu),
            mean_helix_propensity: mean(residues, helix_propensity),
            mean_sheet_propensity: mean(residues, sheet_propensity),
        }
    }
}

fn fraction(residues: &[AminoAcid], pred: impl Fn(AminoAcid) -> bool) -> f64 {
    if residues.is_empty() {
        return 0.0;
    }
    residues.iter().filter(|&&aa| pred(aa)).count() as f64 / residues.len() as f64
}

fn mean(residues: &[AminoAcid], f: fn(AminoAcid) -> f64) -> f64 {
    if residues.is_empty() {
        return 0.0;
    }
    residues.iter().map(|&aa| f(aa)).sum::<f64>() / residues.len() as f64
}

/// pH at which the chain carries no net charge, found by bisection.
pub fn isoelectric_point(residues: &[AminoAcid]) -> f64 {
    let (mut low, mut high) = (PI_SEARCH_LOW, PI_SEARCH_HIGH);
    for _ in 0..PI_MAX_ITERATIONS {
        let mid = 0.5 * (low + high);
        if chain_charge(residues, mid) > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
        if high - low < PI_TOLERANCE {
            break;
        }
    }
    0.5 * (low + high)
}

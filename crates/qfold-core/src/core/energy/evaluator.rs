use super::descriptors::Descriptors;
use super::geometry::ProximityModel;
use super::potentials::{cosine_switch, debye_huckel, lennard_jones_12_6};
use super::term::EnergyTerm;
use crate::core::encoder::ResidueFeatures;
use crate::core::models::conformation::{
    Conformation, DihedralPair, RamachandranRegion, SecondaryStructure,
    SecondaryStructureFractions, TORUS_AREA,
};
use crate::core::models::residue::AminoAcid;
use crate::core::models::sequence::Sequence;
use crate::core::tables::ReferenceTables;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Molar gas constant in kcal/(mol·K).
pub const GAS_CONSTANT: f64 = 0.0019872041;

const MIN_POPULATION: f64 = 1e-6;
const HYDROPATHY_SCALE: f64 = 4.5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnergyError {
    #[error("Conformation has {found} dihedral pairs but the sequence has {expected} residues")]
    ConformationMismatch { expected: usize, found: usize },

    #[error("Dihedral pair ({phi}, {psi}) at position {position} is outside (-180, 180]")]
    AngleOutOfRange { position: usize, phi: f64, psi: f64 },
}

/// Parameters of the empirical energy model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EnergyParams {
    /// Temperature (K) at which the Ramachandran populations are converted to free energies.
    pub reference_temperature: f64,
    /// Harmonic-like penalty (kcal/mol) for deviating from a region centre.
    pub region_stiffness: f64,
    /// Minimum sequence separation for non-bonded pair terms.
    pub min_separation: usize,
    pub cutoff: f64,
    pub switch_on: f64,
    pub steric_r_min: f64,
    pub steric_well_depth: f64,
    pub hydrophobic_strength: f64,
    /// Relative permittivity of the solvent.
    pub dielectric: f64,
    /// Debye length (Å) of the ionic screening; 7.85 Å is 0.15 M monovalent salt.
    pub screening_length: f64,
    /// Solvation energy (kcal/mol) per unit of side-chain charge. Positive, since anions
    /// hydrate more favourably than cations.
    pub charge_asymmetry: f64,
    pub aromatic_stacking: f64,
    pub disulfide: f64,
    pub disulfide_cutoff: f64,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            reference_temperature: 300.0,
            region_stiffness: 0.3,
            min_separation: 3,
            cutoff: 10.0,
            switch_on: 6.5,
            steric_r_min: 4.6,
            steric_well_depth: 0.05,
            hydrophobic_strength: 0.6,
            dielectric: 80.0,
            screening_length: 7.85,
            charge_asymmetry: 2.0,
            aromatic_stacking: -0.4,
            disulfide: -1.5,
            disulfide_cutoff: 6.5,
        }
    }
}

impl EnergyParams {
    /// Largest total-energy shift (kcal/mol) a conservative substitution (L/I/V among
    /// themselves, K/R, D/E) may cause; a charge reversal always moves the energy by more.
    pub const SUBSTITUTION_TOLERANCE: f64 = 1.0;
}

/// Energy and descriptors of one conformation. Recomputable bit-for-bit from its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyReport {
    pub total_energy: f64,
    pub per_residue_energy: f64,
    pub terms: EnergyTerm,
    pub secondary_structure: Vec<SecondaryStructure>,
    pub fractions: SecondaryStructureFractions,
    pub descriptors: Descriptors,
}

impl EnergyReport {
    /// DSSP-style one-letter string (`H`, `E`, `C`).
    pub fn secondary_structure_string(&self) -> String {
        self.secondary_structure.iter().map(|ss| ss.symbol()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnergyEvaluator<'a> {
    tables: &'a ReferenceTables,
    params: EnergyParams,
}

impl<'a> EnergyEvaluator<'a> {
    pub fn new(tables: &'a ReferenceTables, params: EnergyParams) -> Self {
        Self { tables, params }
    }

    pub fn params(&self) -> &EnergyParams {
        &self.params
    }

    #[inline]
    pub fn thermal_energy(&self) -> f64 {
        GAS_CONSTANT * self.params.reference_temperature
    }

    /// Single-residue backbone free energy of `aa` at `pair`.
    pub fn backbone_energy(&self, aa: AminoAcid, pair: DihedralPair) -> f64 {
        let region = pair.region();
        let population = self.tables.populations(aa).get(region).max(MIN_POPULATION);
        let statistical = -self.thermal_energy() * (population * TORUS_AREA / region.area()).ln();

        let kappa = self.params.region_stiffness;
        let local = match region.center() {
            Some(center) => {
                let d_phi = (pair.phi - center.phi).to_radians();
                let d_psi = (pair.psi - center.psi).to_radians();
                kappa * (2.0 - d_phi.cos() - d_psi.cos())
            }
            None => kappa,
        };
        statistical + local
    }

    pub fn evaluate(
        &self,
        sequence: &Sequence,
        conformation: &Conformation,
    ) -> Result<EnergyReport, EnergyError> {
        if sequence.len() != conformation.len() {
            return Err(EnergyError::ConformationMismatch {
                expected: sequence.len(),
                found: conformation.len(),
            });
        }
        if let Some((position, pair)) = conformation
            .angles()
            .iter()
            .enumerate()
            .find(|(_, pair)| !pair.is_valid())
        {
            return Err(EnergyError::AngleOutOfRange {
                position,
                phi: pair.phi,
                psi: pair.psi,
            });
        }

        let features: Vec<ResidueFeatures> = sequence.iter().map(ResidueFeatures::of).collect();
        let regions: Vec<RamachandranRegion> =
            conformation.angles().iter().map(DihedralPair::region).collect();

        let backbone: EnergyTerm = sequence
            .iter()
            .zip(conformation.angles())
            .map(|(aa, &pair)| EnergyTerm::backbone(self.backbone_energy(aa, pair)))
            .sum();

        let proximity = ProximityModel::new(&regions);
        let non_bonded: EnergyTerm = (0..features.len())
            .tuple_combinations::<(usize, usize)>()
            .filter(|&(i, j)| j - i >= self.params.min_separation)
            .map(|(i, j)| self.pair_energy(&features[i], &features[j], proximity.distance(i, j)))
            .sum();

        let solvation = EnergyTerm::solvation(
            self.params.charge_asymmetry * features.iter().map(|f| f.charge).sum::<f64>(),
        );

        let terms = backbone + non_bonded + solvation;
        let total_energy = terms.total();
        let secondary_structure: Vec<SecondaryStructure> = regions
            .iter()
            .map(|region| region.secondary_structure())
            .collect();

        Ok(EnergyReport {
            total_energy,
            per_residue_energy: total_energy / sequence.len() as f64,
            terms,
            fractions: SecondaryStructureFractions::from_labels(&secondary_structure),
            secondary_structure,
            descriptors: Descriptors::compute(sequence.residues()),
        })
    }

    fn pair_energy(&self, a: &ResidueFeatures, b: &ResidueFeatures, dist: f64) -> EnergyTerm {
        let p = &self.params;
        if dist >= p.cutoff {
            return EnergyTerm::default();
        }
        let switch = cosine_switch(dist, p.switch_on, p.cutoff);

        let steric = lennard_jones_12_6(dist, p.steric_r_min, p.steric_well_depth);

        let burial = |h: f64| h.max(0.0) / HYDROPATHY_SCALE;
        let hydrophobic = -p.hydrophobic_strength * burial(a.hydropathy) * burial(b.hydropathy);

        let electrostatic = if a.charge != 0.0 && b.charge != 0.0 {
            debye_huckel(dist, a.charge, b.charge, p.dielectric, p.screening_length)
        } else {
            0.0
        };

        let mut special = 0.0;
        if a.aromatic && b.aromatic {
            special += p.aromatic_stacking;
        }
        if a.is_cysteine() && b.is_cysteine() && dist <= p.disulfide_cutoff {
            special += p.disulfide;
        }

        EnergyTerm {
            backbone: 0.0,
            steric: switch * steric,
            hydrophobic: switch * hydrophobic,
            electrostatic: switch * electrostatic,
            special: switch * special,
            solvation: 0.0,
        }
    }
}

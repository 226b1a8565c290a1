//! Per-residue physicochemical constants, indexed by [`AminoAcid::index`].

use crate::core::models::residue::AminoAcid;

pub const PHYSIOLOGICAL_PH: f64 = 7.4;

/// Average mass of a free water molecule, added once per chain.
pub const WATER_MASS: f64 = 18.01528;

pub const PKA_N_TERMINUS: f64 = 8.6;
pub const PKA_C_TERMINUS: f64 = 3.6;

/// Kyte-Doolittle hydropathy.
#[rustfmt::skip]
const HYDROPATHY: [f64; AminoAcid::COUNT] = [
    1.8, -4.5, -3.5, -3.5, 2.5, -3.5, -3.5, -0.4, -3.2, 4.5,
    3.8, -3.9, 1.9, 2.8, -1.6, -0.8, -0.7, -0.9, -1.3, 4.2,
];

/// Average residue masses (peptide-bonded, water removed), in Da.
#[rustfmt::skip]
const RESIDUE_MASS: [f64; AminoAcid::COUNT] = [
    71.0788, 156.1875, 114.1038, 115.0886, 103.1388, 128.1307, 129.1155, 57.0519, 137.1411, 113.1594,
    113.1594, 128.1741, 131.1926, 147.1766, 97.1167, 87.0782, 101.1051, 186.2132, 163.1760, 99.1326,
];

/// Zamyatnin residue volumes, in cubic angstroms.
#[rustfmt::skip]
const VOLUME: [f64; AminoAcid::COUNT] = [
    88.6, 173.4, 114.1, 111.1, 108.5, 143.8, 138.4, 60.1, 153.2, 166.7,
    166.7, 168.6, 162.9, 189.9, 112.7, 89.0, 116.1, 227.8, 193.6, 140.0,
];

/// Chou-Fasman conformational propensities: (helix, sheet, turn).
#[rustfmt::skip]
const CHOU_FASMAN: [(f64, f64, f64); AminoAcid::COUNT] = [
    (1.42, 0.83, 0.66), (0.98, 0.93, 0.95), (0.67, 0.89, 1.56), (1.01, 0.54, 1.46),
    (0.70, 1.19, 1.19), (1.11, 1.10, 0.98), (1.51, 0.37, 0.74), (0.57, 0.75, 1.56),
    (1.00, 0.87, 0.95), (1.08, 1.60, 0.47), (1.21, 1.30, 0.59), (1.16, 0.74, 1.01),
    (1.45, 1.05, 0.60), (1.13, 1.38, 0.60), (0.57, 0.55, 1.52), (0.77, 0.75, 1.43),
    (0.83, 1.19, 0.96), (1.08, 1.37, 0.96), (0.69, 1.47, 1.14), (1.06, 1.70, 0.50),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ionizable {
    Basic(f64),
    Acidic(f64),
}

// EMBOSS side-chain pKa set.
fn side_chain_group(aa: AminoAcid) -> Option<Ionizable> {
    match aa {
        AminoAcid::Lysine => Some(Ionizable::Basic(10.8)),
        AminoAcid::Arginine => Some(Ionizable::Basic(12.5)),
        AminoAcid::Histidine => Some(Ionizable::Basic(6.5)),
        AminoAcid::AsparticAcid => Some(Ionizable::Acidic(3.9)),
        AminoAcid::GlutamicAcid => Some(Ionizable::Acidic(4.1)),
        AminoAcid::Cysteine => Some(Ionizable::Acidic(8.5)),
        AminoAcid::Tyrosine => Some(Ionizable::Acidic(10.1)),
        _ => None,
    }
}

#[inline]
fn basic_charge(ph: f64, pka: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(ph - pka))
}

#[inline]
fn acidic_charge(ph: f64, pka: f64) -> f64 {
    -1.0 / (1.0 + 10f64.powf(pka - ph))
}

#[inline]
pub fn hydropathy(aa: AminoAcid) -> f64 {
    HYDROPATHY[aa.index()]
}

#[inline]
pub fn residue_mass(aa: AminoAcid) -> f64 {
    RESIDUE_MASS[aa.index()]
}

#[inline]
pub fn volume(aa: AminoAcid) -> f64 {
    VOLUME[aa.index()]
}

#[inline]
pub fn helix_propensity(aa: AminoAcid) -> f64 {
    CHOU_FASMAN[aa.index()].0
}

#[inline]
pub fn sheet_propensity(aa: AminoAcid) -> f64 {
    CHOU_FASMAN[aa.index()].1
}

#[inline]
pub fn turn_propensity(aa: AminoAcid) -> f64 {
    CHOU_FASMAN[aa.index()].2
}

/// Fractional side-chain charge at `ph` (Henderson-Hasselbalch).
pub fn side_chain_charge(aa: AminoAcid, ph: f64) -> f64 {
    match side_chain_group(aa) {
        Some(Ionizable::Basic(pka)) => basic_charge(ph, pka),
        Some(Ionizable::Acidic(pka)) => acidic_charge(ph, pka),
        None => 0.0,
    }
}

/// Net charge of a free chain at `ph`, including both termini.
pub fn chain_charge(residues: &[AminoAcid], ph: f64) -> f64 {
    let termini = basic_charge(ph, PKA_N_TERMINUS) + acidic_charge(ph, PKA_C_TERMINUS);
    termini
        + residues
            .iter()
            .map(|&aa| side_chain_charge(aa, ph))
            .sum::<f64>()
}

pub fn is_hydrophobic(aa: AminoAcid) -> bool {
    hydropathy(aa) > 0.0
}

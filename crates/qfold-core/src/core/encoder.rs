use super::models::residue::AminoAcid;
use super::models::sequence::{Sequence, SequenceError};
use super::tables::properties::{self, PHYSIOLOGICAL_PH};
use serde::Serialize;

/// Physicochemical feature vector of a single residue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidueFeatures {
    pub residue: AminoAcid,
    pub hydropathy: f64,
    pub charge: f64,
    pub volume: f64,
    pub aromatic: bool,
    pub helix_propensity: f64,
    pub sheet_propensity: f64,
    pub turn_propensity: f64,
    #[serde(skip)]
    pub one_hot: [f64; AminoAcid::COUNT],
}

impl ResidueFeatures {
    pub fn of(residue: AminoAcid) -> Self {
        let mut one_hot = [0.0; AminoAcid::COUNT];
        one_hot[residue.index()] = 1.0;
        Self {
            residue,
            hydropathy: properties::hydropathy(residue),
            charge: properties::side_chain_charge(residue, PHYSIOLOGICAL_PH),
            volume: properties::volume(residue),
            aromatic: residue.is_aromatic(),
            helix_propensity: properties::helix_propensity(residue),
            sheet_propensity: properties::sheet_propensity(residue),
            turn_propensity: properties::turn_propensity(residue),
            one_hot,
        }
    }

    pub fn is_cysteine(&self) -> bool {
        self.residue == AminoAcid::Cysteine
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSequence {
    sequence: Sequence,
    features: Vec<ResidueFeatures>,
}

impl EncodedSequence {
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn features(&self) -> &[ResidueFeatures] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

pub fn encode(sequence: &Sequence) -> EncodedSequence {
    EncodedSequence {
        sequence: sequence.clone(),
        features: sequence.iter().map(ResidueFeatures::of).collect(),
    }
}

/// Validates raw one-letter input and encodes it.
pub fn encode_str(raw: &str) -> Result<EncodedSequence, SequenceError> {
    let sequence: Sequence = raw.parse()?;
    Ok(encode(&sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_one_feature_vector_per_residue_in_order() {
        let encoded = encode_str("ACDEFGHIKL").unwrap();
        assert_eq!(encoded.len(), 10);
        assert_eq!(encoded.features()[0].residue, AminoAcid::Alanine);
        assert_eq!(encoded.features()[9].residue, AminoAcid::Leucine);
    }

    #[test]
    fn one_hot_has_single_set_bit_at_residue_index() {
        let f = ResidueFeatures::of(AminoAcid::Tryptophan);
        assert_eq!(f.one_hot.iter().sum::<f64>(), 1.0);
        assert_eq!(f.one_hot[AminoAcid::Tryptophan.index()], 1.0);
        assert!(f.aromatic);
    }

    #[test]
    fn charged_residues_carry_signed_charge() {
        assert!(ResidueFeatures::of(AminoAcid::Lysine).charge > 0.9);
        assert!(ResidueFeatures::of(AminoAcid::AsparticAcid).charge < -0.9);
        assert_eq!(ResidueFeatures::of(AminoAcid::Serine).charge, 0.0);
    }

    #[test]
    fn invalid_input_surfaces_sequence_error() {
        assert_eq!(
            encode_str("AGPLA"),
            Err(SequenceError::TooShort { length: 5 })
        );
    }
}

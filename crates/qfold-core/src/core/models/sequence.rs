use super::residue::AminoAcid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MIN_SEQUENCE_LENGTH: usize = 8;
pub const MAX_SEQUENCE_LENGTH: usize = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Sequence length {length} is below the minimum of {min} residues", min = MIN_SEQUENCE_LENGTH)]
    TooShort { length: usize },

    #[error("Sequence length {length} exceeds the maximum of {max} residues", max = MAX_SEQUENCE_LENGTH)]
    TooLong { length: usize },

    #[error("Unknown residue symbol '{symbol}' at position {position}")]
    UnknownResidue { symbol: char, position: usize },
}

/// A validated, immutable chain of canonical residues.
///
/// Construction is the only validation point: once a `Sequence` exists, every residue is one of
/// the twenty canonical amino acids and the length lies within
/// [`MIN_SEQUENCE_LENGTH`]..=[`MAX_SEQUENCE_LENGTH`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sequence {
    residues: Vec<AminoAcid>,
}

impl Sequence {
    pub fn new(residues: Vec<AminoAcid>) -> Result<Self, SequenceError> {
        let length = residues.len();
        if length < MIN_SEQUENCE_LENGTH {
            return Err(SequenceError::TooShort { length });
        }
        if length > MAX_SEQUENCE_LENGTH {
            return Err(SequenceError::TooLong { length });
        }
        Ok(Self { residues })
    }

    pub fn residues(&self) -> &[AminoAcid] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<AminoAcid> {
        self.residues.get(position).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = AminoAcid> + '_ {
        self.residues.iter().copied()
    }

    /// Returns a copy with the residue at `position` replaced.
    pub fn with_substitution(&self, position: usize, residue: AminoAcid) -> Option<Self> {
        if position >= self.residues.len() {
            return None;
        }
        let mut residues = self.residues.clone();
        residues[position] = residue;
        Some(Self { residues })
    }
}

impl FromStr for Sequence {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let residues = trimmed
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                AminoAcid::from_code(symbol)
                    .ok_or(SequenceError::UnknownResidue { symbol, position })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(residues)
    }
}

impl TryFrom<String> for Sequence {
    type Error = SequenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sequence> for String {
    fn from(sequence: Sequence) -> Self {
        sequence.to_string()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for residue in &self.residues {
            write!(f, "{}", residue.code())?;
        }
        Ok(())
    }
}

use thiserror::Error;

use super::config::ConfigError;
use super::sampling::SamplingError;
use crate::core::energy::evaluator::EnergyError;
use crate::core::models::sequence::SequenceError;
use crate::core::tables::TableLoadError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid sequence: {source}")]
    InvalidSequence {
        #[from]
        source: SequenceError,
    },

    #[error("Constraint operator '{operator}' is misconfigured: {reason}")]
    OperatorConfig {
        operator: &'static str,
        reason: String,
    },

    #[error("Insufficient samples: {what} must be at least 1, got {requested}")]
    InsufficientSamples { what: &'static str, requested: usize },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Conformation has {found} dihedral pairs but the sequence has {expected} residues")]
    ConformationMismatch { expected: usize, found: usize },

    #[error("Dihedral pair ({phi}, {psi}) at position {position} is outside (-180, 180]")]
    AngleOutOfRange { position: usize, phi: f64, psi: f64 },

    #[error("Sampling failed: {source}")]
    Sampling {
        #[from]
        source: SamplingError,
    },

    #[error("Reference tables could not be loaded: {source}")]
    Tables {
        #[from]
        source: TableLoadError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl From<EnergyError> for EngineError {
    fn from(err: EnergyError) -> Self {
        match err {
            EnergyError::ConformationMismatch { expected, found } => {
                EngineError::ConformationMismatch { expected, found }
            }
            EnergyError::AngleOutOfRange { position, phi, psi } => {
                EngineError::AngleOutOfRange { position, phi, psi }
            }
        }
    }
}

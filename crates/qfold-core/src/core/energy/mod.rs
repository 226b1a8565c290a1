//! Empirical energy model over dihedral conformations.
//!
//! - [`potentials`] - pure pair potentials and the cosine switching function
//! - [`term`] - energy decomposition and aggregation
//! - [`geometry`] - coordinate-free residue proximity estimates
//! - [`descriptors`] - sequence-level physicochemical descriptors
//! - [`evaluator`] - the [`evaluator::EnergyEvaluator`] producing [`evaluator::EnergyReport`]s

pub mod descriptors;
pub mod evaluator;
pub mod geometry;
pub(crate) mod potentials;
pub mod term;

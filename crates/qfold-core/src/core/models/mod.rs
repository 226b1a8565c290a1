//! Data models for sequences and conformations.

pub mod conformation;
pub mod residue;
pub mod sequence;

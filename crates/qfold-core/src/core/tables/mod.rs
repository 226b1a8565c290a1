//! Immutable reference data: residue properties, the dipeptide instability table, Ramachandran
//! region populations and experimental secondary-structure references.

pub mod instability;
pub mod properties;
pub mod reference;

pub use reference::{ReferenceTables, TableLoadError};

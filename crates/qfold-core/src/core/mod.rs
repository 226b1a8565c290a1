//! # Core Module
//!
//! Stateless building blocks shared by every pipeline stage.
//!
//! - **Models** ([`models`]) - amino acids, validated sequences, dihedral conformations
//! - **Reference Data** ([`tables`]) - residue properties, Ramachandran populations, the
//!   dipeptide instability table and experimental secondary-structure references
//! - **Encoding** ([`encoder`]) - per-residue feature vectors
//! - **Energy** ([`energy`]) - potentials, energy terms, descriptors and the evaluator
//!
//! Nothing in this module holds mutable state; every function is a pure function of its inputs
//! and of a [`tables::ReferenceTables`] value constructed once at startup.

pub mod encoder;
pub mod energy;
pub mod models;
pub mod tables;

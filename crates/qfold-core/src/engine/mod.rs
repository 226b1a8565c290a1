//! # Engine Module
//!
//! The computational core of qfold: everything between an encoded sequence and a validation
//! verdict.
//!
//! ## Overview
//!
//! A sequence attempt flows through the engine in a fixed order. The [`graph`] builder lays an
//! amplitude vector over the discretized dihedral plane for every residue, the [`evolution`]
//! engine repeatedly applies the [`operators`] and tracks [`correlation`] statistics, the
//! [`sampling`] module collapses the evolved graph into concrete conformations, and the
//! [`validation`] gates decide whether the best candidate deserves to become a discovery.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Discovery parameters and their builder
//! - **Attempt Control** ([`control`]) - Cooperative cancellation and wall-clock deadlines
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - The engine error taxonomy
//!
//! All per-node and per-draw work is independent and runs on `rayon` when the `parallel`
//! feature is enabled. Random streams are derived per item, so results do not depend on the
//! thread count.

pub mod config;
pub mod control;
pub mod correlation;
pub mod error;
pub mod evolution;
pub mod graph;
pub mod operators;
pub mod progress;
pub mod sampling;
pub mod validation;

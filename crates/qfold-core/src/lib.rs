//! # qfold Core Library
//!
//! Conformational discovery and validation for short peptide sequences: an amplitude graph over
//! discretized backbone dihedrals is evolved under constraint operators, collapsed into concrete
//! conformations, scored with an empirical energy model, and screened by a battery of
//! statistical gates before anything is reported as a discovery.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Stateless models (`Sequence`, `Conformation`), the immutable
//!   reference tables, the sequence encoder, and the pure energy evaluator.
//!
//! - **[`engine`]: The Logic Core.** The state graph, constraint operators, evolution engine,
//!   collapse sampler and validation gates, plus configuration, errors and progress reporting.
//!
//! - **[`workflows`]: The Public API.** `attempt_discovery`, `score_conformation`, discovery
//!   records and the batch driver. External collaborators only ever talk to this layer.

pub mod core;
pub mod engine;
pub mod workflows;

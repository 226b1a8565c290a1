//! # Workflows Module
//!
//! The public entry points of qfold. External collaborators (dashboards, schedulers,
//! exporters) only ever see what these functions return.
//!
//! ## Overview
//!
//! - **Discovery** ([`discover`]) - `attempt_discovery`, the single pipeline entry point:
//!   encode, build, evolve, collapse, validate, and either build a record or report a rejection.
//! - **Re-scoring** ([`score`]) - `score_conformation`, a pure recomputation of the energy report
//!   for an existing conformation.
//! - **Records** ([`record`]) - The immutable `DiscoveryRecord` and its flat export form.
//! - **Batch** ([`batch`]) - Runs many attempts in parallel without stopping on rejection.

pub mod batch;
pub mod discover;
pub mod record;
pub mod score;

pub use discover::{AttemptOutcome, RejectionReport, attempt_discovery};
pub use record::{DiscoveryExport, DiscoveryRecord};
pub use score::score_conformation;

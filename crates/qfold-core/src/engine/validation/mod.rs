//! Statistical validation of a collapsed candidate.
//!
//! Four gates run independently over the candidate: a sequence-only quality screen, a physics
//! screen over the energy report, a reality check of the secondary-structure composition
//! against the class reference, and a falsification gate over replicate samples. Their scores
//! are combined by [`RigorWeights`] into a single rigor score.

pub mod falsification;
pub mod physics;
pub mod quality;
pub mod reality;
pub mod verdict;

pub use physics::PhysicsBounds;
pub use quality::QualityParams;
pub use verdict::{RigorWeights, ValidationVerdict};

use crate::core::energy::evaluator::EnergyReport;
use crate::core::models::sequence::Sequence;
use crate::core::tables::ReferenceTables;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateKind {
    Quality,
    Physics,
    Reality,
    Falsification,
}

impl GateKind {
    pub const ALL: [GateKind; 4] = [
        GateKind::Quality,
        GateKind::Physics,
        GateKind::Reality,
        GateKind::Falsification,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GateKind::Quality => "quality",
            GateKind::Physics => "physics",
            GateKind::Reality => "reality",
            GateKind::Falsification => "falsification",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub const fn unbounded() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Result of one gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub gate: GateKind,
    pub passed: bool,
    /// Sub-score in [0, 1].
    pub score: f64,
    pub justifications: Vec<String>,
}

/// A single named check inside a gate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Check {
    pub passed: bool,
    pub detail: String,
}

impl Check {
    pub(crate) fn new(passed: bool, detail: String) -> Self {
        Self { passed, detail }
    }
}

/// Gate outcome whose score is the fraction of checks that passed.
pub(crate) fn outcome_from_checks(gate: GateKind, checks: Vec<Check>) -> GateOutcome {
    let total = checks.len();
    let passed_count = checks.iter().filter(|c| c.passed).count();
    let score = if total == 0 {
        1.0
    } else {
        passed_count as f64 / total as f64
    };
    GateOutcome {
        gate,
        passed: passed_count == total,
        score,
        justifications: checks
            .into_iter()
            .map(|c| format!("{}: {}", if c.passed { "pass" } else { "FAIL" }, c.detail))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ValidationParams {
    pub quality: QualityParams,
    pub physics: PhysicsBounds,
    /// Maximum composition distance accepted by the reality gate.
    pub reality_tolerance: f64,
    /// Minimum replicate survival fraction for the falsification gate.
    pub min_survival: f64,
    pub weights: RigorWeights,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            quality: QualityParams::default(),
            physics: PhysicsBounds::default(),
            reality_tolerance: 0.15,
            min_survival: 0.6,
            weights: RigorWeights::default(),
        }
    }
}

impl ValidationParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.reality_tolerance.is_finite() || self.reality_tolerance <= 0.0 {
            return Err(format!(
                "reality tolerance {} must be positive and finite",
                self.reality_tolerance
            ));
        }
        if !(0.0..=1.0).contains(&self.min_survival) {
            return Err(format!(
                "minimum survival {} is outside [0, 1]",
                self.min_survival
            ));
        }
        self.weights.validate()
    }
}

/// Runs the four gates against shared, read-only parameters and reference tables.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    params: &'a ValidationParams,
    tables: &'a ReferenceTables,
}

impl<'a> Validator<'a> {
    pub fn new(params: &'a ValidationParams, tables: &'a ReferenceTables) -> Self {
        Self { params, tables }
    }

    pub fn params(&self) -> &ValidationParams {
        self.params
    }

    /// Judges `report` for `sequence`, with `replicates` holding the report of the single
    /// unweighted draw of each independent replicate collapse.
    #[instrument(skip_all, name = "validator")]
    pub fn validate(
        &self,
        sequence: &Sequence,
        report: &EnergyReport,
        class_tag: Option<&str>,
        replicates: &[EnergyReport],
        rigor_threshold: f64,
    ) -> ValidationVerdict {
        let quality = quality::evaluate(sequence, &self.params.quality);
        let physics = physics::evaluate(report, sequence.len(), &self.params.physics);
        let reality = reality::evaluate(
            &report.fractions,
            class_tag,
            self.tables,
            self.params.reality_tolerance,
        );
        let falsification = falsification::evaluate(
            replicates,
            &self.params.physics,
            self.params.min_survival,
        );
        debug!(
            quality = quality.score,
            physics = physics.score,
            reality = reality.score,
            falsification = falsification.score,
            "Gate scores computed."
        );
        ValidationVerdict::new(
            quality,
            physics,
            reality,
            falsification,
            &self.params.weights,
            rigor_threshold,
        )
    }
}

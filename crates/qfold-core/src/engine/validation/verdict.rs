use super::{GateKind, GateOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Fixed coefficients of the rigor score. They must be non-negative and sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RigorWeights {
    pub quality: f64,
    pub physics: f64,
    pub reality: f64,
    pub falsification: f64,
}

impl Default for RigorWeights {
    fn default() -> Self {
        Self {
            quality: 0.2,
            physics: 0.3,
            reality: 0.2,
            falsification: 0.3,
        }
    }
}

impl RigorWeights {
    pub fn get(&self, gate: GateKind) -> f64 {
        match gate {
            GateKind::Quality => self.quality,
            GateKind::Physics => self.physics,
            GateKind::Reality => self.reality,
            GateKind::Falsification => self.falsification,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for gate in GateKind::ALL {
            let w = self.get(gate);
            if !w.is_finite() || w < 0.0 {
                return Err(format!("{gate} weight {w} must be non-negative and finite"));
            }
        }
        let sum = self.quality + self.physics + self.reality + self.falsification;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(format!("rigor weights sum to {sum}, expected 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub quality: GateOutcome,
    pub physics: GateOutcome,
    pub reality: GateOutcome,
    pub falsification: GateOutcome,
    pub rigor_score: f64,
    pub rigor_threshold: f64,
    pub accepted: bool,
}

impl ValidationVerdict {
    pub fn new(
        quality: GateOutcome,
        physics: GateOutcome,
        reality: GateOutcome,
        falsification: GateOutcome,
        weights: &RigorWeights,
        rigor_threshold: f64,
    ) -> Self {
        let rigor_score = weights.quality * quality.score
            + weights.physics * physics.score
            + weights.reality * reality.score
            + weights.falsification * falsification.score;
        let mut verdict = Self {
            quality,
            physics,
            reality,
            falsification,
            rigor_score: rigor_score.clamp(0.0, 1.0),
            rigor_threshold,
            accepted: false,
        };
        verdict.accepted = verdict.all_gates_passed() && verdict.rigor_score > rigor_threshold;
        info!(
            rigor_score = verdict.rigor_score,
            rigor_threshold,
            accepted = verdict.accepted,
            "Validation verdict reached."
        );
        verdict
    }

    pub fn gates(&self) -> [&GateOutcome; 4] {
        [
            &self.quality,
            &self.physics,
            &self.reality,
            &self.falsification,
        ]
    }

    pub fn gate(&self, kind: GateKind) -> &GateOutcome {
        match kind {
            GateKind::Quality => &self.quality,
            GateKind::Physics => &self.physics,
            GateKind::Reality => &self.reality,
            GateKind::Falsification => &self.falsification,
        }
    }

    pub fn all_gates_passed(&self) -> bool {
        self.gates().iter().all(|g| g.passed)
    }

    pub fn failed_gates(&self) -> Vec<GateKind> {
        self.gates()
            .iter()
            .filter(|g| !g.passed)
            .map(|g| g.gate)
            .collect()
    }

    /// Whether the score alone fell short, with every gate passing.
    pub fn below_threshold(&self) -> bool {
        self.all_gates_passed() && !self.accepted
    }
}

use crate::core::energy::evaluator::EnergyReport;
use crate::core::models::conformation::Conformation;
use crate::core::models::sequence::Sequence;
use crate::engine::correlation::CorrelationSummary;
use crate::engine::error::EngineError;
use crate::engine::evolution::EvolutionTrace;
use crate::engine::sampling::ConformationSample;
use crate::engine::validation::ValidationVerdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An accepted, fully scored candidate. Immutable once built.
#[derive(Debug, Clone)]
pub struct DiscoveryRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    sequence: Sequence,
    best: ConformationSample,
    report: EnergyReport,
    verdict: ValidationVerdict,
    seed: u64,
    class_tag: String,
    trace: EvolutionTrace,
    correlation: CorrelationSummary,
}

impl DiscoveryRecord {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn best_sample(&self) -> &ConformationSample {
        &self.best
    }

    pub fn best_conformation(&self) -> &Conformation {
        self.best.conformation()
    }

    pub fn report(&self) -> &EnergyReport {
        &self.report
    }

    pub fn verdict(&self) -> &ValidationVerdict {
        &self.verdict
    }

    /// Seed that reproduces this attempt.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn class_tag(&self) -> &str {
        &self.class_tag
    }

    pub fn trace(&self) -> &EvolutionTrace {
        &self.trace
    }

    pub fn correlation(&self) -> &CorrelationSummary {
        &self.correlation
    }

    pub fn to_export(&self) -> DiscoveryExport {
        let d = &self.report.descriptors;
        DiscoveryExport {
            id: self.id,
            sequence: self.sequence.to_string(),
            best_dihedrals: self
                .best_conformation()
                .angles()
                .iter()
                .map(|p| [p.phi, p.psi])
                .collect(),
            secondary_structure: self.report.secondary_structure_string(),
            total_energy: self.report.total_energy,
            helix_fraction: self.report.fractions.helix,
            sheet_fraction: self.report.fractions.sheet,
            coil_fraction: self.report.fractions.coil,
            molecular_weight: d.molecular_weight,
            net_charge: d.net_charge,
            gravy: d.gravy,
            instability_index: d.instability_index,
            isoelectric_point: d.isoelectric_point,
            aromaticity: d.aromaticity,
            aliphatic_index: d.aliphatic_index,
            rigor_score: self.verdict.rigor_score,
            quality_passed: self.verdict.quality.passed,
            physics_passed: self.verdict.physics.passed,
            reality_passed: self.verdict.reality.passed,
            falsification_passed: self.verdict.falsification.passed,
            seed: self.seed,
            class_tag: self.class_tag.clone(),
            created_at: self.created_at,
        }
    }
}

/// Flat, stable representation consumed by exporters and dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscoveryExport {
    pub id: Uuid,
    pub sequence: String,
    /// `[phi, psi]` per residue, degrees.
    pub best_dihedrals: Vec<[f64; 2]>,
    pub secondary_structure: String,
    pub total_energy: f64,
    pub helix_fraction: f64,
    pub sheet_fraction: f64,
    pub coil_fraction: f64,
    pub molecular_weight: f64,
    pub net_charge: f64,
    pub gravy: f64,
    pub instability_index: f64,
    pub isoelectric_point: f64,
    pub aromaticity: f64,
    pub aliphatic_index: f64,
    pub rigor_score: f64,
    pub quality_passed: bool,
    pub physics_passed: bool,
    pub reality_passed: bool,
    pub falsification_passed: bool,
    pub seed: u64,
    pub class_tag: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub(crate) struct DiscoveryRecordBuilder {
    sequence: Option<Sequence>,
    best: Option<ConformationSample>,
    report: Option<EnergyReport>,
    verdict: Option<ValidationVerdict>,
    seed: Option<u64>,
    class_tag: Option<String>,
    trace: Option<EvolutionTrace>,
    correlation: Option<CorrelationSummary>,
}

impl DiscoveryRecordBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = Some(sequence);
        self
    }
    pub(crate) fn best(mut self, sample: ConformationSample, report: EnergyReport) -> Self {
        self.best = Some(sample);
        self.report = Some(report);
        self
    }
    pub(crate) fn verdict(mut self, verdict: ValidationVerdict) -> Self {
        self.verdict = Some(verdict);
        self
    }
    pub(crate) fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub(crate) fn class_tag(mut self, tag: impl Into<String>) -> Self {
        self.class_tag = Some(tag.into());
        self
    }
    pub(crate) fn trace(mut self, trace: EvolutionTrace) -> Self {
        self.trace = Some(trace);
        self
    }
    pub(crate) fn correlation(mut self, summary: CorrelationSummary) -> Self {
        self.correlation = Some(summary);
        self
    }

    /// Freezes the parts into a record. Refuses verdicts that were not accepted.
    pub(crate) fn build(self) -> Result<DiscoveryRecord, EngineError> {
        let missing =
            |part: &str| EngineError::Internal(format!("discovery record is missing its {part}"));
        let verdict = self.verdict.ok_or_else(|| missing("verdict"))?;
        if !verdict.accepted {
            return Err(EngineError::Internal(
                "refusing to build a discovery record from a rejected verdict".to_string(),
            ));
        }
        let sequence = self.sequence.ok_or_else(|| missing("sequence"))?;
        let best = self.best.ok_or_else(|| missing("best sample"))?;
        if best.len() != sequence.len() {
            return Err(EngineError::ConformationMismatch {
                expected: sequence.len(),
                found: best.len(),
            });
        }
        Ok(DiscoveryRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            sequence,
            best,
            report: self.report.ok_or_else(|| missing("energy report"))?,
            verdict,
            seed: self.seed.ok_or_else(|| missing("seed"))?,
            class_tag: self.class_tag.ok_or_else(|| missing("class tag"))?,
            trace: self.trace.unwrap_or_default(),
            correlation: self.correlation.unwrap_or_default(),
        })
    }
}

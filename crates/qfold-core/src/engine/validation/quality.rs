use super::{Bounds, Check, GateKind, GateOutcome, outcome_from_checks};
use crate::core::models::residue::AminoAcid;
use crate::core::models::sequence::{MAX_SEQUENCE_LENGTH, MIN_SEQUENCE_LENGTH, Sequence};
use crate::core::tables::properties::is_hydrophobic;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct QualityParams {
    /// Distinct residues divided by `min(L, 20)`.
    pub min_diversity: f64,
    pub hydrophobic_fraction: Bounds,
    /// Longest allowed homopolymer run.
    pub max_run: usize,
    pub max_residue_frequency: f64,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            min_diversity: 0.35,
            hydrophobic_fraction: Bounds::new(0.15, 0.65),
            max_run: 4,
            max_residue_frequency: 0.35,
        }
    }
}

pub fn diversity(residues: &[AminoAcid]) -> f64 {
    if residues.is_empty() {
        return 0.0;
    }
    let distinct = residues.iter().unique().count();
    distinct as f64 / residues.len().min(AminoAcid::COUNT) as f64
}

pub fn hydrophobic_fraction(residues: &[AminoAcid]) -> f64 {
    if residues.is_empty() {
        return 0.0;
    }
    residues.iter().filter(|&&aa| is_hydrophobic(aa)).count() as f64 / residues.len() as f64
}

pub fn longest_run(residues: &[AminoAcid]) -> usize {
    residues
        .iter()
        .dedup_with_count()
        .map(|(count, _)| count)
        .max()
        .unwrap_or(0)
}

pub fn max_residue_frequency(residues: &[AminoAcid]) -> f64 {
    if residues.is_empty() {
        return 0.0;
    }
    let mut counts = [0usize; AminoAcid::COUNT];
    for aa in residues {
        counts[aa.index()] += 1;
    }
    counts.iter().copied().max().unwrap_or(0) as f64 / residues.len() as f64
}

/// Sequence-only screen; never looks at conformations or energies.
pub fn evaluate(sequence: &Sequence, params: &QualityParams) -> GateOutcome {
    let residues = sequence.residues();
    let length = residues.len();
    let diversity = diversity(residues);
    let hydrophobic = hydrophobic_fraction(residues);
    let run = longest_run(residues);
    let frequency = max_residue_frequency(residues);

    let checks = vec![
        Check::new(
            (MIN_SEQUENCE_LENGTH..=MAX_SEQUENCE_LENGTH).contains(&length),
            format!("length {length} within [{MIN_SEQUENCE_LENGTH}, {MAX_SEQUENCE_LENGTH}]"),
        ),
        Check::new(
            diversity >= params.min_diversity,
            format!("residue diversity {diversity:.3} >= {}", params.min_diversity),
        ),
        Check::new(
            params.hydrophobic_fraction.contains(hydrophobic),
            format!(
                "hydrophobic fraction {hydrophobic:.3} within {}",
                params.hydrophobic_fraction
            ),
        ),
        Check::new(
            run <= params.max_run,
            format!("longest homopolymer run {run} <= {}", params.max_run),
        ),
        Check::new(
            frequency <= params.max_residue_frequency,
            format!(
                "most frequent residue share {frequency:.3} <= {}",
                params.max_residue_frequency
            ),
        ),
    ];
    outcome_from_checks(GateKind::Quality, checks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> Sequence {
        s.parse().unwrap()
    }

    #[test]
    fn diverse_balanced_sequence_passes() {
        let outcome = evaluate(&seq("AGPLAWATAFSAVAIKKKIDVERLYNAQ"), &QualityParams::default());
        assert!(outcome.passed, "{:?}", outcome.justifications);
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.justifications.len(), 5);
    }

    #[test]
    fn homopolymer_fails_every_composition_check() {
        let outcome = evaluate(&seq("KKKKKKKKKK"), &QualityParams::default());
        assert!(!outcome.passed);
        // Only the length check survives.
        assert!((outcome.score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn runs_and_frequencies_are_measured() {
        let residues = seq("AAKKKKKGLE").residues().to_vec();
        assert_eq!(longest_run(&residues), 5);
        assert!((max_residue_frequency(&residues) - 0.5).abs() < 1e-12);
        assert!((diversity(&residues) - 0.5).abs() < 1e-12);
        assert!((hydrophobic_fraction(&residues) - 0.3).abs() < 1e-12);
    }
}

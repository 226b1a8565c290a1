use super::physics::PhysicsBounds;
use super::{GateKind, GateOutcome};
use crate::core::energy::evaluator::EnergyReport;

/// Treats each replicate's unweighted draw as an independent hypothesis; one survives when its
/// conformation stays within the physics bounds. The sub-score is the surviving fraction.
pub fn evaluate(
    replicates: &[EnergyReport],
    bounds: &PhysicsBounds,
    min_survival: f64,
) -> GateOutcome {
    if replicates.is_empty() {
        return GateOutcome {
            gate: GateKind::Falsification,
            passed: false,
            score: 0.0,
            justifications: vec!["FAIL: no replicate hypotheses were tested".to_string()],
        };
    }

    let survivors: Vec<usize> = replicates
        .iter()
        .enumerate()
        .filter(|(_, r)| bounds.admits_conformation(r))
        .map(|(i, _)| i)
        .collect();
    let survival = survivors.len() as f64 / replicates.len() as f64;
    let passed = survival >= min_survival;

    let mut justifications = vec![format!(
        "{}: {}/{} replicate hypotheses survived ({survival:.3} >= {min_survival})",
        if passed { "pass" } else { "FAIL" },
        survivors.len(),
        replicates.len()
    )];
    let falsified: Vec<String> = (0..replicates.len())
        .filter(|i| !survivors.contains(i))
        .map(|i| (i + 1).to_string())
        .collect();
    if !falsified.is_empty() {
        justifications.push(format!("falsified replicates: {}", falsified.join(", ")));
    }

    GateOutcome {
        gate: GateKind::Falsification,
        passed,
        score: survival,
        justifications,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::evaluator::{EnergyEvaluator, EnergyParams};
    use crate::core::models::conformation::{Conformation, DihedralPair};
    use crate::core::models::sequence::Sequence;
    use crate::core::tables::ReferenceTables;
    use crate::engine::validation::Bounds;

    fn report(seq: &str, pair: DihedralPair) -> EnergyReport {
        let tables = ReferenceTables::builtin();
        let sequence: Sequence = seq.parse().unwrap();
        EnergyEvaluator::new(&tables, EnergyParams::default())
            .evaluate(&sequence, &Conformation::uniform(sequence.len(), pair))
            .unwrap()
    }

    #[test]
    fn empty_population_fails() {
        let outcome = evaluate(&[], &PhysicsBounds::default(), 0.6);
        assert!(!outcome.passed);
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn survival_fraction_is_the_score() {
        const SEQ: &str = "AEAAKAAEAAKAAEAA";
        let helix = report(SEQ, DihedralPair::new(-63.0, -43.0));
        let strand = report(SEQ, DihedralPair::new(-120.0, 130.0));
        // Admit only energies at or below the helical one.
        let bounds = PhysicsBounds {
            per_residue_energy: Bounds::new(f64::NEG_INFINITY, helix.per_residue_energy),
            ..PhysicsBounds::permissive()
        };
        assert!(strand.per_residue_energy > helix.per_residue_energy);

        let population = vec![helix.clone(), strand.clone(), helix.clone(), strand];
        let outcome = evaluate(&population, &bounds, 0.6);
        assert!((outcome.score - 0.5).abs() < 1e-12);
        assert!(!outcome.passed);
        assert!(outcome.justifications[1].ends_with("2, 4"));

        let lenient = evaluate(&population, &bounds, 0.5);
        assert!(lenient.passed);
    }

    #[test]
    fn sequence_level_bounds_do_not_falsify_replicates() {
        // Every conformation of a poly-lysine breaks the charge bound alike; that is the physics
        // gate's verdict on the sequence, not evidence against any one replicate.
        let population = vec![report("KKKKKKKKKKKKKKKK", DihedralPair::new(-63.0, -43.0)); 3];
        let bounds = PhysicsBounds {
            charge_density: 0.2,
            ..PhysicsBounds::permissive()
        };
        let outcome = evaluate(&population, &bounds, 0.6);
        assert!(outcome.passed);
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn replicates_above_the_default_energy_ceiling_are_falsified() {
        const SEQ: &str = "AEAAKAAEAAKAAEAA";
        // Left-handed helix is disfavoured for every residue here.
        let left = report(SEQ, DihedralPair::new(60.0, 45.0));
        let helix = report(SEQ, DihedralPair::new(-63.0, -43.0));
        let bounds = PhysicsBounds::default();
        assert!(left.per_residue_energy > bounds.per_residue_energy.max);
        assert!(helix.per_residue_energy < bounds.per_residue_energy.max);

        let outcome = evaluate(&[helix, left.clone(), left], &bounds, 0.6);
        assert!(!outcome.passed);
        assert!((outcome.score - 1.0 / 3.0).abs() < 1e-12);
    }
}

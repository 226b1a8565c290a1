use qfold::core::encoder::encode;
use qfold::core::energy::evaluator::{EnergyEvaluator, EnergyParams};
use qfold::core::models::conformation::{Conformation, DihedralPair};
use qfold::core::models::residue::AminoAcid;
use qfold::core::models::sequence::Sequence;
use qfold::core::tables::ReferenceTables;
use qfold::engine::config::{GraphConfig, InitialAmplitudes};
use qfold::engine::graph::{Basis, StateGraph};
use qfold::engine::sampling::collapse;
use qfold::workflows::score_conformation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const HELIX: DihedralPair = DihedralPair {
    phi: -63.0,
    psi: -43.0,
};
const STRAND: DihedralPair = DihedralPair {
    phi: -120.0,
    psi: 130.0,
};
const POLYPROLINE: DihedralPair = DihedralPair {
    phi: -75.0,
    psi: 150.0,
};
const SCENARIO_SEQUENCE: &str = "AGPLAWATAFSAVAIKKKIDVERLYNAQ";
const HELICAL_PEPTIDE: &str = "AAEAAAKAAAEAALKAAAEAAKAA";

fn conservative_partners(aa: AminoAcid) -> &'static [AminoAcid] {
    use AminoAcid::*;
    match aa {
        Leucine => &[Isoleucine],
        Isoleucine => &[Leucine, Valine],
        Valine => &[Isoleucine],
        Lysine => &[Arginine],
        Arginine => &[Lysine],
        GlutamicAcid => &[AsparticAcid],
        AsparticAcid => &[GlutamicAcid],
        _ => &[],
    }
}

fn charge_reversals(aa: AminoAcid) -> &'static [AminoAcid] {
    use AminoAcid::*;
    match aa {
        Lysine | Arginine => &[AsparticAcid, GlutamicAcid],
        AsparticAcid | GlutamicAcid => &[Lysine, Arginine],
        _ => &[],
    }
}

/// Uniform helix, strand and polyproline backbones, uniformly random backbones, and draws
/// collapsed from the state graph of `sequence`.
fn conformations(sequence: &Sequence, tables: &ReferenceTables) -> Vec<Conformation> {
    let n = sequence.len();
    let mut conformations: Vec<Conformation> = [HELIX, STRAND, POLYPROLINE]
        .into_iter()
        .map(|pair| Conformation::uniform(n, pair))
        .collect();

    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..4 {
        let angles = (0..n)
            .map(|_| {
                DihedralPair::new(rng.gen_range(-179.9..=180.0), rng.gen_range(-179.9..=180.0))
            })
            .collect();
        conformations.push(Conformation::new(angles));
    }

    let evaluator = EnergyEvaluator::new(tables, EnergyParams::default());
    let graph = Arc::new(StateGraph::build(
        &encode(sequence),
        Basis::new(12),
        300.0,
        InitialAmplitudes::FeatureWeighted,
        &GraphConfig::default(),
        tables,
        &evaluator,
    ));
    let pool = collapse(&graph, 4, 300.0, 17, 0, |c| evaluator.evaluate(sequence, c)).unwrap();
    conformations.extend(pool.samples().iter().map(|s| s.sample.conformation().clone()));
    conformations
}

#[derive(Debug, Default)]
struct SubstitutionSweep {
    largest_conservative: f64,
    smallest_reversal: f64,
    worst_conservative: Option<String>,
    worst_reversal: Option<String>,
}

/// Scores every conservative and every charge-reversing point substitution of `wild_type` on
/// each conformation, keeping the extremes of the energy shift.
fn sweep(wild_type: &str) -> SubstitutionSweep {
    let tables = ReferenceTables::builtin();
    let params = EnergyParams::default();
    let wild_type: Sequence = wild_type.parse().unwrap();
    let mut result = SubstitutionSweep {
        smallest_reversal: f64::INFINITY,
        ..SubstitutionSweep::default()
    };

    for (c, conformation) in conformations(&wild_type, &tables).iter().enumerate() {
        let base = score_conformation(&wild_type, conformation, &tables, &params)
            .unwrap()
            .total_energy;
        for (position, aa) in wild_type.iter().enumerate() {
            let shift = |to: AminoAcid| {
                let mutant = wild_type.with_substitution(position, to).unwrap();
                let energy = score_conformation(&mutant, conformation, &tables, &params)
                    .unwrap()
                    .total_energy;
                ((energy - base).abs(), format!("{aa}{}{to} on conformation {c}", position + 1))
            };
            for &to in conservative_partners(aa) {
                let (delta, label) = shift(to);
                if delta > result.largest_conservative {
                    result.largest_conservative = delta;
                    result.worst_conservative = Some(label);
                }
            }
            for &to in charge_reversals(aa) {
                let (delta, label) = shift(to);
                if delta < result.smallest_reversal {
                    result.smallest_reversal = delta;
                    result.worst_reversal = Some(label);
                }
            }
        }
    }
    result
}

fn assert_substitutions_are_separated(wild_type: &str) {
    let result = sweep(wild_type);
    let tolerance = EnergyParams::SUBSTITUTION_TOLERANCE;
    assert!(result.worst_conservative.is_some() && result.worst_reversal.is_some());
    assert!(
        result.largest_conservative < tolerance,
        "conservative {:?} shifted the energy by {:.3}",
        result.worst_conservative,
        result.largest_conservative
    );
    assert!(
        result.smallest_reversal > tolerance,
        "reversal {:?} shifted the energy by only {:.3}",
        result.worst_reversal,
        result.smallest_reversal
    );
}

#[test]
fn substitutions_of_the_scenario_sequence_separate_at_the_tolerance() {
    assert_substitutions_are_separated(SCENARIO_SEQUENCE);
}

#[test]
fn substitutions_of_a_salt_bridged_helix_separate_at_the_tolerance() {
    assert_substitutions_are_separated(HELICAL_PEPTIDE);
}

#[test]
fn scoring_is_bit_for_bit_reproducible() {
    let tables = ReferenceTables::builtin();
    let sequence: Sequence = HELICAL_PEPTIDE.parse().unwrap();
    let mut angles = Vec::new();
    for i in 0..sequence.len() {
        let t = i as f64;
        angles.push(DihedralPair::new(-120.0 + 9.5 * t, 130.0 - 11.0 * t));
    }
    let conformation = Conformation::new(angles);

    let first = score_conformation(&sequence, &conformation, &tables, &EnergyParams::default())
        .unwrap();
    let second = score_conformation(&sequence, &conformation, &tables, &EnergyParams::default())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.total_energy.to_bits(), second.total_energy.to_bits());
}

#[test]
fn all_helix_conformation_is_labelled_helical() {
    let tables = ReferenceTables::builtin();
    let sequence: Sequence = HELICAL_PEPTIDE.parse().unwrap();
    let report = score_conformation(
        &sequence,
        &Conformation::uniform(sequence.len(), HELIX),
        &tables,
        &EnergyParams::default(),
    )
    .unwrap();
    assert!(report.secondary_structure_string().chars().all(|c| c == 'H'));
    assert!(report.fractions.helix > 0.99);
}

use crate::core::energy::evaluator::{EnergyEvaluator, EnergyParams, EnergyReport};
use crate::core::models::conformation::Conformation;
use crate::core::models::sequence::Sequence;
use crate::core::tables::ReferenceTables;
use crate::engine::error::EngineError;
use tracing::{debug, instrument};

/// Recomputes the energy report of an existing conformation without sampling.
///
/// Pure and deterministic: identical inputs always produce a bit-identical report, so a
/// discovery record's report can be reproduced from its best conformation.
#[instrument(skip_all, name = "score_conformation", fields(residues = sequence.len()))]
pub fn score_conformation(
    sequence: &Sequence,
    conformation: &Conformation,
    tables: &ReferenceTables,
    params: &EnergyParams,
) -> Result<EnergyReport, EngineError> {
    let report = EnergyEvaluator::new(tables, *params).evaluate(sequence, conformation)?;
    debug!(
        total_energy = report.total_energy,
        secondary_structure = %report.secondary_structure_string(),
        "Conformation scored."
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::conformation::DihedralPair;

    fn seq() -> Sequence {
        "AGPLAWATAFSAVAIK".parse().unwrap()
    }

    #[test]
    fn length_mismatch_is_reported() {
        let conformation = Conformation::uniform(5, DihedralPair::new(-63.0, -43.0));
        let result = score_conformation(
            &seq(),
            &conformation,
            &ReferenceTables::builtin(),
            &EnergyParams::default(),
        );
        assert!(matches!(
            result,
            Err(EngineError::ConformationMismatch {
                expected: 16,
                found: 5
            })
        ));
    }

    #[test]
    fn out_of_range_angle_is_reported_with_its_position() {
        let mut angles = vec![DihedralPair::new(-63.0, -43.0); 16];
        angles[9] = DihedralPair::new(-180.0, 10.0);
        let result = score_conformation(
            &seq(),
            &Conformation::new(angles),
            &ReferenceTables::builtin(),
            &EnergyParams::default(),
        );
        assert!(matches!(
            result,
            Err(EngineError::AngleOutOfRange { position: 9, .. })
        ));
    }
}

use super::{GateKind, GateOutcome};
use crate::core::models::conformation::SecondaryStructureFractions;
use crate::core::tables::ReferenceTables;
use crate::core::tables::reference::DEFAULT_CLASS_TAG;

/// Sub-score `1 / (1 + d / tolerance)`; exactly 0.5 at the pass boundary.
pub fn score(distance: f64, tolerance: f64) -> f64 {
    if tolerance <= 0.0 {
        return if distance <= 0.0 { 1.0 } else { 0.0 };
    }
    1.0 / (1.0 + distance / tolerance)
}

/// Compares a helix/sheet/coil composition to the reference ranges for `class_tag`.
pub fn evaluate(
    fractions: &SecondaryStructureFractions,
    class_tag: Option<&str>,
    tables: &ReferenceTables,
    tolerance: f64,
) -> GateOutcome {
    let (tag, reference) = tables.class_reference(class_tag);
    let distance = reference.distance(fractions);
    let passed = distance <= tolerance;

    let mut justifications = vec![format!(
        "composition H {:.2} / E {:.2} / C {:.2} compared with class '{tag}'",
        fractions.helix, fractions.sheet, fractions.coil
    )];
    if let Some(requested) = class_tag {
        let requested = requested.trim();
        if !requested.is_empty()
            && tag == DEFAULT_CLASS_TAG
            && !requested.eq_ignore_ascii_case(DEFAULT_CLASS_TAG)
        {
            let known: Vec<&str> = tables.class_tags().collect();
            justifications.push(format!(
                "unknown class tag '{requested}', used '{tag}' (known: {})",
                known.join(", ")
            ));
        }
    }
    justifications.push(format!(
        "{}: range distance {distance:.3} <= {tolerance}",
        if passed { "pass" } else { "FAIL" }
    ));

    GateOutcome {
        gate: GateKind::Reality,
        passed,
        score: score(distance, tolerance),
        justifications,
    }
}

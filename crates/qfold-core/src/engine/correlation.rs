use super::graph::{Amplitudes, StateGraph};
use crate::core::tables::reference::CorrelationThresholds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrelationClass {
    StrongInPhase,
    StrongAntiPhase,
    Weak,
    Uncorrelated,
}

/// Overlap between the amplitude vectors of two connected nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairCorrelation {
    pub i: usize,
    pub j: usize,
    /// `|<a_i|a_j>|`, in [0, 1] for normalized vectors.
    pub strength: f64,
    pub class: CorrelationClass,
}

pub fn classify(a: &Amplitudes, b: &Amplitudes, thresholds: &CorrelationThresholds) -> (f64, CorrelationClass) {
    let overlap = a.dotc(b);
    let strength = overlap.norm().min(1.0);
    let class = if strength >= thresholds.strong {
        if overlap.re >= 0.0 {
            CorrelationClass::StrongInPhase
        } else {
            CorrelationClass::StrongAntiPhase
        }
    } else if strength >= thresholds.weak {
        CorrelationClass::Weak
    } else {
        CorrelationClass::Uncorrelated
    };
    (strength, class)
}

/// One correlation per graph edge, in edge order.
pub fn compute(graph: &StateGraph, thresholds: &CorrelationThresholds) -> Vec<PairCorrelation> {
    let nodes = graph.nodes();
    graph
        .edges()
        .iter()
        .map(|edge| {
            let (strength, class) =
                classify(&nodes[edge.i].amplitudes, &nodes[edge.j].amplitudes, thresholds);
            PairCorrelation {
                i: edge.i,
                j: edge.j,
                strength,
                class,
            }
        })
        .collect()
}

pub fn mean_strength(correlations: &[PairCorrelation]) -> f64 {
    if correlations.is_empty() {
        return 0.0;
    }
    correlations.iter().map(|c| c.strength).sum::<f64>() / correlations.len() as f64
}

/// Per-class counts over a graph snapshot. Informational only; no gate reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CorrelationSummary {
    pub strong_in_phase: usize,
    pub strong_anti_phase: usize,
    pub weak: usize,
    pub uncorrelated: usize,
    pub mean_strength: f64,
}

impl CorrelationSummary {
    pub fn from_correlations(correlations: &[PairCorrelation]) -> Self {
        let mut summary = Self {
            mean_strength: mean_strength(correlations),
            ..Self::default()
        };
        for c in correlations {
            match c.class {
                CorrelationClass::StrongInPhase => summary.strong_in_phase += 1,
                CorrelationClass::StrongAntiPhase => summary.strong_anti_phase += 1,
                CorrelationClass::Weak => summary.weak += 1,
                CorrelationClass::Uncorrelated => summary.uncorrelated += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.strong_in_phase + self.strong_anti_phase + self.weak + self.uncorrelated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn vector(values: &[(f64, f64)]) -> Amplitudes {
        Amplitudes::from_iterator(values.len(), values.iter().map(|&(re, im)| Complex64::new(re, im)))
    }

    #[test]
    fn identical_vectors_are_strongly_in_phase() {
        let a = vector(&[(0.6, 0.0), (0.0, 0.8)]);
        let (strength, class) = classify(&a, &a, &CorrelationThresholds::default());
        assert!((strength - 1.0).abs() < 1e-12);
        assert_eq!(class, CorrelationClass::StrongInPhase);
    }

    #[test]
    fn negated_vector_is_strongly_anti_phase() {
        let a = vector(&[(0.6, 0.0), (0.8, 0.0)]);
        let b = vector(&[(-0.6, 0.0), (-0.8, 0.0)]);
        let (_, class) = classify(&a, &b, &CorrelationThresholds::default());
        assert_eq!(class, CorrelationClass::StrongAntiPhase);
    }

    #[test]
    fn orthogonal_vectors_are_uncorrelated() {
        let a = vector(&[(1.0, 0.0), (0.0, 0.0)]);
        let b = vector(&[(0.0, 0.0), (1.0, 0.0)]);
        let (strength, class) = classify(&a, &b, &CorrelationThresholds::default());
        assert_eq!(strength, 0.0);
        assert_eq!(class, CorrelationClass::Uncorrelated);
    }

    #[test]
    fn partial_overlap_is_weak() {
        let s = 0.5f64.sqrt();
        let a = vector(&[(1.0, 0.0), (0.0, 0.0)]);
        let b = vector(&[(s, 0.0), (s, 0.0)]);
        let (strength, class) = classify(&a, &b, &CorrelationThresholds::default());
        assert!((strength - s).abs() < 1e-12);
        assert_eq!(class, CorrelationClass::Weak);
    }

    #[test]
    fn summary_counts_every_class() {
        let make = |class| PairCorrelation {
            i: 0,
            j: 1,
            strength: 0.5,
            class,
        };
        let summary = CorrelationSummary::from_correlations(&[
            make(CorrelationClass::StrongInPhase),
            make(CorrelationClass::Weak),
            make(CorrelationClass::Weak),
            make(CorrelationClass::Uncorrelated),
        ]);
        assert_eq!(summary.weak, 2);
        assert_eq!(summary.total(), 4);
        assert!((summary.mean_strength - 0.5).abs() < 1e-12);
    }
}

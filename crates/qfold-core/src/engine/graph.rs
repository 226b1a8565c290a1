use super::config::{GraphConfig, InitialAmplitudes};
use super::correlation::PairCorrelation;
use crate::core::encoder::{EncodedSequence, ResidueFeatures};
use crate::core::energy::evaluator::{EnergyEvaluator, GAS_CONSTANT};
use crate::core::models::conformation::{
    DihedralPair, RamachandranRegion, SecondaryStructure, wrap_degrees,
};
use crate::core::models::residue::AminoAcid;
use crate::core::tables::ReferenceTables;
use nalgebra::DVector;
use num_complex::Complex64;
use tracing::{debug, instrument};

pub type Amplitudes = DVector<Complex64>;

pub(crate) const COLLAPSED_NORM: f64 = 1e-12;

/// Square grid over the (phi, psi) torus: `side * side` bins of equal width.
///
/// Basis index `k` maps to phi bin `k / side` and psi bin `k % side`. Bin `b` covers the
/// half-open interval `(-180 + b * w, -180 + (b + 1) * w]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Basis {
    side: usize,
}

impl Basis {
    pub fn new(side: usize) -> Self {
        Self { side: side.max(1) }
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.side * self.side
    }

    #[inline]
    pub fn bin_width(&self) -> f64 {
        360.0 / self.side as f64
    }

    #[inline]
    pub fn bins(&self, k: usize) -> (usize, usize) {
        (k / self.side, k % self.side)
    }

    pub fn center(&self, k: usize) -> DihedralPair {
        let (phi_bin, psi_bin) = self.bins(k);
        DihedralPair::new(self.angle_in_bin(phi_bin, 0.5), self.angle_in_bin(psi_bin, 0.5))
    }

    /// Angle inside `bin` for `u` in `[0, 1)`; `u = 0` gives the closed upper edge.
    pub fn angle_in_bin(&self, bin: usize, u: f64) -> f64 {
        let angle = -180.0 + (bin as f64 + 1.0 - u) * self.bin_width();
        // Rounding can land exactly on -180 for the lowest bin; map it to the equivalent +180.
        wrap_degrees(angle)
    }

    pub fn bin_of(&self, angle: f64) -> usize {
        let w = self.bin_width();
        let offset = wrap_degrees(angle) + 180.0;
        let bin = (offset / w).ceil() as usize;
        bin.saturating_sub(1).min(self.side - 1)
    }

    pub fn index_of(&self, pair: DihedralPair) -> usize {
        self.bin_of(pair.phi) * self.side + self.bin_of(pair.psi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Sequential,
    LongRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub i: usize,
    pub j: usize,
    pub weight: f64,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResidueNode {
    pub position: usize,
    pub residue: AminoAcid,
    pub amplitudes: Amplitudes,
    /// Backbone energy of this residue at each basis-state centre.
    pub basis_energies: Vec<f64>,
    /// Boltzmann amplitudes `sqrt(p_eq)` at the graph temperature.
    pub equilibrium: Vec<f64>,
}

impl ResidueNode {
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    pub fn norm_squared(&self) -> f64 {
        self.amplitudes.norm_squared()
    }

    pub fn equilibrium_amplitudes(&self) -> Amplitudes {
        Amplitudes::from_iterator(
            self.equilibrium.len(),
            self.equilibrium.iter().map(|&a| Complex64::new(a, 0.0)),
        )
    }
}

/// Residue-level amplitude graph.
///
/// Sequential edges `(i, i + 1)` always connect the chain; long-range edges are added from the
/// interaction heuristic. Edges are undirected, so weights are symmetric by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StateGraph {
    basis: Basis,
    temperature: f64,
    nodes: Vec<ResidueNode>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<(usize, f64)>>,
    basis_classes: Vec<SecondaryStructure>,
    correlations: Vec<PairCorrelation>,
}

impl StateGraph {
    #[instrument(skip_all, name = "build_state_graph")]
    pub fn build(
        encoded: &EncodedSequence,
        basis: Basis,
        temperature: f64,
        initial: InitialAmplitudes,
        config: &GraphConfig,
        tables: &ReferenceTables,
        evaluator: &EnergyEvaluator,
    ) -> Self {
        let centers: Vec<DihedralPair> = (0..basis.size()).map(|k| basis.center(k)).collect();
        let center_regions: Vec<RamachandranRegion> =
            centers.iter().map(DihedralPair::region).collect();
        let basis_classes = center_regions
            .iter()
            .map(|r| r.secondary_structure())
            .collect();

        let thermal = GAS_CONSTANT * temperature;
        let nodes: Vec<ResidueNode> = encoded
            .features()
            .iter()
            .enumerate()
            .map(|(position, features)| {
                let residue = features.residue;
                let basis_energies: Vec<f64> = centers
                    .iter()
                    .map(|&c| evaluator.backbone_energy(residue, c))
                    .collect();
                let equilibrium = boltzmann_amplitudes(&basis_energies, thermal);
                let amplitudes = match initial {
                    InitialAmplitudes::Uniform => uniform_amplitudes(basis.size()),
                    InitialAmplitudes::FeatureWeighted => {
                        feature_weighted_amplitudes(residue, &center_regions, tables)
                    }
                };
                ResidueNode {
                    position,
                    residue,
                    amplitudes,
                    basis_energies,
                    equilibrium,
                }
            })
            .collect();

        let edges = build_edges(encoded.features(), config);
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            adjacency[edge.i].push((edge.j, edge.weight));
            adjacency[edge.j].push((edge.i, edge.weight));
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            basis_size = basis.size(),
            "State graph built."
        );

        Self {
            basis,
            temperature,
            nodes,
            edges,
            adjacency,
            basis_classes,
            correlations: Vec::new(),
        }
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ResidueNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [ResidueNode] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.adjacency[i]
    }

    pub fn basis_classes(&self) -> &[SecondaryStructure] {
        &self.basis_classes
    }

    /// Correlations from the most recent evolution step; empty before evolution.
    pub fn correlations(&self) -> &[PairCorrelation] {
        &self.correlations
    }

    pub(crate) fn set_correlations(&mut self, correlations: Vec<PairCorrelation>) {
        self.correlations = correlations;
    }

    /// Largest deviation of any node's squared norm from one.
    pub fn max_normalization_error(&self) -> f64 {
        self.nodes
            .iter()
            .map(|n| (n.norm_squared() - 1.0).abs())
            .fold(0.0, f64::max)
    }
}

fn uniform_amplitudes(size: usize) -> Amplitudes {
    let a = 1.0 / (size as f64).sqrt();
    Amplitudes::from_element(size, Complex64::new(a, 0.0))
}

/// `sqrt(w_region / n_region)` for each bin, where `n_region` is the number of bins whose centre
/// falls in the region, then renormalized so unrepresented regions do not leak probability.
fn feature_weighted_amplitudes(
    residue: AminoAcid,
    center_regions: &[RamachandranRegion],
    tables: &ReferenceTables,
) -> Amplitudes {
    let mut counts = [0usize; 4];
    for region in center_regions {
        counts[region.index()] += 1;
    }
    let populations = tables.populations(residue);
    let mut amplitudes = Amplitudes::from_iterator(
        center_regions.len(),
        center_regions.iter().map(|&region| {
            let share = populations.get(region) / counts[region.index()] as f64;
            Complex64::new(share.sqrt(), 0.0)
        }),
    );
    if renormalize(&mut amplitudes).is_some() {
        amplitudes
    } else {
        uniform_amplitudes(center_regions.len())
    }
}

/// Scales `amplitudes` to unit norm. Returns the previous norm, or `None` (leaving the vector
/// untouched) when it is below `1e-12` or not finite.
pub(crate) fn renormalize(amplitudes: &mut Amplitudes) -> Option<f64> {
    let norm = amplitudes.norm();
    if !norm.is_finite() || norm < COLLAPSED_NORM {
        return None;
    }
    for a in amplitudes.iter_mut() {
        *a /= norm;
    }
    Some(norm)
}

/// `sqrt(p_k)` with `p_k ∝ exp(-E_k / RT)`, shifted by the minimum energy for stability.
pub(crate) fn boltzmann_amplitudes(energies: &[f64], thermal_energy: f64) -> Vec<f64> {
    let min_energy = energies.iter().copied().fold(f64::INFINITY, f64::min);
    let weights: Vec<f64> = energies
        .iter()
        .map(|&e| (-(e - min_energy) / thermal_energy).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total).sqrt()).collect()
}

/// Interaction score between two residues: opposite-charge pairing, aromatic stacking and
/// cysteine pairing.
pub fn interaction_score(a: &ResidueFeatures, b: &ResidueFeatures) -> f64 {
    let mut score = 0.0;
    if a.charge * b.charge < 0.0 {
        score += (a.charge * b.charge).abs();
    }
    if a.aromatic && b.aromatic {
        score += 0.8;
    }
    if a.is_cysteine() && b.is_cysteine() {
        score += 1.0;
    }
    score
}

fn build_edges(features: &[ResidueFeatures], config: &GraphConfig) -> Vec<Edge> {
    let n = features.len();
    let mut edges: Vec<Edge> = (0..n.saturating_sub(1))
        .map(|i| Edge {
            i,
            j: i + 1,
            weight: 1.0,
            kind: EdgeKind::Sequential,
        })
        .collect();

    let min_sep = config.min_long_range_separation.max(2);
    for i in 0..n {
        for j in (i + min_sep)..n {
            let score = interaction_score(&features[i], &features[j]);
            if score >= config.long_range_threshold && score > 0.0 {
                edges.push(Edge {
                    i,
                    j,
                    weight: score,
                    kind: EdgeKind::LongRange,
                });
            }
        }
    }
    edges
}

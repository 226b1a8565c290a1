use crate::core::models::residue::AminoAcid;

/// Dipeptide instability weight values (Guruprasad, Reddy & Pandit, 1990).
///
/// Row is the first residue of the dipeptide, column the second, both in [`AminoAcid::index`]
/// order.
#[rustfmt::skip]
const DIWV: [[f64; AminoAcid::COUNT]; AminoAcid::COUNT] = [
    // A
    [1.0, 1.0, 1.0, -7.49, 44.94, 1.0, 1.0, 1.0, -7.49, 1.0, 1.0, 1.0, 1.0, 1.0, 20.26, 1.0, 1.0, 1.0, 1.0, 1.0],
    // R
    [1.0, 58.28, 13.34, 1.0, 1.0, 20.26, 1.0, -7.49, 20.26, 1.0, 1.0, 1.0, 1.0, 1.0, 20.26, 44.94, 1.0, 58.28, -6.54, 1.0],
    // N
    [1.0, 1.0, 1.0, 1.0, -1.88, -6.54, 1.0, -14.03, 1.0, 44.94, 1.0, 24.68, 1.0, -14.03, -1.88, 1.0, -7.49, -9.37, 1.0, 1.0],
    // D
    [1.0, -6.54, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -7.49, 1.0, -6.54, 1.0, 20.26, -14.03, 1.0, 1.0, 1.0],
    // C
    [1.0, 1.0, 1.0, 20.26, 1.0, -6.54, 1.0, 1.0, 33.6, 1.0, 20.26, 1.0, 33.6, 1.0, 20.26, 1.0, 33.6, 24.68, 1.0, -6.54],
    // Q
    [1.0, 1.0, 1.0, 20.26, -6.54, 20.26, 20.26, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -6.54, 20.26, 44.94, 1.0, 1.0, -6.54, -6.54],
    // E
    [1.0, 1.0, 1.0, 20.26, 44.94, 20.26, 33.6, 1.0, -6.54, 20.26, 1.0, 1.0, 1.0, 1.0, 20.26, 20.26, 1.0, -14.03, 1.0, 1.0],
    // G
    [-7.49, 1.0, -7.49, 1.0, 1.0, 1.0, -6.54, 13.34, 1.0, -7.49, 1.0, -7.49, 1.0, 1.0, 1.0, 1.0, -7.49, 13.34, -7.49, 1.0],
    // H
    [1.0, 1.0, 24.68, 1.0, 1.0, 1.0, 1.0, -9.37, 1.0, 44.94, 1.0, 24.68, 1.0, -9.37, -1.88, 1.0, -6.54, -1.88, 44.94, 1.0],
    // I
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 44.94, 1.0, 13.34, 1.0, 20.26, -7.49, 1.0, 1.0, -1.88, 1.0, 1.0, 1.0, 1.0, -7.49],
    // L
    [1.0, 20.26, 1.0, 1.0, 1.0, 33.6, 1.0, 1.0, 1.0, 1.0, 1.0, -7.49, 1.0, 1.0, 20.26, 1.0, 1.0, 24.68, 1.0, 1.0],
    // K
    [1.0, 33.6, 1.0, 1.0, 1.0, 24.64, 1.0, -7.49, 1.0, -7.49, -7.49, 1.0, 33.6, 1.0, -6.54, 1.0, 1.0, 1.0, 1.0, -7.49],
    // M
    [13.34, -6.54, 1.0, 1.0, 1.0, -6.54, 1.0, 1.0, 58.28, 1.0, 1.0, 1.0, -1.88, 1.0, 44.94, 44.94, -1.88, 1.0, 24.68, 1.0],
    // F
    [1.0, 1.0, 1.0, 13.34, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -14.03, 1.0, 1.0, 20.26, 1.0, 1.0, 1.0, 33.601, 1.0],
    // P
    [20.26, -6.54, 1.0, -6.54, -6.54, 20.26, 18.38, 1.0, 1.0, 1.0, 1.0, 1.0, -6.54, 20.26, 20.26, 20.26, 1.0, -1.88, 1.0, 20.26],
    // S
    [1.0, 20.26, 1.0, 1.0, 33.6, 20.26, 20.26, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 44.94, 20.26, 1.0, 1.0, 1.0, 1.0],
    // T
    [1.0, 1.0, -14.03, 1.0, 1.0, -6.54, 20.26, -7.49, 1.0, 1.0, 1.0, 1.0, 1.0, 13.34, 1.0, 1.0, 1.0, -14.03, 1.0, 1.0],
    // W
    [-14.03, 1.0, 13.34, 1.0, 1.0, 1.0, 1.0, -9.37, 24.68, 1.0, 13.34, 1.0, 24.68, 1.0, 1.0, 1.0, -14.03, 1.0, 1.0, -7.49],
    // Y
    [24.68, -15.91, 1.0, 24.68, 1.0, 1.0, -6.54, -7.49, 13.34, 1.0, 1.0, 1.0, 44.94, 1.0, 13.34, 1.0, -7.49, -9.37, 13.34, 1.0],
    // V
    [1.0, 1.0, 1.0, -14.03, 1.0, 1.0, 1.0, -7.49, 1.0, 1.0, 1.0, -1.88, 1.0, 1.0, 20.26, 1.0, -7.49, 1.0, -6.54, 1.0],
];

#[inline]
pub fn dipeptide_weight(first: AminoAcid, second: AminoAcid) -> f64 {
    DIWV[first.index()][second.index()]
}

/// Instability index `(10 / L) * sum(DIWV[x_i][x_{i+1}])`. Values above 40 predict an unstable
/// peptide.
pub fn instability_index(residues: &[AminoAcid]) -> f64 {
    if residues.len() < 2 {
        return 0.0;
    }
    let sum: f64 = residues
        .windows(2)
        .map(|pair| dipeptide_weight(pair[0], pair[1]))
        .sum();
    10.0 / residues.len() as f64 * sum
}

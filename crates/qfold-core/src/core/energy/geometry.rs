//! Coordinate-free proximity model.
//!
//! Residue separation is estimated from sequence separation and backbone region alone: each
//! residue contributes a rise along the chain that depends on its Ramachandran region, and the
//! resulting contour length is folded with a worm-like-chain end-to-end estimate.

use crate::core::models::conformation::RamachandranRegion;

pub const MIN_CA_DISTANCE: f64 = 3.8;

const BASE_PERSISTENCE: f64 = 4.0;
const SHEET_PERSISTENCE_BONUS: f64 = 6.0;

/// Axial rise per residue, in angstroms.
pub fn rise(region: RamachandranRegion) -> f64 {
    match region {
        RamachandranRegion::AlphaRight => 1.5,
        RamachandranRegion::Beta => 3.3,
        RamachandranRegion::AlphaLeft => 1.7,
        RamachandranRegion::Other => 2.9,
    }
}

/// Worm-like-chain mean end-to-end distance for contour length `contour` and persistence
/// length `persistence`, floored at the CA-CA bond length.
pub fn worm_like_chain_distance(contour: f64, persistence: f64) -> f64 {
    if contour <= 0.0 || persistence <= 0.0 {
        return MIN_CA_DISTANCE;
    }
    let ratio = persistence / contour;
    let squared = 2.0 * persistence * contour * (1.0 - ratio * (1.0 - (-contour / persistence).exp()));
    squared.max(0.0).sqrt().max(MIN_CA_DISTANCE)
}

/// Prefix sums over a region assignment, answering pairwise distance queries in O(1).
#[derive(Debug, Clone)]
pub struct ProximityModel {
    rise_prefix: Vec<f64>,
    sheet_prefix: Vec<usize>,
}

impl ProximityModel {
    pub fn new(regions: &[RamachandranRegion]) -> Self {
        let mut rise_prefix = Vec::with_capacity(regions.len() + 1);
        let mut sheet_prefix = Vec::with_capacity(regions.len() + 1);
        rise_prefix.push(0.0);
        sheet_prefix.push(0);
        for &region in regions {
            let last_rise = rise_prefix[rise_prefix.len() - 1];
            let last_sheet = sheet_prefix[sheet_prefix.len() - 1];
            rise_prefix.push(last_rise + rise(region));
            sheet_prefix.push(last_sheet + usize::from(region == RamachandranRegion::Beta));
        }
        Self {
            rise_prefix,
            sheet_prefix,
        }
    }

    /// Estimated distance between residues `i` and `j` (`i < j`). The segment covers the rises
    /// of residues `i..j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        if i == j {
            return 0.0;
        }
        let contour = self.rise_prefix[j] - self.rise_prefix[i];
        let sheet_fraction = (self.sheet_prefix[j] - self.sheet_prefix[i]) as f64 / (j - i) as f64;
        let persistence = BASE_PERSISTENCE + SHEET_PERSISTENCE_BONUS * sheet_fraction;
        worm_like_chain_distance(contour, persistence)
    }
}

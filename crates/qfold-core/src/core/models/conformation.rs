use serde::{Deserialize, Serialize};
use std::fmt;

/// Wraps an angle in degrees into the half-open interval (-180, 180].
#[inline]
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 { wrapped + 360.0 } else { wrapped }
}

#[inline]
pub fn is_valid_dihedral(angle: f64) -> bool {
    angle.is_finite() && angle > -180.0 && angle <= 180.0
}

/// Backbone dihedral pair of one residue, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DihedralPair {
    pub phi: f64,
    pub psi: f64,
}

impl DihedralPair {
    pub fn new(phi: f64, psi: f64) -> Self {
        Self { phi, psi }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_dihedral(self.phi) && is_valid_dihedral(self.psi)
    }

    pub fn region(&self) -> RamachandranRegion {
        RamachandranRegion::classify(self.phi, self.psi)
    }
}

/// A concrete backbone conformation: one dihedral pair per residue position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conformation {
    angles: Vec<DihedralPair>,
}

impl Conformation {
    pub fn new(angles: Vec<DihedralPair>) -> Self {
        Self { angles }
    }

    /// A conformation with every residue at the same dihedral pair.
    pub fn uniform(length: usize, pair: DihedralPair) -> Self {
        Self {
            angles: vec![pair; length],
        }
    }

    pub fn angles(&self) -> &[DihedralPair] {
        &self.angles
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RamachandranRegion {
    AlphaRight,
    Beta,
    AlphaLeft,
    Other,
}

impl RamachandranRegion {
    pub const ALL: [RamachandranRegion; 4] = [
        RamachandranRegion::AlphaRight,
        RamachandranRegion::Beta,
        RamachandranRegion::AlphaLeft,
        RamachandranRegion::Other,
    ];

    // Box bounds in degrees: (phi_min, phi_max, psi_min, psi_max).
    const ALPHA_RIGHT_BOX: (f64, f64, f64, f64) = (-160.0, -20.0, -120.0, 50.0);
    const ALPHA_LEFT_BOX: (f64, f64, f64, f64) = (20.0, 120.0, -20.0, 90.0);
    const BETA_PHI: (f64, f64) = (-180.0, -45.0);
    const BETA_PSI_UPPER: f64 = 90.0;
    const BETA_PSI_LOWER: f64 = -150.0;

    pub fn classify(phi: f64, psi: f64) -> Self {
        let (a_phi_lo, a_phi_hi, a_psi_lo, a_psi_hi) = Self::ALPHA_RIGHT_BOX;
        if (a_phi_lo..=a_phi_hi).contains(&phi) && (a_psi_lo..=a_psi_hi).contains(&psi) {
            return RamachandranRegion::AlphaRight;
        }
        if (Self::BETA_PHI.0..=Self::BETA_PHI.1).contains(&phi)
            && (psi >= Self::BETA_PSI_UPPER || psi <= Self::BETA_PSI_LOWER)
        {
            return RamachandranRegion::Beta;
        }
        let (l_phi_lo, l_phi_hi, l_psi_lo, l_psi_hi) = Self::ALPHA_LEFT_BOX;
        if (l_phi_lo..=l_phi_hi).contains(&phi) && (l_psi_lo..=l_psi_hi).contains(&psi) {
            return RamachandranRegion::AlphaLeft;
        }
        RamachandranRegion::Other
    }

    /// Area of the region on the (phi, psi) torus, in square degrees.
    pub fn area(self) -> f64 {
        let alpha_right = {
            let (a, b, c, d) = Self::ALPHA_RIGHT_BOX;
            (b - a) * (d - c)
        };
        let alpha_left = {
            let (a, b, c, d) = Self::ALPHA_LEFT_BOX;
            (b - a) * (d - c)
        };
        let beta = (Self::BETA_PHI.1 - Self::BETA_PHI.0)
            * ((180.0 - Self::BETA_PSI_UPPER) + (Self::BETA_PSI_LOWER + 180.0));
        match self {
            RamachandranRegion::AlphaRight => alpha_right,
            RamachandranRegion::Beta => beta,
            RamachandranRegion::AlphaLeft => alpha_left,
            RamachandranRegion::Other => TORUS_AREA - alpha_right - beta - alpha_left,
        }
    }

    /// Canonical centre of the region, if it has one.
    pub fn center(self) -> Option<DihedralPair> {
        match self {
            RamachandranRegion::AlphaRight => Some(DihedralPair::new(-63.0, -43.0)),
            RamachandranRegion::Beta => Some(DihedralPair::new(-120.0, 130.0)),
            RamachandranRegion::AlphaLeft => Some(DihedralPair::new(57.0, 47.0)),
            RamachandranRegion::Other => None,
        }
    }

    pub fn secondary_structure(self) -> SecondaryStructure {
        match self {
            RamachandranRegion::AlphaRight => SecondaryStructure::Helix,
            RamachandranRegion::Beta => SecondaryStructure::Sheet,
            RamachandranRegion::AlphaLeft | RamachandranRegion::Other => SecondaryStructure::Coil,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

pub const TORUS_AREA: f64 = 360.0 * 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondaryStructure {
    Helix,
    Sheet,
    Coil,
}

impl SecondaryStructure {
    pub const ALL: [SecondaryStructure; 3] = [
        SecondaryStructure::Helix,
        SecondaryStructure::Sheet,
        SecondaryStructure::Coil,
    ];

    pub fn symbol(self) -> char {
        match self {
            SecondaryStructure::Helix => 'H',
            SecondaryStructure::Sheet => 'E',
            SecondaryStructure::Coil => 'C',
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SecondaryStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SecondaryStructureFractions {
    pub helix: f64,
    pub sheet: f64,
    pub coil: f64,
}

impl SecondaryStructureFractions {
    pub fn from_labels(labels: &[SecondaryStructure]) -> Self {
        if labels.is_empty() {
            return Self::default();
        }
        let mut counts = [0usize; 3];
        for label in labels {
            counts[label.index()] += 1;
        }
        let n = labels.len() as f64;
        Self {
            helix: counts[0] as f64 / n,
            sheet: counts[1] as f64 / n,
            coil: counts[2] as f64 / n,
        }
    }

    pub fn get(&self, ss: SecondaryStructure) -> f64 {
        match ss {
            SecondaryStructure::Helix => self.helix,
            SecondaryStructure::Sheet => self.sheet,
            SecondaryStructure::Coil => self.coil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn wrap_degrees_maps_into_half_open_interval() {
        assert!(f64_approx_equal(wrap_degrees(-180.0), 180.0));
        assert!(f64_approx_equal(wrap_degrees(180.0), 180.0));
        assert!(f64_approx_equal(wrap_degrees(190.0), -170.0));
        assert!(f64_approx_equal(wrap_degrees(-540.0), 180.0));
        assert!(f64_approx_equal(wrap_degrees(45.0), 45.0));
    }

    #[test]
    fn is_valid_dihedral_excludes_minus_180_and_non_finite() {
        assert!(!is_valid_dihedral(-180.0));
        assert!(is_valid_dihedral(180.0));
        assert!(!is_valid_dihedral(f64::NAN));
        assert!(!is_valid_dihedral(200.0));
    }

    #[test]
    fn classify_recognizes_canonical_region_centres() {
        for region in [
            RamachandranRegion::AlphaRight,
            RamachandranRegion::Beta,
            RamachandranRegion::AlphaLeft,
        ] {
            let c = region.center().unwrap();
            assert_eq!(RamachandranRegion::classify(c.phi, c.psi), region);
        }
        assert_eq!(
            RamachandranRegion::classify(60.0, -120.0),
            RamachandranRegion::Other
        );
    }

    #[test]
    fn beta_region_wraps_across_psi_boundary() {
        assert_eq!(
            RamachandranRegion::classify(-120.0, -170.0),
            RamachandranRegion::Beta
        );
        assert_eq!(
            RamachandranRegion::classify(-120.0, 175.0),
            RamachandranRegion::Beta
        );
    }

    #[test]
    fn region_areas_tile_the_torus() {
        let total: f64 = RamachandranRegion::ALL.iter().map(|r| r.area()).sum();
        assert!(f64_approx_equal(total, TORUS_AREA));
        assert!(RamachandranRegion::Other.area() > 0.0);
    }

    #[test]
    fn secondary_structure_follows_region() {
        assert_eq!(
            RamachandranRegion::AlphaRight.secondary_structure(),
            SecondaryStructure::Helix
        );
        assert_eq!(
            RamachandranRegion::Beta.secondary_structure(),
            SecondaryStructure::Sheet
        );
        assert_eq!(
            RamachandranRegion::AlphaLeft.secondary_structure(),
            SecondaryStructure::Coil
        );
    }

    #[test]
    fn fractions_from_labels_sum_to_one() {
        use SecondaryStructure::*;
        let f = SecondaryStructureFractions::from_labels(&[Helix, Helix, Sheet, Coil]);
        assert!(f64_approx_equal(f.helix, 0.5));
        assert!(f64_approx_equal(f.sheet, 0.25));
        assert!(f64_approx_equal(f.coil, 0.25));
        assert!(f64_approx_equal(f.helix + f.sheet + f.coil, 1.0));
    }
}

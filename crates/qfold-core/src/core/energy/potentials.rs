use std::f64::consts::PI;

const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < 1e-6 {
        return q1.signum() * q2.signum() * 1e10;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist)
}

/// Coulomb interaction in a continuum dielectric, damped by ionic screening with Debye length
/// `screening_length`.
#[inline]
pub fn debye_huckel(dist: f64, q1: f64, q2: f64, dielectric: f64, screening_length: f64) -> f64 {
    coulomb(dist, q1, q2, dielectric) * (-dist / screening_length).exp()
}

/// Smooth cutoff: 1 below `switch_on`, 0 beyond `cutoff`, cosine taper in between.
#[inline]
pub fn cosine_switch(dist: f64, switch_on: f64, cutoff: f64) -> f64 {
    if dist <= switch_on {
        1.0
    } else if dist >= cutoff {
        0.0
    } else {
        let x = (dist - switch_on) / (cutoff - switch_on);
        0.5 * (1.0 + (PI * x).cos())
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
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let energy = lennard_jones_12_6(4.6, 4.6, 0.05);
        assert!(f64_approx_equal(energy, -0.05));
    }

    #[test]
    fn lennard_jones_at_very_small_distance_returns_large_positive_energy() {
        let energy = lennard_jones_12_6(1e-7, 4.6, 0.05);
        assert!(f64_approx_equal(energy, 1e10));
    }

    #[test]
    fn coulomb_calculates_attractive_force_correctly() {
        let energy = coulomb(2.0, 1.0, -1.0, 1.0);
        assert!(f64_approx_equal(energy, -COULOMB_CONSTANT / 2.0));
    }

    #[test]
    fn coulomb_at_very_small_distance_returns_large_energy_with_correct_sign() {
        assert!(f64_approx_equal(coulomb(1e-7, 1.0, 1.0, 1.0), 1e10));
        assert!(f64_approx_equal(coulomb(1e-7, -1.0, 1.0, 1.0), -1e10));
    }

    #[test]
    fn debye_screening_damps_coulomb_by_one_over_e_per_length() {
        let unscreened = coulomb(7.85, 1.0, -1.0, 80.0);
        let screened = debye_huckel(7.85, 1.0, -1.0, 80.0, 7.85);
        assert!(f64_approx_equal(screened, unscreened / std::f64::consts::E));
        assert!(debye_huckel(20.0, 1.0, 1.0, 80.0, 7.85) < debye_huckel(5.0, 1.0, 1.0, 80.0, 7.85));
    }

    #[test]
    fn cosine_switch_is_one_inside_zero_outside_and_half_at_midpoint() {
        assert_eq!(cosine_switch(5.0, 6.5, 10.0), 1.0);
        assert_eq!(cosine_switch(10.0, 6.5, 10.0), 0.0);
        assert_eq!(cosine_switch(12.0, 6.5, 10.0), 0.0);
        assert!(f64_approx_equal(cosine_switch(8.25, 6.5, 10.0), 0.5));
    }
}

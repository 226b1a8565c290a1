use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Energy decomposition of one conformation, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyTerm {
    pub backbone: f64,
    pub steric: f64,
    pub hydrophobic: f64,
    pub electrostatic: f64,
    /// Aromatic stacking and disulfide contacts.
    pub special: f64,
    /// Per-residue hydration of charged side chains.
    pub solvation: f64,
}

impl EnergyTerm {
    pub fn new(
        backbone: f64,
        steric: f64,
        hydrophobic: f64,
        electrostatic: f64,
        special: f64,
        solvation: f64,
    ) -> Self {
        Self {
            backbone,
            steric,
            hydrophobic,
            electrostatic,
            special,
            solvation,
        }
    }

    pub fn backbone(energy: f64) -> Self {
        Self {
            backbone: energy,
            ..Self::default()
        }
    }

    pub fn solvation(energy: f64) -> Self {
        Self {
            solvation: energy,
            ..Self::default()
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.backbone
            + self.steric
            + self.hydrophobic
            + self.electrostatic
            + self.special
            + self.solvation
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            backbone: self.backbone + rhs.backbone,
            steric: self.steric + rhs.steric,
            hydrophobic: self.hydrophobic + rhs.hydrophobic,
            electrostatic: self.electrostatic + rhs.electrostatic,
            special: self.special + rhs.special,
            solvation: self.solvation + rhs.solvation,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.backbone += rhs.backbone;
        self.steric += rhs.steric;
        self.hydrophobic += rhs.hydrophobic;
        self.electrostatic += rhs.electrostatic;
        self.special += rhs.special;
        self.solvation += rhs.solvation;
    }
}

impl Sum for EnergyTerm {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, term| acc + term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_returns_sum_of_all_terms() {
        let term = EnergyTerm::new(1.5, -2.0, 0.5, 1.0, -1.0, 0.0);
        assert_eq!(term.total(), 0.0);
    }

    #[test]
    fn add_sums_each_field_correctly() {
        let a = EnergyTerm::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let b = EnergyTerm::new(6.0, 5.0, 4.0, 3.0, 2.0, 1.0);
        assert_eq!(a + b, EnergyTerm::new(7.0, 7.0, 7.0, 7.0, 7.0, 7.0));
    }

    #[test]
    fn add_assign_with_zero_does_not_change_values() {
        let mut a = EnergyTerm::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        a += EnergyTerm::default();
        assert_eq!(a, EnergyTerm::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
    }

    #[test]
    fn sum_over_iterator_accumulates_in_order() {
        let terms = vec![
            EnergyTerm::backbone(-1.0),
            EnergyTerm::new(0.0, 0.5, -0.25, 0.0, 0.0, 0.0),
            EnergyTerm::new(0.0, 0.0, 0.0, -2.0, -0.4, 0.0),
            EnergyTerm::solvation(2.0),
        ];
        let total: EnergyTerm = terms.into_iter().sum();
        assert_eq!(total, EnergyTerm::new(-1.0, 0.5, -0.25, -2.0, -0.4, 2.0));
    }
}

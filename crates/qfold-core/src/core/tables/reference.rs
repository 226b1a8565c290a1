use super::properties::{helix_propensity, sheet_propensity, turn_propensity};
use crate::core::models::conformation::{RamachandranRegion, SecondaryStructureFractions};
use crate::core::models::residue::AminoAcid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CLASS_TAG: &str = "generic";

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid reference data in '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

/// Relative population of the four Ramachandran regions for one residue type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegionPopulations {
    pub alpha_right: f64,
    pub beta: f64,
    pub alpha_left: f64,
    pub other: f64,
}

impl RegionPopulations {
    /// Derives populations from Chou-Fasman propensities. Gly, Asn and Asp favour the left-handed
    /// region, Pro disfavours it.
    pub fn from_propensities(aa: AminoAcid) -> Self {
        let left_handed_affinity = match aa {
            AminoAcid::Glycine => 6.0,
            AminoAcid::Asparagine | AminoAcid::AsparticAcid => 2.5,
            AminoAcid::Proline => 0.2,
            _ => 1.0,
        };
        let raw = Self {
            alpha_right: 0.42 * helix_propensity(aa),
            beta: 0.38 * sheet_propensity(aa),
            alpha_left: 0.04 * left_handed_affinity,
            other: 0.16 * turn_propensity(aa),
        };
        // All four raw weights are strictly positive, so normalization cannot fail.
        raw.normalized().unwrap_or(raw)
    }

    pub fn get(&self, region: RamachandranRegion) -> f64 {
        match region {
            RamachandranRegion::AlphaRight => self.alpha_right,
            RamachandranRegion::Beta => self.beta,
            RamachandranRegion::AlphaLeft => self.alpha_left,
            RamachandranRegion::Other => self.other,
        }
    }

    /// Rescales to sum to one. `None` when any entry is negative or non-finite, or all are zero.
    pub fn normalized(self) -> Option<Self> {
        let values = [self.alpha_right, self.beta, self.alpha_left, self.other];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return None;
        }
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(Self {
            alpha_right: self.alpha_right / total,
            beta: self.beta / total,
            alpha_left: self.alpha_left / total,
            other: self.other / total,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FractionRange {
    pub min: f64,
    pub max: f64,
}

impl FractionRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Distance from `value` to the closed interval; zero inside it.
    pub fn distance(&self, value: f64) -> f64 {
        (self.min - value).max(value - self.max).max(0.0)
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && 0.0 <= self.min
            && self.min <= self.max
            && self.max <= 1.0
    }
}

/// Experimentally observed secondary-structure composition ranges for one sequence class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassReference {
    pub helix: FractionRange,
    pub sheet: FractionRange,
    pub coil: FractionRange,
}

impl ClassReference {
    pub fn distance(&self, fractions: &SecondaryStructureFractions) -> f64 {
        self.helix.distance(fractions.helix)
            + self.sheet.distance(fractions.sheet)
            + self.coil.distance(fractions.coil)
    }

    /// Range midpoints rescaled into a composition.
    pub fn target_composition(&self) -> SecondaryStructureFractions {
        let (h, s, c) = (
            self.helix.midpoint(),
            self.sheet.midpoint(),
            self.coil.midpoint(),
        );
        let total = h + s + c;
        if total <= 0.0 {
            return SecondaryStructureFractions {
                helix: 1.0 / 3.0,
                sheet: 1.0 / 3.0,
                coil: 1.0 / 3.0,
            };
        }
        SecondaryStructureFractions {
            helix: h / total,
            sheet: s / total,
            coil: c / total,
        }
    }

    fn is_valid(&self) -> bool {
        self.helix.is_valid() && self.sheet.is_valid() && self.coil.is_valid()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrelationThresholds {
    pub strong: f64,
    pub weak: f64,
}

impl Default for CorrelationThresholds {
    fn default() -> Self {
        Self {
            strong: 0.75,
            weak: 0.35,
        }
    }
}

impl CorrelationThresholds {
    fn is_valid(&self) -> bool {
        0.0 < self.weak && self.weak <= self.strong && self.strong <= 1.0
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ReferenceFile {
    #[serde(default)]
    classes: BTreeMap<String, ClassReference>,
    correlation: Option<CorrelationThresholds>,
    #[serde(default)]
    ramachandran: BTreeMap<String, RegionPopulations>,
}

/// Immutable reference data shared by every pipeline stage.
///
/// Built once at startup (see [`ReferenceTables::builtin`] and [`ReferenceTables::load`]) and
/// passed by reference; it holds no interior mutability and is safe to share across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTables {
    ramachandran: [RegionPopulations; AminoAcid::COUNT],
    classes: BTreeMap<String, ClassReference>,
    correlation: CorrelationThresholds,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceTables {
    pub fn builtin() -> Self {
        let ramachandran = AminoAcid::ALL.map(RegionPopulations::from_propensities);

        let class = |h: (f64, f64), s: (f64, f64), c: (f64, f64)| ClassReference {
            helix: FractionRange::new(h.0, h.1),
            sheet: FractionRange::new(s.0, s.1),
            coil: FractionRange::new(c.0, c.1),
        };
        let classes = BTreeMap::from([
            (
                DEFAULT_CLASS_TAG.to_string(),
                class((0.0, 0.75), (0.0, 0.6), (0.15, 0.9)),
            ),
            (
                "amyloid".to_string(),
                class((0.0, 0.35), (0.25, 0.75), (0.15, 0.65)),
            ),
            (
                "alpha-helical".to_string(),
                class((0.4, 0.95), (0.0, 0.25), (0.05, 0.5)),
            ),
            (
                "beta-rich".to_string(),
                class((0.0, 0.25), (0.35, 0.8), (0.15, 0.6)),
            ),
            (
                "intrinsically-disordered".to_string(),
                class((0.0, 0.3), (0.0, 0.2), (0.5, 1.0)),
            ),
        ]);

        Self {
            ramachandran,
            classes,
            correlation: CorrelationThresholds::default(),
        }
    }

    /// Loads a TOML override file on top of the built-in tables.
    pub fn load(path: &Path) -> Result<Self, TableLoadError> {
        let path_str = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| TableLoadError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path_str)
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, TableLoadError> {
        let file: ReferenceFile = toml::from_str(content).map_err(|e| TableLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        let invalid = |reason: String| TableLoadError::Invalid {
            path: origin.to_string(),
            reason,
        };

        let mut tables = Self::builtin();

        for (code, populations) in file.ramachandran {
            let aa: AminoAcid = code
                .parse()
                .map_err(|_| invalid(format!("unknown residue '{code}' in [ramachandran]")))?;
            tables.ramachandran[aa.index()] = populations.normalized().ok_or_else(|| {
                invalid(format!(
                    "populations for '{code}' must be non-negative and not all zero"
                ))
            })?;
        }

        for (tag, reference) in file.classes {
            if !reference.is_valid() {
                return Err(invalid(format!(
                    "class '{tag}' has a range outside [0, 1] or with min > max"
                )));
            }
            tables.classes.insert(normalize_tag(&tag), reference);
        }

        if let Some(thresholds) = file.correlation {
            if !thresholds.is_valid() {
                return Err(invalid(
                    "correlation thresholds must satisfy 0 < weak <= strong <= 1".to_string(),
                ));
            }
            tables.correlation = thresholds;
        }

        Ok(tables)
    }

    #[inline]
    pub fn populations(&self, aa: AminoAcid) -> &RegionPopulations {
        &self.ramachandran[aa.index()]
    }

    /// Resolves a class tag, falling back to the generic class when the tag is absent or
    /// unknown. Returns the tag actually used alongside its reference.
    pub fn class_reference(&self, tag: Option<&str>) -> (&str, &ClassReference) {
        if let Some(tag) = tag {
            if let Some((key, reference)) = self.classes.get_key_value(&normalize_tag(tag)) {
                return (key.as_str(), reference);
            }
        }
        match self.classes.get_key_value(DEFAULT_CLASS_TAG) {
            Some((key, reference)) => (key.as_str(), reference),
            None => (DEFAULT_CLASS_TAG, &GENERIC_FALLBACK),
        }
    }

    pub fn class_tags(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    #[inline]
    pub fn correlation_thresholds(&self) -> CorrelationThresholds {
        self.correlation
    }
}

// Overrides may only add or replace classes, so the generic entry is always present; this
// constant only exists to keep the lookup total.
static GENERIC_FALLBACK: ClassReference = ClassReference {
    helix: FractionRange::new(0.0, 0.75),
    sheet: FractionRange::new(0.0, 0.6),
    coil: FractionRange::new(0.15, 0.9),
};

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace([' ', '_'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn builtin_populations_are_normalized_for_every_residue() {
        let tables = ReferenceTables::builtin();
        for aa in AminoAcid::ALL {
            let p = tables.populations(aa);
            let total: f64 = RamachandranRegion::ALL.iter().map(|&r| p.get(r)).sum();
            assert!(f64_approx_equal(total, 1.0), "{aa} sums to {total}");
        }
    }

    #[test]
    fn glycine_favours_left_handed_region_more_than_proline() {
        let tables = ReferenceTables::builtin();
        let gly = tables.populations(AminoAcid::Glycine).alpha_left;
        let pro = tables.populations(AminoAcid::Proline).alpha_left;
        let ala = tables.populations(AminoAcid::Alanine).alpha_left;
        assert!(gly > ala && ala > pro);
    }

    #[test]
    fn helix_formers_prefer_alpha_right_over_beta() {
        let tables = ReferenceTables::builtin();
        let glu = tables.populations(AminoAcid::GlutamicAcid);
        assert!(glu.alpha_right > glu.beta);
        let val = tables.populations(AminoAcid::Valine);
        assert!(val.beta > val.alpha_right);
    }

    #[test]
    fn fraction_range_distance_is_zero_inside_and_linear_outside() {
        let range = FractionRange::new(0.2, 0.5);
        assert_eq!(range.distance(0.3), 0.0);
        assert!(f64_approx_equal(range.distance(0.1), 0.1));
        assert!(f64_approx_equal(range.distance(0.7), 0.2));
    }

    #[test]
    fn unknown_or_missing_class_tag_falls_back_to_generic() {
        let tables = ReferenceTables::builtin();
        assert_eq!(tables.class_reference(None).0, DEFAULT_CLASS_TAG);
        assert_eq!(tables.class_reference(Some("prion-like")).0, DEFAULT_CLASS_TAG);
        assert_eq!(tables.class_reference(Some(" Alpha_Helical ")).0, "alpha-helical");
    }

    #[test]
    fn target_composition_sums_to_one() {
        let tables = ReferenceTables::builtin();
        for tag in tables.class_tags() {
            let t = tables.class_reference(Some(tag)).1.target_composition();
            assert!(f64_approx_equal(t.helix + t.sheet + t.coil, 1.0));
        }
    }

    #[test]
    fn load_applies_overrides_on_top_of_builtin_tables() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("reference.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            r#"
            [correlation]
            strong = 0.8
            weak = 0.4

            [classes.coiled-coil]
            helix = {{ min = 0.6, max = 1.0 }}
            sheet = {{ min = 0.0, max = 0.1 }}
            coil = {{ min = 0.0, max = 0.4 }}

            [ramachandran.G]
            alpha-right = 1.0
            beta = 1.0
            alpha-left = 1.0
            other = 1.0
            "#
        )
        .unwrap();

        let tables = ReferenceTables::load(&file_path).unwrap();
        assert_eq!(
            tables.correlation_thresholds(),
            CorrelationThresholds {
                strong: 0.8,
                weak: 0.4
            }
        );
        assert_eq!(tables.class_reference(Some("coiled-coil")).0, "coiled-coil");
        assert!(tables.class_reference(Some("amyloid")).0 == "amyloid");
        assert!(f64_approx_equal(
            tables.populations(AminoAcid::Glycine).alpha_left,
            0.25
        ));
    }

    #[test]
    fn load_fails_for_missing_file() {
        let result = ReferenceTables::load(Path::new("/non/existent/reference.toml"));
        assert!(matches!(result, Err(TableLoadError::Io { .. })));
    }

    #[test]
    fn load_rejects_unknown_residue_and_bad_thresholds() {
        let bad_residue = "[ramachandran.X]\nalpha-right = 1.0\nbeta = 0.0\nalpha-left = 0.0\nother = 0.0\n";
        assert!(matches!(
            ReferenceTables::from_toml_str(bad_residue, "inline"),
            Err(TableLoadError::Invalid { .. })
        ));

        let bad_thresholds = "[correlation]\nstrong = 0.3\nweak = 0.5\n";
        assert!(matches!(
            ReferenceTables::from_toml_str(bad_thresholds, "inline"),
            Err(TableLoadError::Invalid { .. })
        ));

        assert!(matches!(
            ReferenceTables::from_toml_str("not = [valid", "inline"),
            Err(TableLoadError::Toml { .. })
        ));
    }
}

use super::operators::{
    ConstraintOperator, EnergyBias, EquilibriumBias, ExperimentalBias, StabilityBias,
};
use super::validation::ValidationParams;
use crate::core::energy::evaluator::EnergyParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_BASIS_SIDE: usize = 2;
pub const MAX_BASIS_SIDE: usize = 72;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// How node amplitudes are seeded before evolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialAmplitudes {
    Uniform,
    #[default]
    FeatureWeighted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphConfig {
    /// Minimum interaction score for a long-range edge.
    pub long_range_threshold: f64,
    /// Minimum sequence separation `|i - j|` for a long-range edge.
    pub min_long_range_separation: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            long_range_threshold: 0.5,
            min_long_range_separation: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionConfig {
    pub max_iterations: usize,
    pub convergence_threshold: f64,
    /// Applied in order on every iteration.
    pub operators: Vec<ConstraintOperator>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 40,
            convergence_threshold: 1e-6,
            operators: vec![
                ConstraintOperator::EnergyBias(EnergyBias { weight: 0.5 }),
                ConstraintOperator::EquilibriumBias(EquilibriumBias { weight: 0.35 }),
                ConstraintOperator::StabilityBias(StabilityBias { weight: 0.25 }),
                ConstraintOperator::ExperimentalBias(ExperimentalBias { weight: 0.2 }),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    pub basis_size: usize,
    pub temperature: f64,
    pub sample_count: usize,
    pub replicate_count: usize,
    pub rigor_threshold: f64,

    pub seed: Option<u64>,
    pub class_tag: Option<String>,
    pub initial_amplitudes: InitialAmplitudes,
    pub graph: GraphConfig,
    pub evolution: EvolutionConfig,
    pub energy: EnergyParams,
    pub validation: ValidationParams,
}

impl DiscoveryConfig {
    /// Number of bins along each dihedral axis.
    pub fn basis_side(&self) -> usize {
        perfect_square_root(self.basis_size).unwrap_or(0)
    }

    /// Range checks on every option except the sample counts, which an attempt reports as
    /// `EngineError::InsufficientSamples`. Run by the builder and again at the start of every
    /// attempt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match perfect_square_root(self.basis_size) {
            Some(side) if (MIN_BASIS_SIDE..=MAX_BASIS_SIDE).contains(&side) => {}
            _ => {
                return Err(invalid(
                    "basis_size",
                    format!(
                        "{} is not a perfect square n*n with n in [{MIN_BASIS_SIDE}, {MAX_BASIS_SIDE}]",
                        self.basis_size
                    ),
                ));
            }
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(invalid(
                "temperature",
                format!("{} K is not a positive finite temperature", self.temperature),
            ));
        }
        if !(0.0..=1.0).contains(&self.rigor_threshold) {
            return Err(invalid(
                "rigor_threshold",
                format!("{} is outside [0, 1]", self.rigor_threshold),
            ));
        }
        if !self.evolution.convergence_threshold.is_finite()
            || self.evolution.convergence_threshold < 0.0
        {
            return Err(invalid(
                "convergence_threshold",
                "must be a non-negative finite number",
            ));
        }
        self.validation
            .validate()
            .map_err(|reason| invalid("validation", reason))?;
        Ok(())
    }
}

fn perfect_square_root(n: usize) -> Option<usize> {
    let root = (n as f64).sqrt().round() as usize;
    (root * root == n).then_some(root)
}

#[derive(Default)]
pub struct DiscoveryConfigBuilder {
    basis_size: Option<usize>,
    temperature: Option<f64>,
    sample_count: Option<usize>,
    replicate_count: Option<usize>,
    rigor_threshold: Option<f64>,
    seed: Option<u64>,
    class_tag: Option<String>,
    initial_amplitudes: Option<InitialAmplitudes>,
    graph: Option<GraphConfig>,
    evolution: Option<EvolutionConfig>,
    energy: Option<EnergyParams>,
    validation: Option<ValidationParams>,
}

impl DiscoveryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn basis_size(mut self, size: usize) -> Self {
        self.basis_size = Some(size);
        self
    }
    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn sample_count(mut self, count: usize) -> Self {
        self.sample_count = Some(count);
        self
    }
    pub fn replicate_count(mut self, count: usize) -> Self {
        self.replicate_count = Some(count);
        self
    }
    pub fn rigor_threshold(mut self, threshold: f64) -> Self {
        self.rigor_threshold = Some(threshold);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn class_tag(mut self, tag: impl Into<String>) -> Self {
        self.class_tag = Some(tag.into());
        self
    }
    pub fn initial_amplitudes(mut self, init: InitialAmplitudes) -> Self {
        self.initial_amplitudes = Some(init);
        self
    }
    pub fn graph(mut self, graph: GraphConfig) -> Self {
        self.graph = Some(graph);
        self
    }
    pub fn evolution(mut self, evolution: EvolutionConfig) -> Self {
        self.evolution = Some(evolution);
        self
    }
    pub fn energy(mut self, energy: EnergyParams) -> Self {
        self.energy = Some(energy);
        self
    }
    pub fn validation(mut self, validation: ValidationParams) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn build(self) -> Result<DiscoveryConfig, ConfigError> {
        let config = DiscoveryConfig {
            basis_size: self
                .basis_size
                .ok_or(ConfigError::MissingParameter("basis_size"))?,
            temperature: self
                .temperature
                .ok_or(ConfigError::MissingParameter("temperature"))?,
            sample_count: self
                .sample_count
                .ok_or(ConfigError::MissingParameter("sample_count"))?,
            replicate_count: self
                .replicate_count
                .ok_or(ConfigError::MissingParameter("replicate_count"))?,
            rigor_threshold: self
                .rigor_threshold
                .ok_or(ConfigError::MissingParameter("rigor_threshold"))?,
            seed: self.seed,
            class_tag: self.class_tag,
            initial_amplitudes: self.initial_amplitudes.unwrap_or_default(),
            graph: self.graph.unwrap_or_default(),
            evolution: self.evolution.unwrap_or_default(),
            energy: self.energy.unwrap_or_default(),
            validation: self.validation.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_builder() -> DiscoveryConfigBuilder {
        DiscoveryConfigBuilder::new()
            .basis_size(144)
            .temperature(300.0)
            .sample_count(50)
            .replicate_count(20)
            .rigor_threshold(0.7)
    }

    #[test]
    fn build_succeeds_with_required_parameters_and_fills_defaults() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.basis_side(), 12);
        assert_eq!(config.seed, None);
        assert_eq!(config.initial_amplitudes, InitialAmplitudes::FeatureWeighted);
        assert_eq!(config.evolution.operators.len(), 4);
    }

    #[test]
    fn build_fails_if_required_parameter_is_missing() {
        let result = DiscoveryConfigBuilder::new()
            .basis_size(144)
            .temperature(300.0)
            .sample_count(50)
            .replicate_count(20)
            .build();
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingParameter("rigor_threshold")
        );
    }

    #[test]
    fn basis_size_must_be_a_perfect_square_within_bounds() {
        for bad in [0, 1, 4 * 73 * 73, 150] {
            let result = complete_builder().basis_size(bad).build();
            assert!(
                matches!(
                    result,
                    Err(ConfigError::InvalidParameter {
                        parameter: "basis_size",
                        ..
                    })
                ),
                "basis size {bad} was accepted"
            );
        }
        assert!(complete_builder().basis_size(4).build().is_ok());
        assert!(complete_builder().basis_size(72 * 72).build().is_ok());
    }

    #[test]
    fn temperature_and_threshold_are_range_checked() {
        assert!(complete_builder().temperature(0.0).build().is_err());
        assert!(complete_builder().temperature(f64::NAN).build().is_err());
        assert!(complete_builder().rigor_threshold(1.2).build().is_err());
        assert!(complete_builder().rigor_threshold(0.0).build().is_ok());
    }

    #[test]
    fn mutated_config_fails_revalidation() {
        let mut config = complete_builder().build().unwrap();
        assert!(config.validate().is_ok());
        config.basis_size = 150;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                parameter: "basis_size",
                ..
            })
        ));
        config.basis_size = 144;
        config.temperature = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                parameter: "temperature",
                ..
            })
        ));
    }

    #[test]
    fn sample_counts_are_not_validated_by_the_builder() {
        let config = complete_builder().sample_count(0).build().unwrap();
        assert_eq!(config.sample_count, 0);
    }
}

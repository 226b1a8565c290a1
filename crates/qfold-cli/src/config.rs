use crate::cli::{DiscoverArgs, MAX_SEED};
use crate::error::{CliError, Result};
use qfold::core::energy::evaluator::EnergyParams;
use qfold::core::tables::ReferenceTables;
use qfold::engine::config::{
    self as core_config, DiscoveryConfigBuilder, EvolutionConfig, GraphConfig, InitialAmplitudes,
};
use qfold::engine::operators::ConstraintOperator;
use qfold::engine::validation::ValidationParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_BASIS_SIZE: usize = 144;
pub const DEFAULT_TEMPERATURE: f64 = 300.0;
pub const DEFAULT_SAMPLE_COUNT: usize = 64;
pub const DEFAULT_REPLICATE_COUNT: usize = 16;
pub const DEFAULT_RIGOR_THRESHOLD: f64 = 0.7;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDiscoverySection {
    basis_size: Option<usize>,
    temperature: Option<f64>,
    sample_count: Option<usize>,
    replicate_count: Option<usize>,
    rigor_threshold: Option<f64>,
    seed: Option<u64>,
    class_tag: Option<String>,
    initial_amplitudes: Option<InitialAmplitudes>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialEvolutionSection {
    max_iterations: Option<usize>,
    convergence_threshold: Option<f64>,
    operators: Option<Vec<ConstraintOperator>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialGraphSection {
    long_range_threshold: Option<f64>,
    min_long_range_separation: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialReferenceSection {
    /// TOML file overriding the built-in reference tables.
    tables: Option<PathBuf>,
}

/// The configuration file as written by the user; every section is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialDiscoveryConfig {
    discovery: Option<PartialDiscoverySection>,
    evolution: Option<PartialEvolutionSection>,
    graph: Option<PartialGraphSection>,
    energy: Option<EnergyParams>,
    validation: Option<ValidationParams>,
    reference: Option<PartialReferenceSection>,
    /// Directory of the file, against which relative table paths resolve.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl PartialDiscoveryConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn from_optional_file(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    pub fn energy_params(&self) -> EnergyParams {
        self.energy.unwrap_or_default()
    }

    /// The built-in tables, or the override file named in `[reference]`.
    pub fn load_tables(&self) -> Result<ReferenceTables> {
        let Some(tables) = self.reference.as_ref().and_then(|r| r.tables.as_ref()) else {
            return Ok(ReferenceTables::builtin());
        };
        let path = match &self.base_dir {
            Some(base) if tables.is_relative() => base.join(tables),
            _ => tables.clone(),
        };
        debug!("Loading reference tables from {:?}", path);
        ReferenceTables::load(&path).map_err(|e| CliError::Core(e.into()))
    }

    /// Resolves the final core configuration. Precedence: dedicated flags, then `-S` settings,
    /// then the file, then built-in defaults.
    pub fn merge_with_cli(mut self, args: &DiscoverArgs) -> Result<core_config::DiscoveryConfig> {
        self.apply_set_values(&args.set_values)?;

        let discovery = self.discovery.take().unwrap_or_default();
        let evolution = Self::merge_evolution(self.evolution.take());
        let graph = Self::merge_graph(self.graph.take());

        let mut builder = DiscoveryConfigBuilder::new()
            .basis_size(
                args.basis_size
                    .or(discovery.basis_size)
                    .unwrap_or(DEFAULT_BASIS_SIZE),
            )
            .temperature(
                args.temperature
                    .or(discovery.temperature)
                    .unwrap_or(DEFAULT_TEMPERATURE),
            )
            .sample_count(
                args.sample_count
                    .or(discovery.sample_count)
                    .unwrap_or(DEFAULT_SAMPLE_COUNT),
            )
            .replicate_count(
                args.replicate_count
                    .or(discovery.replicate_count)
                    .unwrap_or(DEFAULT_REPLICATE_COUNT),
            )
            .rigor_threshold(
                args.rigor_threshold
                    .or(discovery.rigor_threshold)
                    .unwrap_or(DEFAULT_RIGOR_THRESHOLD),
            )
            .initial_amplitudes(discovery.initial_amplitudes.unwrap_or_default())
            .evolution(evolution)
            .graph(graph)
            .energy(self.energy.unwrap_or_default())
            .validation(self.validation.take().unwrap_or_default());

        if let Some(seed) = args.seed.or(discovery.seed) {
            if seed > MAX_SEED {
                return Err(CliError::Config(format!(
                    "seed {seed} exceeds the largest storable seed {MAX_SEED}"
                )));
            }
            builder = builder.seed(seed);
        }
        if let Some(tag) = args.class_tag.clone().or(discovery.class_tag) {
            builder = builder.class_tag(tag);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_evolution(partial: Option<PartialEvolutionSection>) -> EvolutionConfig {
        let partial = partial.unwrap_or_default();
        let defaults = EvolutionConfig::default();
        EvolutionConfig {
            max_iterations: partial.max_iterations.unwrap_or(defaults.max_iterations),
            convergence_threshold: partial
                .convergence_threshold
                .unwrap_or(defaults.convergence_threshold),
            operators: partial.operators.unwrap_or(defaults.operators),
        }
    }

    fn merge_graph(partial: Option<PartialGraphSection>) -> GraphConfig {
        let partial = partial.unwrap_or_default();
        let defaults = GraphConfig::default();
        GraphConfig {
            long_range_threshold: partial
                .long_range_threshold
                .unwrap_or(defaults.long_range_threshold),
            min_long_range_separation: partial
                .min_long_range_separation
                .unwrap_or(defaults.min_long_range_separation),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "discovery.basis-size" => {
                    self.discovery.get_or_insert_with(Default::default).basis_size =
                        Some(parse_value(key, value)?);
                }
                "discovery.temperature" => {
                    self.discovery.get_or_insert_with(Default::default).temperature =
                        Some(parse_value(key, value)?);
                }
                "discovery.sample-count" => {
                    self.discovery.get_or_insert_with(Default::default).sample_count =
                        Some(parse_value(key, value)?);
                }
                "discovery.replicate-count" => {
                    self.discovery.get_or_insert_with(Default::default).replicate_count =
                        Some(parse_value(key, value)?);
                }
                "discovery.rigor-threshold" => {
                    self.discovery.get_or_insert_with(Default::default).rigor_threshold =
                        Some(parse_value(key, value)?);
                }
                "discovery.seed" => {
                    self.discovery.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value)?);
                }
                "discovery.class-tag" => {
                    self.discovery.get_or_insert_with(Default::default).class_tag =
                        Some(value.to_string());
                }
                "evolution.max-iterations" => {
                    self.evolution
                        .get_or_insert_with(Default::default)
                        .max_iterations = Some(parse_value(key, value)?);
                }
                "evolution.convergence-threshold" => {
                    self.evolution
                        .get_or_insert_with(Default::default)
                        .convergence_threshold = Some(parse_value(key, value)?);
                }
                "graph.long-range-threshold" => {
                    self.graph
                        .get_or_insert_with(Default::default)
                        .long_range_threshold = Some(parse_value(key, value)?);
                }
                "validation.reality-tolerance" => {
                    self.validation
                        .get_or_insert_with(Default::default)
                        .reality_tolerance = parse_value(key, value)?;
                }
                "validation.min-survival" => {
                    self.validation
                        .get_or_insert_with(Default::default)
                        .min_survival = parse_value(key, value)?;
                }
                "energy.reference-temperature" => {
                    self.energy
                        .get_or_insert_with(Default::default)
                        .reference_temperature = parse_value(key, value)?;
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use qfold::engine::operators::{EnergyBias, EquilibriumBias};
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn discover_args(extra: &[&str]) -> DiscoverArgs {
        let mut args = vec!["qfold", "discover", "AGPLAWATAFSAVAIK", "-o", "out"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Discover(args) => args,
            _ => panic!("Expected 'discover' subcommand"),
        }
    }

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let config = PartialDiscoveryConfig::default()
            .merge_with_cli(&discover_args(&[]))
            .unwrap();
        assert_eq!(config.basis_size, DEFAULT_BASIS_SIZE);
        assert_eq!(config.sample_count, DEFAULT_SAMPLE_COUNT);
        assert_eq!(config.replicate_count, DEFAULT_REPLICATE_COUNT);
        assert_eq!(config.rigor_threshold, DEFAULT_RIGOR_THRESHOLD);
        assert_eq!(config.seed, None);
        assert_eq!(config.evolution, EvolutionConfig::default());
    }

    #[test]
    fn file_sections_are_merged() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "qfold.toml",
            r#"
        [discovery]
        basis-size = 64
        sample-count = 20
        seed = 99
        class-tag = "alpha-helical"
        initial-amplitudes = "uniform"

        [evolution]
        max-iterations = 12

        [[evolution.operators]]
        kind = "energy-bias"
        weight = 0.4

        [[evolution.operators]]
        kind = "equilibrium-bias"
        weight = 0.6

        [validation]
        reality-tolerance = 0.3

        [validation.physics]
        max-instability = 55.0
        "#,
        );

        let config = PartialDiscoveryConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&discover_args(&[]))
            .unwrap();

        assert_eq!(config.basis_size, 64);
        assert_eq!(config.sample_count, 20);
        assert_eq!(config.replicate_count, DEFAULT_REPLICATE_COUNT);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.class_tag.as_deref(), Some("alpha-helical"));
        assert_eq!(config.initial_amplitudes, InitialAmplitudes::Uniform);
        assert_eq!(config.evolution.max_iterations, 12);
        assert_eq!(
            config.evolution.operators,
            vec![
                ConstraintOperator::EnergyBias(EnergyBias { weight: 0.4 }),
                ConstraintOperator::EquilibriumBias(EquilibriumBias { weight: 0.6 }),
            ]
        );
        assert_eq!(config.validation.reality_tolerance, 0.3);
        assert_eq!(config.validation.physics.max_instability, 55.0);
        assert_eq!(config.validation.min_survival, 0.6);
    }

    #[test]
    fn cli_flags_win_over_set_values_and_set_values_over_file() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "override.toml",
            r#"
        [discovery]
        sample-count = 20 # Will be overridden
        rigor-threshold = 0.5
        "#,
        );
        let args = discover_args(&[
            "-k",
            "30",
            "-t",
            "0.8",
            "-S",
            "discovery.rigor-threshold=0.9",
            "-S",
            "evolution.max-iterations=5",
        ]);

        let config = PartialDiscoveryConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();
        assert_eq!(config.sample_count, 30);
        assert_eq!(config.rigor_threshold, 0.8);
        assert_eq!(config.evolution.max_iterations, 5);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "typo.toml", "[discovery]\nsample-cuont = 3\n");
        assert!(matches!(
            PartialDiscoveryConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));

        let result = PartialDiscoveryConfig::default()
            .merge_with_cli(&discover_args(&["-S", "discovery.colour=blue"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("discovery.colour")));
    }

    #[test]
    fn invalid_values_surface_as_config_errors() {
        let result = PartialDiscoveryConfig::default()
            .merge_with_cli(&discover_args(&["-S", "discovery.sample-count=many"]));
        assert!(matches!(result, Err(CliError::Config(_))));

        let result = PartialDiscoveryConfig::default().merge_with_cli(&discover_args(&["-b", "150"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("basis_size")));
    }

    #[test]
    fn oversized_seed_from_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "seed.toml",
            "[discovery]\nseed = 1\n",
        );
        let args = discover_args(&["-S", "discovery.seed=18446744073709551615"]);
        let result = PartialDiscoveryConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("seed")));
    }

    #[test]
    fn relative_table_paths_resolve_against_the_config_file() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "tables.toml",
            "[reference]\ntables = \"missing-tables.toml\"\n",
        );
        let config = PartialDiscoveryConfig::from_file(&path).unwrap();
        assert!(matches!(config.load_tables(), Err(CliError::Core(_))));
        assert!(PartialDiscoveryConfig::default().load_tables().is_ok());
    }
}

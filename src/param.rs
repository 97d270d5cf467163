use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sum_target must be nonzero, it divides the sum term of the fitness")]
    ZeroSumTarget,
    #[error("product_target must be nonzero, it divides the product term of the fitness")]
    ZeroProductTarget,
    #[error("population_size must be positive")]
    EmptyPopulation,
    #[error("length must be positive")]
    EmptyGenome,
    #[error("{name} is a probability, must be within [0,1], got {rate}")]
    RateOutOfRange { name: &'static str, rate: f64 },
    #[error("max_error must be >= 0, got {value}")]
    NegativeMaxError { value: f64 },
}

// Field definitions and associated default values

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Param {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub ga: GA,
    #[serde(default)]
    pub puzzle: Puzzle,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct General {
    #[serde(default = "seed_default")]
    pub seed: u64,
    #[serde(default = "false_default")]
    pub random_seed: bool,
    #[serde(default = "log_base_default")]
    pub log_base: String,
    #[serde(default = "log_suffix_default")]
    pub log_suffix: String,
    #[serde(default = "log_level_default")]
    pub log_level: String,
    #[serde(default = "true_default")]
    pub display_colorful: bool,
    #[serde(default = "save_result_default")]
    pub save_result: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GA {
    #[serde(default = "pop_size_default")]
    pub population_size: u32,
    #[serde(default = "crossover_rate_default")]
    pub crossover_rate: f64,
    #[serde(default = "mutation_rate_default")]
    pub mutation_rate: f64,
    #[serde(default = "uzero_default")]
    pub max_generations: usize,
    #[serde(default = "stagnation_factor_default")]
    pub stagnation_factor: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Puzzle {
    #[serde(default = "length_default")]
    pub length: usize,
    #[serde(default = "sum_target_default")]
    pub sum_target: u64,
    #[serde(default = "product_target_default")]
    pub product_target: u64,
    #[serde(default = "max_error_default")]
    pub max_error: f64,
}

// Default section definitions

impl Default for General {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for GA {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Puzzle {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Param {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Param {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn get(param_file: String) -> Result<Param, Box<dyn Error>> {
    let param_file_reader = File::open(param_file)?;
    let param_reader = BufReader::new(param_file_reader);

    let mut config: Param = serde_yaml::from_reader(param_reader)?;

    let _ = validate(&mut config)?;

    Ok(config)
}

pub fn validate(param: &mut Param) -> Result<(), ConfigError> {
    if param.general.log_base.len() > 0 {
        param.general.display_colorful = false;
    }

    if param.puzzle.sum_target == 0 {
        return Err(ConfigError::ZeroSumTarget);
    }

    if param.puzzle.product_target == 0 {
        return Err(ConfigError::ZeroProductTarget);
    }

    if param.ga.population_size == 0 {
        return Err(ConfigError::EmptyPopulation);
    }

    if param.puzzle.length == 0 {
        return Err(ConfigError::EmptyGenome);
    }

    if param.ga.crossover_rate < 0.0 || param.ga.crossover_rate > 1.0 {
        return Err(ConfigError::RateOutOfRange {
            name: "crossover_rate",
            rate: param.ga.crossover_rate,
        });
    }

    if param.ga.mutation_rate < 0.0 || param.ga.mutation_rate > 1.0 {
        return Err(ConfigError::RateOutOfRange {
            name: "mutation_rate",
            rate: param.ga.mutation_rate,
        });
    }

    if param.puzzle.max_error < 0.0 {
        return Err(ConfigError::NegativeMaxError {
            value: param.puzzle.max_error,
        });
    }

    if param.ga.max_generations > 0 && param.ga.stagnation_factor != stagnation_factor_default() {
        warn!("stagnation_factor is only used when max_generations=0, it will be ignored here");
    }

    if param.general.random_seed {
        warn!("random_seed=true: each run draws a fresh seed, results will not be reproducible");
    }

    Ok(())
}

// Default value definitions

fn seed_default() -> u64 {
    4815162342
}
fn false_default() -> bool {
    false
}
fn true_default() -> bool {
    true
}
fn log_base_default() -> String {
    "".to_string()
}
fn log_suffix_default() -> String {
    "log".to_string()
}
fn log_level_default() -> String {
    "info".to_string()
}
fn save_result_default() -> String {
    "".to_string()
}
fn pop_size_default() -> u32 {
    100
}
fn crossover_rate_default() -> f64 {
    0.5
}
fn mutation_rate_default() -> f64 {
    0.01
}
fn uzero_default() -> usize {
    0
}
fn stagnation_factor_default() -> usize {
    10000
}
fn length_default() -> usize {
    15
}
fn sum_target_default() -> u64 {
    75
}
fn product_target_default() -> u64 {
    14850
}
fn max_error_default() -> f64 {
    1e-5
}

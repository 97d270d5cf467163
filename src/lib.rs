pub mod ga;
pub mod individual;
pub mod param;
pub mod population;
pub mod puzzle;
pub mod report;
pub mod utils;

use crate::ga::Outcome;
use crate::param::{ConfigError, Param};
use crate::population::Population;
use crate::puzzle::Puzzle;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

/// Pick the RNG seed for a run: the configured value, or a fresh
/// wall-clock derived one when `random_seed` is set.
fn resolve_seed(param: &Param) -> u64 {
    if param.general.random_seed {
        utils::entropy_seed()
    } else {
        param.general.seed
    }
}

/// Validate the parameters and draw the initial random population.
///
/// Seeds its own RNG, so this is only for standalone use: `run` generates
/// its population on the same stream the evolution loop consumes.
pub fn initialize(param: &Param) -> Result<Population, ConfigError> {
    let mut checked = param.clone();
    param::validate(&mut checked)?;

    let seed = resolve_seed(&checked);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut population = Population::new();
    population.generate(checked.ga.population_size, checked.puzzle.length, &mut rng);
    Ok(population)
}

/// Run the whole pipeline: validate the parameters, build the puzzle, draw
/// the initial population and evolve it to a terminal outcome.
///
/// Parameters are validated before the RNG is even constructed, so a bad
/// configuration never consumes a random draw. Population generation and
/// the evolution loop then share a single seeded stream, which makes the
/// complete run reproducible for a fixed seed.
pub fn run(param: &Param, running: Arc<AtomicBool>) -> Result<Outcome, ConfigError> {
    let start = Instant::now();

    let mut run_param = param.clone();
    param::validate(&mut run_param)?;

    let puzzle = Puzzle::from_param(&run_param)?;
    info!("Puzzle: {}", puzzle);

    let seed = resolve_seed(&run_param);
    info!("Seed: {}", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut population = Population::new();
    population.generate(run_param.ga.population_size, run_param.puzzle.length, &mut rng);
    info!("Population size: {}", population.individuals.len());

    let outcome = ga::ga(&puzzle, &run_param, &mut population, running, &mut rng);

    info!("Run finished in {:.2?}", start.elapsed());
    Ok(outcome)
}

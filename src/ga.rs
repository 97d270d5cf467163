use crate::individual::Individual;
use crate::param::Param;
use crate::population::Population;
use crate::puzzle::Puzzle;
use log::{debug, error, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

//-----------------------------------------------------------------------------
// Genetic Algorithm operators
//-----------------------------------------------------------------------------

/// Draw two population indices uniformly and order them by fitness.
///
/// The two draws are independent, so they may land on the same index. The
/// index with the lower (or equal) fitness is returned first as the winner,
/// the other second as the loser; on a tie the first draw stays winner.
pub fn select_pair(
    population: &Population,
    puzzle: &Puzzle,
    rng: &mut ChaCha8Rng,
) -> (usize, usize) {
    let first = rng.gen_range(0..population.individuals.len());
    let second = rng.gen_range(0..population.individuals.len());

    if population.individuals[first].evaluate(puzzle)
        > population.individuals[second].evaluate(puzzle)
    {
        (second, first)
    } else {
        (first, second)
    }
}

/// Copy bits of the winner into the loser, each position independently with
/// probability `crossover_rate`. The winner is never modified.
pub fn cross_over(
    population: &mut Population,
    winner: usize,
    loser: usize,
    crossover_rate: f64,
    rng: &mut ChaCha8Rng,
) {
    let winner_bits = population.individuals[winner].bits.clone();
    let loser = &mut population.individuals[loser];

    for (position, winner_bit) in winner_bits.iter().enumerate() {
        if rng.gen::<f64>() < crossover_rate {
            loser.bits[position] = *winner_bit;
        }
    }
}

/// Flip each bit of the individual independently with probability
/// `mutation_rate`, moving the integer to the other pile.
pub fn mutate(individual: &mut Individual, mutation_rate: f64, rng: &mut ChaCha8Rng) {
    for position in 0..individual.bits.len() {
        if rng.gen::<f64>() < mutation_rate {
            individual.flip(position);
        }
    }
}

//-----------------------------------------------------------------------------
// Evolution loop
//-----------------------------------------------------------------------------

/// Terminal state of an evolution run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Outcome {
    /// A partition within tolerance was found
    Found {
        /// The winning partition
        individual: Individual,
        /// Its fitness, 0.0 on an exact match
        fitness: f64,
        /// Index of the generation that produced it, counted from 0
        generation: usize,
    },
    /// The generation cap was hit without a solution
    GenerationLimitReached {
        /// Number of generations completed
        generation: usize,
    },
    /// Unbounded run gave up: the fitness plateaued for too long
    StagnationStopped {
        /// How many generations repeated the previous fitness value
        stagnation: usize,
        /// Number of generations completed
        generation: usize,
    },
    /// A signal cleared the running flag
    Interrupted {
        /// Number of generations completed
        generation: usize,
    },
}

impl Outcome {
    /// Render the outcome for the terminal. On success the partition is
    /// listed integer by integer, sum pile in blue and product pile in red
    /// when `colorful` is set, followed by the realized sum and product
    /// against their targets.
    pub fn display(&self, puzzle: &Puzzle, colorful: bool) -> String {
        match self {
            Outcome::Found {
                individual,
                fitness,
                generation,
            } => {
                let sum = individual.subset_sum();
                let product = individual.subset_product();
                if colorful {
                    format!(
                        "Found at \x1B[36m{}th\x1B[0m generation.\n{}\n\x1B[35m  error:{:.6}\x1B[0m\n\x1B[34m    sum:{}/{}\x1B[0m\n\x1B[31mproduct:{}/{}\x1B[0m",
                        generation,
                        individual.display(colorful),
                        fitness,
                        sum,
                        puzzle.sum_target,
                        product,
                        puzzle.product_target
                    )
                } else {
                    format!(
                        "Found at {}th generation.\n{}\n  error:{:.6}\n    sum:{}/{}\nproduct:{}/{}",
                        generation,
                        individual.display(colorful),
                        fitness,
                        sum,
                        puzzle.sum_target,
                        product,
                        puzzle.product_target
                    )
                }
            }
            Outcome::GenerationLimitReached { generation } => {
                format!("Failed, Do {} generations.", generation)
            }
            Outcome::StagnationStopped { generation, .. } => {
                format!("Failed, Quotient stop. Do {} generations.", generation)
            }
            Outcome::Interrupted { generation } => {
                format!("Interrupted, Do {} generations.", generation)
            }
        }
    }

    /// True when the run produced a partition within tolerance
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found { .. })
    }
}

/// Main function to run the genetic algorithm
///
/// Repeats generations of selection, crossover and mutation on the
/// population until one of the terminal outcomes is reached. Each
/// generation draws a (winner, loser) pair, exits early when the winner is
/// already within tolerance, otherwise rewrites the loser in place and
/// re-evaluates it.
///
/// With `max_generations` 0 the loop is unbounded and stops instead on
/// stagnation, once the number of generations whose fitness exactly
/// repeats the previous one exceeds population size times
/// `stagnation_factor`. That plateau count is a convergence heuristic, not
/// an optimality proof.
///
/// # Arguments
///
/// * `puzzle` - The validated puzzle instance holding targets and tolerance.
/// * `param` - Parameters for the genetic algorithm.
/// * `population` - The population to evolve, rewritten in place.
/// * `running` - Atomic boolean to control the running state of the algorithm.
/// * `rng` - Random number generator.
///
/// # Returns
///
/// The terminal `Outcome` of the run.
///
/// # Panics
///
/// Panics if the population is empty.
pub fn ga(
    puzzle: &Puzzle,
    param: &Param,
    population: &mut Population,
    running: Arc<AtomicBool>,
    rng: &mut ChaCha8Rng,
) -> Outcome {
    let time = Instant::now();

    if population.individuals.is_empty() {
        error!("Cannot evolve an empty population!");
        panic!("Cannot evolve an empty population!");
    }

    let stagnation_limit = population.individuals.len() * param.ga.stagnation_factor;

    let mut generation: usize = 0;
    let mut stagnation: usize = 0;
    let mut last_fitness: Option<f64> = None;
    let mut best_fitness = f64::INFINITY;

    let outcome = loop {
        let (winner, loser) = select_pair(population, puzzle, rng);

        // The population may already hold a solution: check the winner
        // before touching any genome this generation.
        let winner_fitness = population.individuals[winner].evaluate(puzzle);
        if winner_fitness <= puzzle.max_error {
            info!(
                "Generation {}: drawn winner already within tolerance, fitness {:.6}",
                generation, winner_fitness
            );
            break Outcome::Found {
                individual: population.individuals[winner].clone(),
                fitness: winner_fitness,
                generation,
            };
        }

        // Crossing an individual with itself changes nothing, mutation
        // still applies to the single drawn genome.
        if winner != loser {
            cross_over(population, winner, loser, param.ga.crossover_rate, rng);
        }
        mutate(&mut population.individuals[loser], param.ga.mutation_rate, rng);

        let fitness = population.individuals[loser].evaluate(puzzle);
        if fitness <= puzzle.max_error {
            info!(
                "Generation {}: loser within tolerance after crossover and mutation, fitness {:.6}",
                generation, fitness
            );
            break Outcome::Found {
                individual: population.individuals[loser].clone(),
                fitness,
                generation,
            };
        }

        if fitness < best_fitness {
            best_fitness = fitness;
            debug!("Generation {}: fitness down to {:.6}", generation, fitness);
        }

        // A plateau repeats the exact same fitness value from one
        // generation to the next.
        if let Some(last) = last_fitness {
            if last == fitness {
                stagnation += 1;
            }
        }
        last_fitness = Some(fitness);

        generation += 1;

        if param.ga.max_generations > 0 && generation >= param.ga.max_generations {
            info!("Generation cap of {} reached", param.ga.max_generations);
            break Outcome::GenerationLimitReached { generation };
        }

        if param.ga.max_generations == 0 && stagnation > stagnation_limit {
            info!(
                "Fitness repeated {} times (limit {}), giving up",
                stagnation, stagnation_limit
            );
            break Outcome::StagnationStopped {
                stagnation,
                generation,
            };
        }

        if !running.load(Ordering::Relaxed) {
            info!("Signal received");
            break Outcome::Interrupted { generation };
        }
    };

    info!(
        "Evolution stopped at generation {} after {:.2?}",
        generation,
        time.elapsed()
    );

    outcome
}

// unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Puzzle solved exactly by the bit vector [0, 1, 1, 1]:
    /// sum pile {1} = 1, product pile {2, 3, 4} = 24
    fn tiny_puzzle() -> Puzzle {
        Puzzle {
            length: 4,
            sum_target: 1,
            product_target: 24,
            max_error: 0.0,
        }
    }

    /// Puzzle with no solution at all: 1..=3 sums to at most 6 and no
    /// subset of it multiplies to 7, so the fitness never reaches 0
    fn impossible_puzzle() -> Puzzle {
        Puzzle {
            length: 3,
            sum_target: 100,
            product_target: 7,
            max_error: 0.0,
        }
    }

    fn create_test_params() -> Param {
        let mut param = Param::default();
        param.ga.population_size = 50;
        param.ga.crossover_rate = 0.5;
        param.ga.mutation_rate = 0.1;
        param.ga.max_generations = 0;
        param.ga.stagnation_factor = 10000;
        param
    }

    /// Population of `size` copies of the same genome
    fn uniform_population(size: usize, bits: Vec<u8>) -> Population {
        Population {
            individuals: (0..size)
                .map(|_| Individual { bits: bits.clone() })
                .collect(),
        }
    }

    fn random_population(size: u32, length: usize, rng: &mut ChaCha8Rng) -> Population {
        let mut population = Population::new();
        population.generate(size, length, rng);
        population
    }

    #[test]
    fn test_select_pair_winner_is_at_least_as_fit() {
        let puzzle = tiny_puzzle();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let population = random_population(20, 4, &mut rng);

        for _ in 0..100 {
            let (winner, loser) = select_pair(&population, &puzzle, &mut rng);
            assert!(winner < population.individuals.len());
            assert!(loser < population.individuals.len());
            assert!(
                population.individuals[winner].evaluate(&puzzle)
                    <= population.individuals[loser].evaluate(&puzzle),
                "winner must not be less fit than loser"
            );
        }
    }

    #[test]
    fn test_select_pair_is_deterministic_with_seed() {
        let puzzle = tiny_puzzle();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let population = random_population(20, 4, &mut rng);

        let mut rng1 = ChaCha8Rng::seed_from_u64(7);
        let mut rng2 = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(
                select_pair(&population, &puzzle, &mut rng1),
                select_pair(&population, &puzzle, &mut rng2)
            );
        }
    }

    #[test]
    fn test_select_pair_on_uniform_population_is_well_formed() {
        // Every pair is a tie, one index must still come out as winner
        let puzzle = tiny_puzzle();
        let population = uniform_population(10, vec![0, 0, 1, 1]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..50 {
            let (winner, loser) = select_pair(&population, &puzzle, &mut rng);
            assert!(winner < 10);
            assert!(loser < 10);
        }
    }

    #[test]
    fn test_cross_over_full_rate_copies_winner() {
        let mut population = Population {
            individuals: vec![
                Individual {
                    bits: vec![1, 0, 1, 0, 1],
                },
                Individual {
                    bits: vec![0, 1, 0, 1, 0],
                },
            ],
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        cross_over(&mut population, 0, 1, 1.0, &mut rng);

        assert_eq!(
            population.individuals[1], population.individuals[0],
            "full-rate crossover must clone the winner into the loser"
        );
    }

    #[test]
    fn test_cross_over_zero_rate_keeps_loser() {
        let mut population = Population {
            individuals: vec![
                Individual {
                    bits: vec![1, 0, 1, 0, 1],
                },
                Individual {
                    bits: vec![0, 1, 0, 1, 0],
                },
            ],
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        cross_over(&mut population, 0, 1, 0.0, &mut rng);

        assert_eq!(population.individuals[1].bits, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_cross_over_never_touches_winner() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = random_population(2, 30, &mut rng);
        let winner_before = population.individuals[0].clone();
        let loser_before = population.individuals[1].clone();

        cross_over(&mut population, 0, 1, 0.5, &mut rng);

        assert_eq!(
            population.individuals[0], winner_before,
            "crossover must leave the winner untouched"
        );
        // Each loser bit either kept its value or took the winner's
        for position in 0..30 {
            let bit = population.individuals[1].bits[position];
            assert!(
                bit == loser_before.bits[position] || bit == winner_before.bits[position]
            );
        }
    }

    #[test]
    fn test_mutate_zero_rate_is_noop() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut individual = Individual::random(25, &mut rng);
        let before = individual.clone();

        mutate(&mut individual, 0.0, &mut rng);

        assert_eq!(individual, before);
    }

    #[test]
    fn test_mutate_full_rate_flips_every_bit() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut individual = Individual {
            bits: vec![0, 1, 0, 1],
        };

        mutate(&mut individual, 1.0, &mut rng);

        assert_eq!(individual.bits, vec![1, 0, 1, 0]);
    }

    #[test]
    fn test_ga_early_exit_when_population_holds_solution() {
        // Every individual already solves the puzzle: the first drawn
        // winner ends the run before any crossover or mutation.
        let puzzle = tiny_puzzle();
        let param = create_test_params();
        let mut population = uniform_population(10, vec![0, 1, 1, 1]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let running = Arc::new(AtomicBool::new(true));

        let outcome = ga(&puzzle, &param, &mut population, running, &mut rng);

        match outcome {
            Outcome::Found {
                individual,
                fitness,
                generation,
            } => {
                assert_eq!(generation, 0);
                assert_eq!(fitness, 0.0);
                assert_eq!(individual.bits, vec![0, 1, 1, 1]);
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_ga_finds_tiny_solution() {
        let puzzle = tiny_puzzle();
        let param = create_test_params();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = random_population(50, 4, &mut rng);
        let running = Arc::new(AtomicBool::new(true));

        let outcome = ga(&puzzle, &param, &mut population, running, &mut rng);

        match outcome {
            Outcome::Found {
                individual,
                fitness,
                ..
            } => {
                assert_eq!(fitness, 0.0);
                assert_eq!(individual.subset_sum(), 1);
                assert_eq!(individual.subset_product(), 24);
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_ga_generation_limit() {
        let puzzle = impossible_puzzle();
        let mut param = create_test_params();
        param.ga.max_generations = 5;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = random_population(10, 3, &mut rng);
        let running = Arc::new(AtomicBool::new(true));

        let outcome = ga(&puzzle, &param, &mut population, running, &mut rng);

        assert_eq!(outcome, Outcome::GenerationLimitReached { generation: 5 });
    }

    #[test]
    fn test_ga_single_generation_cap() {
        let puzzle = impossible_puzzle();
        let mut param = create_test_params();
        param.ga.max_generations = 1;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = random_population(10, 3, &mut rng);
        let running = Arc::new(AtomicBool::new(true));

        let outcome = ga(&puzzle, &param, &mut population, running, &mut rng);

        assert_eq!(outcome, Outcome::GenerationLimitReached { generation: 1 });
    }

    #[test]
    fn test_ga_stagnation_stop_when_unbounded() {
        // Full-rate crossover with no mutation collapses the population
        // onto one genome, after which every generation repeats the same
        // fitness value until the counter trips.
        let puzzle = impossible_puzzle();
        let mut param = create_test_params();
        param.ga.max_generations = 0;
        param.ga.stagnation_factor = 1;
        param.ga.crossover_rate = 1.0;
        param.ga.mutation_rate = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = random_population(2, 3, &mut rng);
        let running = Arc::new(AtomicBool::new(true));

        let outcome = ga(&puzzle, &param, &mut population, running, &mut rng);

        match outcome {
            Outcome::StagnationStopped {
                stagnation,
                generation,
            } => {
                // limit is population size (2) times factor (1), the
                // counter grows by at most 1 per generation
                assert_eq!(stagnation, 3);
                assert!(generation >= 3);
            }
            other => panic!("expected StagnationStopped, got {:?}", other),
        }
    }

    #[test]
    fn test_ga_interrupted_when_flag_cleared() {
        let puzzle = impossible_puzzle();
        let param = create_test_params();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = random_population(10, 3, &mut rng);
        let running = Arc::new(AtomicBool::new(false));

        let outcome = ga(&puzzle, &param, &mut population, running, &mut rng);

        assert_eq!(outcome, Outcome::Interrupted { generation: 1 });
    }

    #[test]
    fn test_ga_is_deterministic_with_seed() {
        let puzzle = tiny_puzzle();
        let param = create_test_params();

        let mut rng1 = ChaCha8Rng::seed_from_u64(42);
        let mut population1 = random_population(50, 4, &mut rng1);
        let outcome1 = ga(
            &puzzle,
            &param,
            &mut population1,
            Arc::new(AtomicBool::new(true)),
            &mut rng1,
        );

        let mut rng2 = ChaCha8Rng::seed_from_u64(42);
        let mut population2 = random_population(50, 4, &mut rng2);
        let outcome2 = ga(
            &puzzle,
            &param,
            &mut population2,
            Arc::new(AtomicBool::new(true)),
            &mut rng2,
        );

        assert_eq!(outcome1, outcome2);
    }

    #[test]
    fn test_outcome_display_found_plain() {
        let outcome = Outcome::Found {
            individual: Individual {
                bits: vec![0, 1, 1, 1],
            },
            fitness: 0.0,
            generation: 7,
        };

        let report = outcome.display(&tiny_puzzle(), false);

        assert_eq!(
            report,
            "Found at 7th generation.\n1 2 3 4 \n  error:0.000000\n    sum:1/1\nproduct:24/24"
        );
    }

    #[test]
    fn test_outcome_display_found_colorful() {
        let outcome = Outcome::Found {
            individual: Individual {
                bits: vec![0, 1, 1, 1],
            },
            fitness: 0.0,
            generation: 7,
        };

        let report = outcome.display(&tiny_puzzle(), true);

        assert!(report.contains("\x1B[36m7th\x1B[0m"));
        assert!(report.contains("\x1B[35m  error:0.000000\x1B[0m"));
        assert!(report.contains("\x1B[34m    sum:1/1\x1B[0m"));
        assert!(report.contains("\x1B[31mproduct:24/24\x1B[0m"));
    }

    #[test]
    fn test_outcome_display_failures() {
        let puzzle = tiny_puzzle();
        assert_eq!(
            Outcome::GenerationLimitReached { generation: 5 }.display(&puzzle, true),
            "Failed, Do 5 generations."
        );
        assert_eq!(
            Outcome::StagnationStopped {
                stagnation: 101,
                generation: 12
            }
            .display(&puzzle, true),
            "Failed, Quotient stop. Do 12 generations."
        );
        assert_eq!(
            Outcome::Interrupted { generation: 3 }.display(&puzzle, false),
            "Interrupted, Do 3 generations."
        );
    }

    #[test]
    fn test_outcome_is_found() {
        assert!(Outcome::Found {
            individual: Individual::new(4),
            fitness: 0.0,
            generation: 0
        }
        .is_found());
        assert!(!Outcome::GenerationLimitReached { generation: 1 }.is_found());
        assert!(!Outcome::StagnationStopped {
            stagnation: 2,
            generation: 2
        }
        .is_found());
        assert!(!Outcome::Interrupted { generation: 1 }.is_found());
    }

    #[test]
    fn test_outcome_serialization_round_trip() {
        let outcome = Outcome::Found {
            individual: Individual {
                bits: vec![0, 1, 1, 1],
            },
            fitness: 0.0,
            generation: 42,
        };

        let json = serde_json::to_string(&outcome).unwrap();
        let back: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }
}

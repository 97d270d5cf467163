use crate::individual::Individual;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Population {
    pub individuals: Vec<Individual>,
}

impl Population {
    pub fn new() -> Population {
        Population {
            individuals: Vec::new(),
        }
    }

    /// Fill the population with `population_size` individuals of `length`
    /// uniformly random bits each. This happens once per run: evolution
    /// afterwards rewrites bits in place, so indices stay stable.
    pub fn generate(&mut self, population_size: u32, length: usize, rng: &mut ChaCha8Rng) {
        for _ in 0..population_size {
            self.individuals.push(Individual::random(length, rng))
        }
    }
}

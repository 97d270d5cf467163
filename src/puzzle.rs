use crate::param::{ConfigError, Param};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The partition puzzle itself: assign each integer of 1..=length to one of
/// two piles so that one pile sums to `sum_target` while the other
/// multiplies to `product_target`.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Puzzle {
    pub length: usize,
    pub sum_target: u64,
    pub product_target: u64,
    pub max_error: f64,
}

impl Puzzle {
    /// Build the puzzle from the param file section. Both targets end up as
    /// denominators in the fitness, so zero values are rejected here once
    /// and never rechecked per evaluation.
    pub fn from_param(param: &Param) -> Result<Puzzle, ConfigError> {
        if param.puzzle.sum_target == 0 {
            return Err(ConfigError::ZeroSumTarget);
        }

        if param.puzzle.product_target == 0 {
            return Err(ConfigError::ZeroProductTarget);
        }

        if param.puzzle.length == 0 {
            return Err(ConfigError::EmptyGenome);
        }

        let puzzle = Puzzle {
            length: param.puzzle.length,
            sum_target: param.puzzle.sum_target,
            product_target: param.puzzle.product_target,
            max_error: param.puzzle.max_error,
        };

        let total = puzzle.total_sum();
        if puzzle.sum_target > total {
            warn!(
                "sum_target {} exceeds {}, the sum of all integers 1..={}, no exact solution exists",
                puzzle.sum_target, total, puzzle.length
            );
        }

        Ok(puzzle)
    }

    /// Sum of every integer of the puzzle, the largest value a sum pile can reach.
    pub fn total_sum(&self) -> u64 {
        let n = self.length as u64;
        n * (n + 1) / 2
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "integers 1 to {}, sum target {}, product target {}, tolerance {}",
            self.length, self.sum_target, self.product_target, self.max_error
        )
    }
}

impl fmt::Debug for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the Display formatter
        write!(f, "{}", self)
    }
}

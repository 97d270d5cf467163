use crate::puzzle::Puzzle;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit value routing an integer to the sum pile
pub const SUM_BIT: u8 = 0;
/// Bit value routing an integer to the product pile
pub const PRODUCT_BIT: u8 = 1;

/// One candidate partition of the integers 1..=length. Bit at position i-1
/// carries integer i: 0 sends it to the sum pile, 1 to the product pile.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Individual {
    /// Genome, always exactly puzzle length bits of value 0 or 1
    pub bits: Vec<u8>,
}

impl Individual {
    /// Create an all-zero individual, every integer on the sum pile
    pub fn new(length: usize) -> Individual {
        Individual {
            bits: vec![SUM_BIT; length],
        }
    }

    /// Create an individual with every bit drawn uniformly from {0,1}
    pub fn random(length: usize, rng: &mut ChaCha8Rng) -> Individual {
        Individual {
            bits: (0..length).map(|_| rng.gen_range(0..2)).collect(),
        }
    }

    /// Fitness of this partition against the puzzle targets, as the sum of
    /// the two relative errors:
    ///
    /// |sum - sum_target| / sum_target + |product - product_target| / product_target
    ///
    /// 0.0 means both piles hit their target exactly, lower is better and
    /// there is no upper bound.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gapartition::individual::Individual;
    /// # use gapartition::puzzle::Puzzle;
    /// let puzzle = Puzzle { length: 4, sum_target: 1, product_target: 24, max_error: 0.0 };
    /// let individual = Individual { bits: vec![0, 1, 1, 1] };
    /// assert_eq!(individual.evaluate(&puzzle), 0.0);
    /// ```
    pub fn evaluate(&self, puzzle: &Puzzle) -> f64 {
        let sum = self.subset_sum();
        let product = self.subset_product();

        let sum_term = sum.abs_diff(puzzle.sum_target) as f64 / puzzle.sum_target as f64;
        let product_term =
            product.abs_diff(puzzle.product_target as u128) as f64 / puzzle.product_target as f64;

        sum_term + product_term
    }

    /// Sum of the integers on the sum pile. An empty pile sums to 0.
    pub fn subset_sum(&self) -> u64 {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit == SUM_BIT)
            .map(|(i, _)| (i + 1) as u64)
            .sum()
    }

    /// Product of the integers on the product pile. An empty pile multiplies
    /// to 1, the multiplicative identity. Accumulated in u128 with
    /// saturation: a pile too large to represent degrades into a huge
    /// relative error instead of wrapping.
    pub fn subset_product(&self) -> u128 {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit == PRODUCT_BIT)
            .fold(1u128, |product, (i, _)| {
                product.saturating_mul((i + 1) as u128)
            })
    }

    /// Flip the bit at `position`, moving that integer to the other pile
    pub fn flip(&mut self, position: usize) {
        self.bits[position] ^= 1;
    }

    /// Render the partition as the ordered list of integers, sum pile in
    /// blue and product pile in red when `colorful` is set
    pub fn display(&self, colorful: bool) -> String {
        let mut line = String::new();
        for (i, bit) in self.bits.iter().enumerate() {
            if colorful {
                let color = if *bit == SUM_BIT {
                    "\x1B[34m"
                } else {
                    "\x1B[31m"
                };
                line.push_str(&format!("{}{}\x1B[0m ", color, i + 1));
            } else {
                line.push_str(&format!("{} ", i + 1));
            }
        }
        line
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter() {
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the Display formatter
        write!(f, "{}", self)
    }
}

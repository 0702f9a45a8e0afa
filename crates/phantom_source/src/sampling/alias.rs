//! Alias-method discrete sampler.
//!
//! [`WeightedSampler`] turns a list of non-negative weights into a table that
//! answers weighted index draws in constant time. Construction is linear in the
//! number of weights (Vose's variant), queries cost one index draw and one
//! uniform draw.
use rand::RngCore;

use crate::error::{Error, Result};
use crate::sampling::{uniform_index, unit_f64};

/// Constant-time weighted choice over `0..len()`.
///
/// The table is immutable once built, so a sampler can be shared between
/// threads and queried concurrently with independent RNGs.
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    probability: Vec<f64>,
    alias: Vec<usize>,
    normalized: Vec<f64>,
}

impl WeightedSampler {
    /// Builds the alias table for `weights`.
    ///
    /// Fails with [`Error::InvalidArgument`] when `weights` is empty or any weight is
    /// negative or not finite. All-zero weights yield the uniform distribution.
    pub fn new(weights: &[f64]) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidArgument(
                "weighted sampler needs at least one weight".into(),
            ));
        }
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(Error::InvalidArgument(format!(
                "weight {i} is {w}; weights must be finite and non-negative"
            )));
        }

        let n = weights.len();
        let total: f64 = weights.iter().sum();
        if !total.is_finite() {
            return Err(Error::InvalidArgument(
                "sum of weights is not finite".into(),
            ));
        }

        let normalized: Vec<f64> = if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / n as f64; n]
        };
        let mut scaled: Vec<f64> = normalized.iter().map(|p| p * n as f64).collect();

        let mut probability = vec![1.0; n];
        let mut alias: Vec<usize> = (0..n).collect();

        // Both worklists share one buffer: small indices grow up from the front,
        // large indices grow down from the back. Their combined length never
        // exceeds `n`, and every iteration retires one index.
        let mut work = vec![0usize; n];
        let mut small = 0usize;
        let mut large = n;
        for (i, &s) in scaled.iter().enumerate() {
            if s < 1.0 {
                work[small] = i;
                small += 1;
            } else {
                large -= 1;
                work[large] = i;
            }
        }

        while small > 0 && large < n {
            small -= 1;
            let s = work[small];
            let l = work[large];
            large += 1;

            probability[s] = scaled[s];
            alias[s] = l;
            scaled[l] -= 1.0 - scaled[s];

            if scaled[l] < 1.0 {
                work[small] = l;
                small += 1;
            } else {
                large -= 1;
                work[large] = l;
            }
        }
        // Whatever remains on either list is floating-point residue of a full
        // column and keeps probability 1 with itself as alias.

        Ok(Self {
            probability,
            alias,
            normalized,
        })
    }

    /// Number of outcomes.
    pub fn len(&self) -> usize {
        self.probability.len()
    }

    /// Always `false`; construction rejects empty weight lists.
    pub fn is_empty(&self) -> bool {
        self.probability.is_empty()
    }

    /// Target probability of outcome `i` (its weight over the total).
    pub fn probability_of(&self, i: usize) -> Option<f64> {
        self.normalized.get(i).copied()
    }

    /// Column acceptance probabilities of the alias table.
    pub fn probabilities(&self) -> &[f64] {
        &self.probability
    }

    /// Column aliases of the alias table.
    pub fn aliases(&self) -> &[usize] {
        &self.alias
    }

    /// Draws one index with probability proportional to its weight.
    #[inline]
    pub fn sample(&self, rng: &mut dyn RngCore) -> usize {
        let i = uniform_index(rng, self.probability.len());
        let r = unit_f64(rng);
        if r < self.probability[i] {
            i
        } else {
            self.alias[i]
        }
    }
}

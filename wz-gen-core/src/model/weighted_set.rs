use rand::Rng;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An ordered list of candidates paired with relative sampling weights.
///
/// Used both for syllable templates and for the phonemes of a category.
///
/// ## Invariants
/// - `values` and `weights` have the same, non-zero length
/// - Every weight is finite and non-negative
/// - `total` is the sum of `weights` and is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WeightedSet {
	values: Vec<String>,
	weights: Vec<f64>,
	total: f64,
}

impl WeightedSet {
	/// Pairs `values` with `weights`.
	///
	/// # Errors
	/// Returns a validation error if the lengths differ, if a weight is
	/// negative or not finite, or if all weights are zero.
	pub fn new(values: Vec<String>, weights: Vec<f64>) -> Result<Self> {
		if values.len() != weights.len() {
			return Err(Error::Validation(format!(
				"{} candidates but {} weights",
				values.len(),
				weights.len()
			)));
		}
		if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
			return Err(Error::Validation("weights must be finite and >= 0".to_owned()));
		}

		let total: f64 = weights.iter().sum();
		if !(total > 0.0) {
			return Err(Error::Validation("weights sum to zero".to_owned()));
		}

		Ok(Self { values, weights, total })
	}

	pub fn values(&self) -> &[String] {
		&self.values
	}

	pub fn weights(&self) -> &[f64] {
		&self.weights
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Picks one candidate with probability proportional to its weight.
	///
	/// Draws `r` in `[0, total)` then walks the cumulative weights.
	/// Zero-weight candidates are never returned.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
		let mut r = rng.random_range(0.0..self.total);

		let mut fallback = 0;
		for (index, weight) in self.weights.iter().enumerate() {
			if *weight <= 0.0 {
				continue;
			}
			if r < *weight {
				return &self.values[index];
			}
			r -= weight;
			fallback = index;
		}

		// Floating point rounding can leave a sliver past the last bucket
		&self.values[fallback]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn set(values: &[&str], weights: &[f64]) -> Result<WeightedSet> {
		WeightedSet::new(values.iter().map(|s| s.to_string()).collect(), weights.to_vec())
	}

	#[test]
	fn test_rejects_mismatched_lengths() {
		assert!(matches!(set(&["a", "b"], &[1.0]), Err(Error::Validation(_))));
	}

	#[test]
	fn test_rejects_all_zero_and_negative() {
		assert!(set(&["a", "b"], &[0.0, 0.0]).is_err());
		assert!(set(&["a"], &[-1.0]).is_err());
		assert!(set(&[], &[]).is_err());
	}

	#[test]
	fn test_zero_weight_never_sampled() {
		let weighted = set(&["a", "b", "c"], &[1.0, 0.0, 0.0]).unwrap();
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..500 {
			assert_eq!(weighted.sample(&mut rng), "a");
		}
	}

	#[test]
	fn test_sampling_follows_weights() {
		let weighted = set(&["heavy", "light"], &[9.0, 1.0]).unwrap();
		let mut rng = StdRng::seed_from_u64(42);
		let heavy = (0..10_000).filter(|_| weighted.sample(&mut rng) == "heavy").count();
		assert!((8_500..9_500).contains(&heavy), "heavy drawn {heavy} times");
	}
}

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Statistical distribution used to weight an ordered list of candidates.
///
/// The first candidate of a list always receives the largest weight under
/// `Zipf`; under `Poisson` the peak sits around index `q`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
	Poisson,
	#[default]
	Zipf,
}

impl Distribution {
	pub fn as_str(&self) -> &'static str {
		match self {
			Distribution::Poisson => "poisson",
			Distribution::Zipf => "zipf",
		}
	}
}

impl fmt::Display for Distribution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Distribution {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"poisson" => Ok(Distribution::Poisson),
			"zipf" => Ok(Distribution::Zipf),
			other => Err(Error::Validation(format!(
				"unknown distribution '{other}', expected 'poisson' or 'zipf'"
			))),
		}
	}
}

/// Produces weight vectors and memoizes them.
///
/// Outputs are a pure function of `(count, shape, distribution)`, so the
/// cache never needs invalidating. It lives as long as the provider, which
/// is typically one generation session.
///
/// # Invariants
/// - Every cached vector has exactly `count` finite, non-negative values
#[derive(Debug, Default, Clone)]
pub struct WeightProvider {
	cache: HashMap<(usize, u64, Distribution), Vec<f64>>,
}

impl WeightProvider {
	/// Creates a provider with an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the weight vector for `count` candidates, computing it on the
	/// first request for a given key.
	///
	/// # Errors
	/// See [`WeightProvider::compute`].
	pub fn weights(&mut self, count: usize, shape: f64, distribution: Distribution) -> Result<Vec<f64>> {
		// -0.0 and 0.0 must share an entry
		let shape = if shape == 0.0 { 0.0 } else { shape };
		let key = (count, shape.to_bits(), distribution);
		if let Some(weights) = self.cache.get(&key) {
			return Ok(weights.clone());
		}

		let weights = Self::compute(count, shape, distribution)?;
		self.cache.insert(key, weights.clone());
		Ok(weights)
	}

	/// Number of distinct vectors currently memoized.
	pub fn cached(&self) -> usize {
		self.cache.len()
	}

	/// Computes a weight vector without touching any cache.
	///
	/// - `Poisson`: probability mass of a Poisson law of rate `shape`,
	///   evaluated at `0..count`.
	/// - `Zipf`: mass proportional to `k^-a` with `a = 1 / shape`
	///   (`a = 1` when `shape` is 0), evaluated at ranks `0..=count`. Rank 0
	///   carries no mass and is dropped, so the result is indexed from rank 1.
	///
	/// Zipf weights are left unnormalized: they are only ever used as
	/// relative sampling weights.
	///
	/// # Errors
	/// Returns a validation error if `count` is 0 or if `shape` is negative
	/// or not finite.
	pub fn compute(count: usize, shape: f64, distribution: Distribution) -> Result<Vec<f64>> {
		if count == 0 {
			return Err(Error::Validation("weight count must be > 0".to_owned()));
		}
		if !shape.is_finite() || shape < 0.0 {
			return Err(Error::Validation(format!(
				"shape parameter must be a finite value >= 0, got {shape}"
			)));
		}

		let weights = match distribution {
			Distribution::Poisson => poisson_pmf(count, shape),
			Distribution::Zipf => {
				let exponent = if shape == 0.0 { 1.0 } else { 1.0 / shape };
				(0..=count)
					.map(|rank| zipf_mass(rank, exponent))
					.skip(1)
					.collect()
			}
		};

		Ok(weights)
	}
}

/// Below this log-weight, `exp` loses precision before reaching zero.
const MIN_LN_WEIGHT: f64 = -700.0;

/// Poisson pmf at `0..count`, accumulated in log space so that large rates
/// do not overflow `k!`.
///
/// When even the largest mass in range would underflow (rates far above
/// `count`), the log masses are shifted so the largest becomes 1. The
/// result is then proportional to the pmf rather than equal to it.
fn poisson_pmf(count: usize, rate: f64) -> Vec<f64> {
	let ln_rate = rate.ln(); // -inf when rate is 0, which zeroes every k > 0
	let mut ln_p = -rate;
	let mut ln_weights = Vec::with_capacity(count);
	for k in 0..count {
		if k > 0 {
			ln_p += ln_rate - (k as f64).ln();
		}
		ln_weights.push(ln_p);
	}

	let max = ln_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let shift = if max < MIN_LN_WEIGHT { max } else { 0.0 };
	ln_weights.into_iter().map(|ln_w| (ln_w - shift).exp()).collect()
}

fn zipf_mass(rank: usize, exponent: f64) -> f64 {
	if rank == 0 {
		return 0.0;
	}
	(rank as f64).powf(-exponent)
}

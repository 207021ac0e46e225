//! One-shot generation session: load, compile, generate, format.

use std::fmt;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::model::batch_input::BatchInput;
use crate::model::generator::generate_batch;
use crate::model::phonology::Phonology;
use crate::model::weights::Distribution;

/// Parameters of a generation session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOptions {
	/// Number of words to generate.
	pub words: usize,
	/// Number of syllables per word.
	pub syllables: usize,
	pub distribution: Distribution,
	/// Phonology source. `None` or an empty path uses the bundled phonology.
	pub file: Option<String>,
	/// Sort the words alphabetically.
	pub alpha: bool,
	/// Reject duplicate words within the batch.
	pub deduplicate: bool,
	/// Seed for the random source; drawn from the OS when absent.
	pub seed: Option<u64>,
	/// Overrides the default attempt bound of the batch.
	pub max_attempts: Option<usize>,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			words: 1,
			syllables: 1,
			distribution: Distribution::Zipf,
			file: None,
			alpha: true,
			deduplicate: true,
			seed: None,
			max_attempts: None,
		}
	}
}

impl SessionOptions {
	/// Builds options from string parameters, as received from a form or a
	/// query string. `alpha` is on only for `"true"`.
	///
	/// # Errors
	/// Returns a validation error if a count is not a positive integer or
	/// if the distribution is unknown.
	pub fn from_strings(words: &str, syllables: &str, distribution: &str, file: &str, alpha: &str) -> Result<Self> {
		let parse_count = |name: &str, value: &str| -> Result<usize> {
			match value.trim().parse::<usize>() {
				Ok(n) if n > 0 => Ok(n),
				_ => Err(Error::Validation(format!("{name} must be a positive integer, got '{value}'"))),
			}
		};

		let distribution = if distribution.trim().is_empty() {
			Distribution::default()
		} else {
			distribution.parse()?
		};

		Ok(Self {
			words: parse_count("words", words)?,
			syllables: parse_count("syllables", syllables)?,
			distribution,
			file: Some(file.to_owned()).filter(|f| !f.trim().is_empty()),
			alpha: alpha.trim().eq_ignore_ascii_case("true"),
			..Self::default()
		})
	}

	fn batch_input(&self) -> Result<BatchInput> {
		let mut input = BatchInput::new(self.words, self.syllables)?;
		input.deduplicate = self.deduplicate;
		input.sort = self.alpha;
		if let Some(max_attempts) = self.max_attempts {
			input.set_max_attempts(max_attempts)?;
		}
		Ok(input)
	}

	fn phonology(&self) -> Result<Phonology> {
		match self.file.as_deref() {
			Some(file) if !file.trim().is_empty() => Phonology::load(file),
			_ => Phonology::bundled(),
		}
	}
}

/// Result of a session: the words and what they were generated from.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
	pub language: String,
	pub syllables: usize,
	pub words: Vec<String>,
}

impl SessionReport {
	/// `"<language> language: <N> words of <M> syllable(s) each."`
	pub fn summary(&self) -> String {
		format!(
			"{} language: {} words of {} syllable(s) each.",
			self.language,
			self.words.len(),
			self.syllables
		)
	}
}

impl fmt::Display for SessionReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.summary())?;
		for word in &self.words {
			write!(f, "\n{word}")?;
		}
		Ok(())
	}
}

/// Runs a session with the given random source.
pub fn run_with_rng<R: Rng + ?Sized>(options: &SessionOptions, rng: &mut R) -> Result<SessionReport> {
	let input = options.batch_input()?;
	let phonology = options.phonology()?;
	debug!("Session phonology: {phonology:?}");

	let decorated = phonology.compile(options.distribution)?;
	let words = generate_batch(&decorated, &input, rng)?;

	Ok(SessionReport {
		language: phonology.language,
		syllables: options.syllables,
		words,
	})
}

/// Runs a session and formats it as a summary line followed by one word
/// per line.
pub fn run(options: &SessionOptions) -> Result<String> {
	let mut rng = match options.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};
	Ok(run_with_rng(options, &mut rng)?.to_string())
}

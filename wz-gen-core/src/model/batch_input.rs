use crate::error::{Error, Result};

/// Number of draws allowed per requested word before a deduplicated batch
/// gives up.
pub const DEFAULT_ATTEMPTS_PER_WORD: usize = 100;

/// Input parameters for generating a batch of words.
///
/// # Responsibilities
/// - Track the batch shape (`word_count`, `syllable_count`)
/// - Track the batch policy (`deduplicate`, `sort`)
/// - Bound the number of draws so a deduplicated batch always terminates
///
/// # Invariants
/// - `word_count`, `syllable_count` and `max_attempts` are always > 0
#[derive(Clone, Debug, PartialEq)]
pub struct BatchInput {
	word_count: usize,
	syllable_count: usize,

	/// Resample a word that is already in the batch.
	pub deduplicate: bool,

	/// Sort the batch lexicographically before returning it.
	pub sort: bool,

	/// Total number of words drawn before failing with an exhaustion error.
	max_attempts: usize,
}

impl BatchInput {
	/// Creates a batch input with deduplication on, sorting off and
	/// `DEFAULT_ATTEMPTS_PER_WORD` draws per requested word.
	///
	/// # Errors
	/// Returns a validation error if either count is 0.
	pub fn new(word_count: usize, syllable_count: usize) -> Result<Self> {
		if word_count == 0 {
			return Err(Error::Validation("word count must be > 0".to_owned()));
		}
		if syllable_count == 0 {
			return Err(Error::Validation("syllable count must be > 0".to_owned()));
		}

		Ok(Self {
			word_count,
			syllable_count,
			deduplicate: true,
			sort: false,
			max_attempts: word_count.saturating_mul(DEFAULT_ATTEMPTS_PER_WORD),
		})
	}

	pub fn word_count(&self) -> usize {
		self.word_count
	}

	pub fn syllable_count(&self) -> usize {
		self.syllable_count
	}

	pub fn max_attempts(&self) -> usize {
		self.max_attempts
	}

	/// Sets the total number of draws allowed for the batch.
	///
	/// # Errors
	/// Returns a validation error if `max_attempts` is 0.
	pub fn set_max_attempts(&mut self, max_attempts: usize) -> Result<()> {
		if max_attempts == 0 {
			return Err(Error::Validation("max attempts must be > 0".to_owned()));
		}
		self.max_attempts = max_attempts;
		Ok(())
	}
}

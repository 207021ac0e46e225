use crate::error::{Error, Result};
use crate::io;
use crate::model::batch_input::BatchInput;
use crate::model::phonology::{DecoratedPhonology, Phonology};
use crate::model::weights::{Distribution, WeightProvider};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// File extensions recognised as phonology sources.
pub const PHONOLOGY_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Upper bound on the capacity reserved up front for a batch.
const MAX_PREALLOCATED_WORDS: usize = 1024;

/// Builds one syllable.
///
/// Picks a template by weight, then one phoneme per template slot from the
/// slot's category, by weight, in template order.
///
/// # Errors
/// Returns an assertion error if the syllable comes out empty (template
/// with no slot, or only empty phonemes).
pub fn generate_syllable<R: Rng + ?Sized>(phonology: &DecoratedPhonology, rng: &mut R) -> Result<String> {
	let template = phonology.templates().sample(rng);

	let mut syllable = String::new();
	for label in template.chars() {
		let category = phonology.category(label).ok_or(Error::UnknownCategory(label))?;
		syllable.push_str(category.sample(rng));
	}

	if syllable.is_empty() {
		return Err(Error::EmptySyllable { template: template.to_owned() });
	}
	Ok(syllable)
}

/// Builds a word by concatenating `syllable_count` syllables.
///
/// # Errors
/// - Validation error if `syllable_count` is 0
/// - Any error from [`generate_syllable`]
pub fn generate_word<R: Rng + ?Sized>(phonology: &DecoratedPhonology, syllable_count: usize, rng: &mut R) -> Result<String> {
	if syllable_count == 0 {
		return Err(Error::Validation("syllable count must be > 0".to_owned()));
	}

	let mut word = String::new();
	for _ in 0..syllable_count {
		word.push_str(&generate_syllable(phonology, rng)?);
	}
	Ok(word)
}

/// Generates a batch of words.
///
/// # Behavior
/// - Draws words until the batch holds `word_count` words.
/// - With `deduplicate`, a word already in the batch is dropped and drawn
///   again.
/// - Stops with an exhaustion error once `max_attempts` words were drawn.
/// - With `sort`, the batch is sorted ascending before returning.
///
/// # Notes
/// A deduplicated request larger than [`DecoratedPhonology::combinations`]
/// can never be filled and fails before any word is drawn.
pub fn generate_batch<R: Rng + ?Sized>(phonology: &DecoratedPhonology, input: &BatchInput, rng: &mut R) -> Result<Vec<String>> {
	let requested = input.word_count();
	if input.deduplicate && phonology.combinations(input.syllable_count()) < requested as u128 {
		warn!(
			"{} language cannot produce {} distinct words of {} syllable(s)",
			phonology.language(),
			requested,
			input.syllable_count()
		);
		return Err(Error::Exhausted {
			requested,
			produced: 0,
			attempts: 0,
		});
	}

	// The count comes from callers (query strings included): never trust it
	// as an allocation size.
	let mut words = Vec::with_capacity(requested.min(MAX_PREALLOCATED_WORDS));
	let mut seen = HashSet::new();
	let mut attempts = 0;

	while words.len() < requested {
		if attempts >= input.max_attempts() {
			return Err(Error::Exhausted {
				requested,
				produced: words.len(),
				attempts,
			});
		}
		attempts += 1;

		let word = generate_word(phonology, input.syllable_count(), rng)?;
		if input.deduplicate && !seen.insert(word.clone()) {
			continue;
		}
		words.push(word);
	}

	if input.sort {
		words.sort();
	}

	info!(
		"Generated {} {} words of {} syllable(s) in {} attempts",
		words.len(),
		phonology.language(),
		input.syllable_count(),
		attempts
	);
	Ok(words)
}

/// High-level generator managing several named phonologies.
///
/// # Responsibilities
/// - Load and keep the phonologies of a directory (one per YAML file)
/// - Share one weight cache across every compilation it performs
/// - Own the random source, seedable for reproducible output
#[derive(Debug)]
pub struct Generator {
	phonologies: BTreeMap<String, Phonology>,
	provider: WeightProvider,
	rng: StdRng,
}

impl Default for Generator {
	fn default() -> Self {
		Self {
			phonologies: BTreeMap::new(),
			provider: WeightProvider::new(),
			rng: StdRng::from_os_rng(),
		}
	}
}

impl Generator {
	/// Creates a generator by loading every `.yml`/`.yaml` phonology of a
	/// directory.
	///
	/// # Parameters
	/// - `filepath`: Path to a directory containing phonology files.
	///   Both `"folder"` and `"folder/"` are accepted.
	///
	/// # Behavior
	/// - The phonology name is the file name without extension.
	/// - Subdirectories are ignored.
	///
	/// # Errors
	/// - Validation error if the path is not a directory.
	/// - Any error raised while loading one of the files.
	pub fn new<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let mut generator = Self::default();

		let string_path = filepath
			.as_ref()
			.to_str()
			.ok_or_else(|| Error::Validation("Invalid filepath".to_owned()))?;
		let folder = io::normalize_folder(string_path);

		if !folder.is_dir() {
			return Err(Error::Validation(format!("Expected a directory, got: {}", folder.display())));
		}

		for file in io::list_files(&folder, &PHONOLOGY_EXTENSIONS)? {
			generator.load_phonology(folder.join(&file))?;
		}

		Ok(generator)
	}

	/// Creates a generator over already-parsed phonologies.
	pub fn with_phonologies<I: IntoIterator<Item = (String, Phonology)>>(phonologies: I) -> Self {
		Self {
			phonologies: phonologies.into_iter().collect(),
			..Self::default()
		}
	}

	/// Replaces the random source with one seeded from `seed`.
	pub fn seeded(mut self, seed: u64) -> Self {
		self.rng = StdRng::seed_from_u64(seed);
		self
	}

	/// Returns the names of the loaded phonologies, sorted.
	pub fn get_phonology_names(&self) -> Vec<String> {
		self.phonologies.keys().cloned().collect()
	}

	pub fn phonology(&self, name: &str) -> Option<&Phonology> {
		self.phonologies.get(name)
	}

	/// Loads a phonology file and registers it under its file stem.
	///
	/// Returns the registered name.
	///
	/// # Errors
	/// Returns an error if a phonology of that name is already loaded or if
	/// the file cannot be read or parsed.
	pub fn load_phonology<P: AsRef<Path>>(&mut self, filepath: P) -> Result<String> {
		let key = io::get_filename(&filepath)?;
		if self.phonologies.contains_key(&key) {
			return Err(Error::Validation(format!("Phonology {key} already loaded")));
		}
		let phonology = Phonology::load(&filepath)?;
		debug!("Registered phonology {} ({} language)", key, phonology.language);
		self.phonologies.insert(key.clone(), phonology);
		Ok(key)
	}

	/// Registers a phonology, replacing any previous one of the same name.
	pub fn insert_phonology(&mut self, name: &str, phonology: Phonology) {
		self.phonologies.insert(name.to_owned(), phonology);
	}

	/// Creates a `BatchInput` with the default policy.
	pub fn make_batch_input(&self, word_count: usize, syllable_count: usize) -> Result<BatchInput> {
		BatchInput::new(word_count, syllable_count)
	}

	/// Compiles a loaded phonology using the generator's weight cache.
	///
	/// # Errors
	/// Returns a validation error if no phonology is registered as `name`.
	pub fn compile(&mut self, name: &str, distribution: Distribution) -> Result<DecoratedPhonology> {
		let phonology = self
			.phonologies
			.get(name)
			.ok_or_else(|| Error::Validation(format!("Phonology {name} not found")))?;
		phonology.compile_with(distribution, &mut self.provider)
	}

	/// Generates a single word with the generator's random source.
	pub fn generate_word(&mut self, phonology: &DecoratedPhonology, syllable_count: usize) -> Result<String> {
		generate_word(phonology, syllable_count, &mut self.rng)
	}

	/// Generates a batch with the generator's random source.
	pub fn generate_batch(&mut self, phonology: &DecoratedPhonology, input: &BatchInput) -> Result<Vec<String>> {
		generate_batch(phonology, input, &mut self.rng)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::phonology::Inventory;

	fn inventory(vals: &[&str], q: f64) -> Inventory {
		Inventory { vals: vals.iter().map(|s| s.to_string()).collect(), q }
	}

	fn phonology(templates: &[&str], elements: &[(&str, &[&str])]) -> Phonology {
		Phonology {
			language: "Test".to_owned(),
			syllables: inventory(templates, 0.7),
			elements: elements
				.iter()
				.map(|(label, vals)| (label.to_string(), inventory(vals, 0.7)))
				.collect(),
		}
	}

	fn cv() -> DecoratedPhonology {
		phonology(&["CV"], &[("C", &["k", "t"]), ("V", &["a", "i"])])
			.compile(Distribution::Zipf)
			.unwrap()
	}

	#[test]
	fn test_word_has_requested_syllables() {
		let decorated = cv();
		let mut rng = StdRng::seed_from_u64(1);
		for syllables in 1..6 {
			let word = generate_word(&decorated, syllables, &mut rng).unwrap();
			assert_eq!(word.chars().count(), syllables * 2);
			for syllable in word.as_bytes().chunks(2) {
				assert!(b"kt".contains(&syllable[0]));
				assert!(b"ai".contains(&syllable[1]));
			}
		}
	}

	#[test]
	fn test_zero_syllables_is_rejected() {
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(generate_word(&cv(), 0, &mut rng), Err(Error::Validation(_))));
	}

	#[test]
	fn test_empty_syllable_is_an_error() {
		let decorated = phonology(&[""], &[]).compile(Distribution::Zipf).unwrap();
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(
			generate_word(&decorated, 1, &mut rng),
			Err(Error::EmptySyllable { .. })
		));

		let decorated = phonology(&["C"], &[("C", &[""])]).compile(Distribution::Zipf).unwrap();
		match generate_syllable(&decorated, &mut rng) {
			Err(Error::EmptySyllable { template }) => assert_eq!(template, "C"),
			other => panic!("expected empty syllable error, got {other:?}"),
		}
	}

	#[test]
	fn test_batch_is_distinct() {
		let decorated = cv();
		let input = BatchInput::new(4, 1).unwrap();
		let mut rng = StdRng::seed_from_u64(3);
		let words = generate_batch(&decorated, &input, &mut rng).unwrap();
		assert_eq!(words.len(), 4);
		let distinct: HashSet<_> = words.iter().collect();
		assert_eq!(distinct.len(), 4);
	}

	#[test]
	fn test_batch_exhaustion_terminates() {
		let decorated = phonology(&["C"], &[("C", &["k"])]).compile(Distribution::Zipf).unwrap();
		let input = BatchInput::new(2, 1).unwrap();
		let mut rng = StdRng::seed_from_u64(3);
		match generate_batch(&decorated, &input, &mut rng) {
			Err(Error::Exhausted { requested, produced, attempts }) => {
				assert_eq!(requested, 2);
				assert_eq!(produced, 0);
				assert_eq!(attempts, 0);
			}
			other => panic!("expected exhaustion, got {other:?}"),
		}
	}

	#[test]
	fn test_batch_stops_on_attempt_bound() {
		// 6 phoneme sequences but only 4 distinct strings: k, kk, kkk, kkkk
		let decorated = phonology(&["C", "CC"], &[("C", &["k", "kk"])]).compile(Distribution::Zipf).unwrap();
		let input = BatchInput::new(5, 1).unwrap();
		let mut rng = StdRng::seed_from_u64(3);
		match generate_batch(&decorated, &input, &mut rng) {
			Err(Error::Exhausted { requested, produced, attempts }) => {
				assert_eq!(requested, 5);
				assert!(produced <= 4);
				assert_eq!(attempts, input.max_attempts());
			}
			other => panic!("expected exhaustion, got {other:?}"),
		}
	}

	#[test]
	fn test_huge_batch_fails_without_allocating() {
		let decorated = Phonology::bundled().unwrap().compile(Distribution::Zipf).unwrap();
		let input = BatchInput::new(usize::MAX / 8, 1).unwrap();
		let mut rng = StdRng::seed_from_u64(3);
		assert!(matches!(
			generate_batch(&decorated, &input, &mut rng),
			Err(Error::Exhausted { produced: 0, attempts: 0, .. })
		));
	}

	#[test]
	fn test_large_batch_preallocates_a_bounded_amount() {
		let decorated = Phonology::bundled().unwrap().compile(Distribution::Zipf).unwrap();
		let mut input = BatchInput::new(MAX_PREALLOCATED_WORDS * 2, 3).unwrap();
		input.deduplicate = false;
		let words = generate_batch(&decorated, &input, &mut StdRng::seed_from_u64(3)).unwrap();
		assert_eq!(words.len(), MAX_PREALLOCATED_WORDS * 2);
	}

	#[test]
	fn test_batch_without_dedup_allows_repeats() {
		let decorated = phonology(&["C"], &[("C", &["k"])]).compile(Distribution::Zipf).unwrap();
		let mut input = BatchInput::new(3, 2).unwrap();
		input.deduplicate = false;
		let mut rng = StdRng::seed_from_u64(3);
		let words = generate_batch(&decorated, &input, &mut rng).unwrap();
		assert_eq!(words, vec!["kk", "kk", "kk"]);
	}

	#[test]
	fn test_batch_sorting() {
		let decorated = phonology(&["CV", "CVC"], &[("C", &["k", "t", "s", "m"]), ("V", &["a", "i", "u"])])
			.compile(Distribution::Poisson)
			.unwrap();
		let mut input = BatchInput::new(20, 2).unwrap();
		input.sort = true;
		let mut rng = StdRng::seed_from_u64(11);
		let words = generate_batch(&decorated, &input, &mut rng).unwrap();
		assert!(words.windows(2).all(|pair| pair[0] <= pair[1]));
	}

	#[test]
	fn test_seeded_batches_are_reproducible() {
		let decorated = Phonology::bundled().unwrap().compile(Distribution::Zipf).unwrap();
		let input = BatchInput::new(10, 2).unwrap();
		let first = generate_batch(&decorated, &input, &mut StdRng::seed_from_u64(99)).unwrap();
		let second = generate_batch(&decorated, &input, &mut StdRng::seed_from_u64(99)).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn test_generator_facade() {
		let mut generator = Generator::with_phonologies([
			("cv".to_owned(), phonology(&["CV"], &[("C", &["k", "t"]), ("V", &["a", "i"])])),
		])
		.seeded(5);
		assert_eq!(generator.get_phonology_names(), vec!["cv"]);

		let decorated = generator.compile("cv", Distribution::Zipf).unwrap();
		let input = generator.make_batch_input(2, 1).unwrap();
		let words = generator.generate_batch(&decorated, &input).unwrap();
		assert_eq!(words.len(), 2);
		assert_eq!(generator.generate_word(&decorated, 3).unwrap().len(), 6);

		assert!(matches!(generator.compile("missing", Distribution::Zipf), Err(Error::Validation(_))));
	}

	#[test]
	fn test_seeded_generators_agree() {
		let build = || {
			Generator::with_phonologies([("wizard".to_owned(), Phonology::bundled().unwrap())]).seeded(21)
		};
		let (mut a, mut b) = (build(), build());
		let decorated = a.compile("wizard", Distribution::Poisson).unwrap();
		let input = BatchInput::new(8, 3).unwrap();
		assert_eq!(a.generate_batch(&decorated, &input).unwrap(), b.generate_batch(&decorated, &input).unwrap());
	}
}

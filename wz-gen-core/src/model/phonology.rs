use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::weighted_set::WeightedSet;
use super::weights::{Distribution, WeightProvider};
use crate::error::{Error, Result};
use crate::io::read_file;

/// Phonology shipped with the crate, used when no source file is given.
pub const BUNDLED_PHONOLOGY: &str = include_str!("../../data/wizard_names.yml");

fn default_language() -> String {
	"Unnamed".to_owned()
}

/// A list of candidates and the shape parameter `q` of their distribution.
///
/// Used for the syllable templates (`vals` are templates such as `"CVC"`)
/// and for each category (`vals` are phonemes).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Inventory {
	pub vals: Vec<String>,
	pub q: f64,
}

/// Declarative description of a language's sounds and syllable shapes.
///
/// Every character of a syllable template is a category label which must be
/// a key of `elements`.
///
/// ```yaml
/// language: Wizard
/// syllables:
///   vals: [CV, CVC]
///   q: 0.7
/// elements:
///   C: { vals: [k, t], q: 0.7 }
///   V: { vals: [a, i], q: 0.7 }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Phonology {
	#[serde(default = "default_language")]
	pub language: String,
	pub syllables: Inventory,
	pub elements: BTreeMap<String, Inventory>,
}

impl Phonology {
	/// Parses and validates a YAML phonology document.
	///
	/// # Errors
	/// Returns a format error if the document is malformed, if `syllables`
	/// or `elements` is missing, or if a template references an undeclared
	/// category.
	pub fn from_yaml_str(contents: &str) -> Result<Self> {
		let phonology: Phonology = serde_yaml::from_str(contents)?;
		phonology.validate()?;
		Ok(phonology)
	}

	/// Loads a phonology from a YAML file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let contents = read_file(&path)?;
		debug!("Loaded phonology source {}", path.as_ref().display());
		Self::from_yaml_str(&contents)
	}

	/// The default Wizard phonology.
	pub fn bundled() -> Result<Self> {
		Self::from_yaml_str(BUNDLED_PHONOLOGY)
	}

	/// Checks that every template label is declared.
	pub fn validate(&self) -> Result<()> {
		match self.labels().into_iter().find(|label| self.category(*label).is_none()) {
			Some(label) => Err(Error::Format(format!(
				"category `{label}` is used by a syllable template but missing from `elements`"
			))),
			None => Ok(()),
		}
	}

	/// Distinct category labels referenced across all templates.
	pub fn labels(&self) -> BTreeSet<char> {
		self.syllables.vals.iter().flat_map(|template| template.chars()).collect()
	}

	fn category(&self, label: char) -> Option<&Inventory> {
		self.elements.get(&label.to_string())
	}

	/// Compiles the phonology with a fresh weight cache.
	pub fn compile(&self, distribution: Distribution) -> Result<DecoratedPhonology> {
		self.compile_with(distribution, &mut WeightProvider::new())
	}

	/// Computes every weight vector needed for sampling.
	///
	/// - One vector over the syllable templates
	/// - One vector per distinct category referenced by a template
	///
	/// `self` is left untouched, so the same phonology can be compiled
	/// under several distributions.
	///
	/// # Errors
	/// - Lookup error if a template references an undeclared category
	/// - Validation error if a list is empty or a `q` is invalid
	pub fn compile_with(&self, distribution: Distribution, provider: &mut WeightProvider) -> Result<DecoratedPhonology> {
		let template_weights = provider.weights(self.syllables.vals.len(), self.syllables.q, distribution)?;
		let templates = WeightedSet::new(self.syllables.vals.clone(), template_weights)?;

		let mut categories = BTreeMap::new();
		for label in self.labels() {
			let inventory = self.category(label).ok_or(Error::UnknownCategory(label))?;
			let weights = provider.weights(inventory.vals.len(), inventory.q, distribution)?;
			categories.insert(label, WeightedSet::new(inventory.vals.clone(), weights)?);
		}

		debug!(
			"Compiled {} language under {}: {} templates, {} categories",
			self.language,
			distribution,
			templates.len(),
			categories.len()
		);

		Ok(DecoratedPhonology {
			language: self.language.clone(),
			distribution,
			templates,
			categories,
		})
	}
}

/// A phonology with its weight vectors attached, ready for sampling.
///
/// Built by [`Phonology::compile`]; never hand-edited.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DecoratedPhonology {
	language: String,
	distribution: Distribution,
	templates: WeightedSet,
	categories: BTreeMap<char, WeightedSet>,
}

impl DecoratedPhonology {
	pub fn language(&self) -> &str {
		&self.language
	}

	pub fn distribution(&self) -> Distribution {
		self.distribution
	}

	/// Weighted syllable templates.
	pub fn templates(&self) -> &WeightedSet {
		&self.templates
	}

	/// Weighted phonemes of a category, if any template uses it.
	pub fn category(&self, label: char) -> Option<&WeightedSet> {
		self.categories.get(&label)
	}

	/// Upper bound on the number of distinct words of `syllables` syllables.
	///
	/// Different phoneme sequences can concatenate to the same string, so
	/// the real count may be lower. Saturates at `u128::MAX`.
	pub fn combinations(&self, syllables: usize) -> u128 {
		let per_syllable = self
			.templates
			.values()
			.iter()
			.map(|template| {
				template
					.chars()
					.filter_map(|label| self.categories.get(&label))
					.fold(1u128, |acc, set| acc.saturating_mul(set.len() as u128))
			})
			.fold(0u128, u128::saturating_add);

		per_syllable.saturating_pow(u32::try_from(syllables).unwrap_or(u32::MAX))
	}
}

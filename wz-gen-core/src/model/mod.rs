//! Top-level module for the word generation system.
//!
//! - Weight vectors and their cache (`WeightProvider`)
//! - Declarative and compiled phonologies (`Phonology`, `DecoratedPhonology`)
//! - Weighted sampling of candidates (`WeightedSet`)
//! - Batch configuration (`BatchInput`)
//! - Word generation and the high-level `Generator`

/// Sampling, batch assembly and the high-level generator.
///
/// Exposes phonology loading from a directory, seeded random sources and
/// bounded deduplication.
pub mod generator;

/// Declarative phonology, YAML loading and compilation into weighted form.
pub mod phonology;

/// Weight vectors under the supported distributions, with memoization.
pub mod weights;

/// Candidates paired with weights, supporting weighted random sampling.
pub mod weighted_set;

/// Batch shape, deduplication and sorting policy, attempt bound.
pub mod batch_input;

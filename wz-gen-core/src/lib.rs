//! Procedural word generation driven by a declarative phonology.
//!
//! This crate provides:
//! - Weight vectors under Poisson-like or Zipf-like distributions
//! - YAML phonologies compiled into weighted, sampleable form
//! - Word and batch generation with deduplication, sorting and seeding
//! - A one-shot session entry point formatting a human-readable report

/// Error taxonomy shared by every operation of the crate.
pub mod error;

/// Phonologies, weights and generation logic.
pub mod model;

/// Load, compile, generate and format in one call.
pub mod session;

/// I/O utilities (file loading, directory listing).
pub mod io;

pub use error::{Error, ErrorKind, Result};
pub use model::batch_input::BatchInput;
pub use model::generator::Generator;
pub use model::phonology::{DecoratedPhonology, Inventory, Phonology};
pub use model::weights::{Distribution, WeightProvider};
pub use session::{run, run_with_rng, SessionOptions, SessionReport};

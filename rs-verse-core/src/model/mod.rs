//! Word-level Markov generation.
//!
//! This module provides:
//! - The bigram key and sentence boundary (`Bigram`, `DELIM`)
//! - The immutable model with its successor maps (`BigramModel`)
//! - Token positions for seeded generation (`WordIndex`)
//! - Generation parameters (`GeneratorConfig`)
//! - The generation state machine (`Generator`)

/// Case-insensitive pair of adjacent tokens and the boundary token.
pub mod bigram;

/// Order-2 model: token stream plus forward and backward successor maps.
///
/// Supports building from sentences, loading from disk with a binary
/// cache, merging and canonical serialization.
pub mod bigram_model;

/// Token to positions lookup derived from a model.
pub mod word_index;

/// Validated generation parameters.
pub mod generator_config;

/// Forward, backward, centered and syllable-budgeted walks.
pub mod generator;

pub use bigram::{Bigram, DELIM};
pub use bigram_model::BigramModel;
pub use generator::Generator;
pub use generator_config::GeneratorConfig;
pub use word_index::WordIndex;

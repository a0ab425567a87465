//! Bigram-based verse generation library.
//!
//! This crate provides a word-level Markov generator coupled with a
//! pronunciation-based rhyme index, including:
//! - Order-2 (bigram key) models with forward and backward successor maps
//! - Directed random walks: centered, forward, backward, syllable-budgeted
//! - Rhyme keys extracted from CMU-style phonetic dictionaries
//! - Poem, haiku and song composition on top of both
//! - Corpus cleaning, post-processing and model persistence
//!
//! Models and rhyme indexes are immutable values once built. The only
//! mutable state lives in the `Generator` (its RNG).

/// Error and result types shared by every module.
pub mod error;

/// Bigram models, word index and the generator state machine.
///
/// Exposes model building, persistence, merging and every generation mode.
pub mod model;

/// Pronunciation dictionary parsing and rhyme lookup.
pub mod rhyme;

/// Poems, haiku and songs built from a generator and a rhyme index.
pub mod composer;

/// Part-of-speech tagging used to judge sentence endings.
pub mod tagger;

/// Corpus cleaning and generated-text post-processing.
pub mod text;

/// I/O utilities (file loading, path helpers, parallel corpus reading).
pub mod io;

pub use error::{Result, VerseError};

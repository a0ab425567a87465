//! Pronunciation-based rhyming.
//!
//! A word rhymes with another when both pronunciations end with the same
//! phoneme suffix, starting at a vowel. Each word maps to its suffixes
//! (longest first) and each suffix maps back to every word ending with it.

/// Dictionary line parsing and rhyme-key extraction.
pub mod phonetic;

/// The two-way word/rhyme-key index.
pub mod rhyme_index;

pub use rhyme_index::RhymeIndex;

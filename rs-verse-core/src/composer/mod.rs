//! Poems, haiku and songs.
//!
//! A [`Composer`] pairs a [`Generator`] with a [`RhymeIndex`]. All
//! randomness, rhyme shuffles included, flows from the generator's RNG.

use std::sync::Arc;

use crate::error::Result;
use crate::model::Generator;
use crate::rhyme::RhymeIndex;

/// Rhyming poems ending on a topic word.
pub mod poem;

/// Three-line 5/7/5 poems.
pub mod haiku;

/// Song lines of exact syllable counts and song templates.
pub mod song;

pub use haiku::Haiku;
pub use poem::{Poem, PoemConfig};
pub use song::{Song, SongLineSpec, SongTemplate};

/// Builds verse from a generator and a rhyme index.
pub struct Composer {
	generator: Generator,
	rhymes: Arc<RhymeIndex>,
}

impl Composer {
	pub fn new(generator: Generator, rhymes: Arc<RhymeIndex>) -> Self {
		Self { generator, rhymes }
	}

	pub fn generator(&self) -> &Generator {
		&self.generator
	}

	pub fn generator_mut(&mut self) -> &mut Generator {
		&mut self.generator
	}

	pub fn rhymes(&self) -> &RhymeIndex {
		&self.rhymes
	}

	/// Words rhyming with `word`, shuffled with the generator's RNG.
	///
	/// # Errors
	/// `UnknownWord` if `word` is not in the dictionary.
	pub fn find_rhymes(&mut self, word: &str) -> Result<Vec<String>> {
		self.rhymes.find_rhymes(word, self.generator.rng())
	}
}

use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};

use serde::{Deserialize, Serialize};

use super::bigram::{Bigram, DELIM, is_delim};
use crate::error::{Result, VerseError};
use crate::io::{build_output_path, clean_lines_parallel, read_file};

/// Order-2 Markov model over word tokens.
///
/// This struct stores:
/// - `words`: the whole corpus, each sentence prefixed with `DELIM`, plus
///   one trailing `DELIM`.
/// - `forward`: for every adjacent pair `(w[i], w[i+1])`, the observed
///   `w[i+2]` values.
/// - `backward`: for every adjacent pair `(w[i+1], w[i+2])`, the observed
///   `w[i]` values.
///
/// ## Invariants
/// - Value lists keep insertion order and duplicates (they encode frequency).
/// - Both maps hold exactly `words.len() - 2` values in total.
/// - Maps are `BTreeMap`s, so the postcard encoding of a model is canonical.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BigramModel {
	words: Vec<String>,
	forward: BTreeMap<Bigram, Vec<String>>,
	backward: BTreeMap<Bigram, Vec<String>>,
}

impl Default for BigramModel {
	/// The empty model: `words = [DELIM]` and no transitions.
	fn default() -> Self {
		Self::from_words(vec![DELIM.to_owned()])
	}
}

impl BigramModel {
	/// Builds a model from tokenized sentences.
	///
	/// # Parameters
	/// - `sentences`: any sequence of token sequences.
	///
	/// # Behavior
	/// - Empty sentences are ignored.
	/// - `DELIM` tokens found inside a sentence are dropped with a warning.
	/// - An empty input yields the empty model, which generates nothing.
	pub fn build<I, S, T>(sentences: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: IntoIterator<Item = T>,
		T: Into<String>,
	{
		let mut words = Vec::new();
		for sentence in sentences {
			let mut tokens = sentence.into_iter().map(Into::<String>::into).peekable();
			if tokens.peek().is_none() {
				continue;
			}
			words.push(DELIM.to_owned());
			for token in tokens {
				if is_delim(&token) {
					warn!("Dropping a sentence boundary token found inside a sentence");
					continue;
				}
				words.push(token);
			}
		}
		words.push(DELIM.to_owned());

		Self::from_words(words)
	}

	/// Builds the successor maps of an already delimited token stream.
	fn from_words(words: Vec<String>) -> Self {
		let mut forward: BTreeMap<Bigram, Vec<String>> = BTreeMap::new();
		let mut backward: BTreeMap<Bigram, Vec<String>> = BTreeMap::new();

		for window in words.windows(3) {
			let (a, b, c) = (&window[0], &window[1], &window[2]);
			forward.entry(Bigram::new(a, b)).or_default().push(c.clone());
			backward.entry(Bigram::new(b, c)).or_default().push(a.clone());
		}

		Self { words, forward, backward }
	}

	/// Loads a model for a corpus file, building and caching it if needed.
	///
	/// - `filepath` is a text corpus, one sentence per line.
	/// - If a sibling `.bin` exists it is decoded with `postcard` instead.
	/// - Otherwise every line is cleaned (in parallel), the model is built
	///   and written next to the corpus for fast loading.
	pub fn from_corpus_file<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let binary_data_path = build_output_path(&filepath, "bin")?;
		if binary_data_path.exists() {
			info!("Loading cached model {}", binary_data_path.display());
			return Self::load(binary_data_path);
		}

		let lines = read_file(&filepath)?;
		let sentences = clean_lines_parallel(lines);
		let model = Self::build(sentences);
		info!(
			"Built model from {}: {} tokens, {} bigrams",
			filepath.as_ref().display(),
			model.len(),
			model.forward.len()
		);
		model.save(binary_data_path)?;

		Ok(model)
	}

	/// Encodes the model with `postcard`.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(postcard::to_stdvec(self)?)
	}

	/// Decodes a model produced by [`BigramModel::to_bytes`].
	///
	/// # Errors
	/// - `Postcard` if the buffer cannot be decoded.
	/// - `InvalidFormat` if the token stream is not delimited.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		let model: Self = postcard::from_bytes(bytes)?;
		let delimited = model.words.first().is_some_and(|w| is_delim(w))
			&& model.words.last().is_some_and(|w| is_delim(w));
		if !delimited {
			return Err(VerseError::invalid_format("model", "token stream must start and end with a boundary"));
		}
		Ok(model)
	}

	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		std::fs::write(path, self.to_bytes()?)?;
		Ok(())
	}

	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		Self::from_bytes(&bytes)
	}

	/// Merges another model into this one.
	///
	/// The result equals the model built from the sentences of `self`
	/// followed by the sentences of `other`.
	pub fn merge(&mut self, other: &Self) {
		let mut words = std::mem::take(&mut self.words);
		// Both streams end and start with a boundary; keep a single one.
		words.extend(other.words.iter().skip(1).cloned());
		*self = Self::from_words(words);
	}

	/// Full token stream, boundaries included.
	pub fn words(&self) -> &[String] {
		&self.words
	}

	pub fn word(&self, index: usize) -> Option<&str> {
		self.words.get(index).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.words.len()
	}

	/// Returns `true` if the model holds no sentence at all.
	pub fn is_empty(&self) -> bool {
		self.words.len() < 3
	}

	/// Observed successors of `(first, second)`, case-insensitive.
	pub fn forward(&self, first: &str, second: &str) -> Option<&[String]> {
		self.forward.get(&Bigram::new(first, second)).map(Vec::as_slice)
	}

	/// Observed predecessors of `(first, second)`, case-insensitive.
	pub fn backward(&self, first: &str, second: &str) -> Option<&[String]> {
		self.backward.get(&Bigram::new(first, second)).map(Vec::as_slice)
	}

	pub fn contains_pair(&self, first: &str, second: &str) -> bool {
		self.forward.contains_key(&Bigram::new(first, second))
	}

	/// Number of distinct bigram keys in the forward map.
	pub fn bigram_count(&self) -> usize {
		self.forward.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sentences() -> Vec<Vec<&'static str>> {
		vec![vec!["the", "cat", "sat"], vec![], vec!["the", "cat", "ran", "!"]]
	}

	#[test]
	fn build_delimits_every_sentence() {
		let model = BigramModel::build(sentences());
		assert_eq!(
			model.words(),
			&[DELIM, "the", "cat", "sat", DELIM, "the", "cat", "ran", "!", DELIM]
		);
		assert_eq!(model.forward("the", "cat"), Some(&["sat".to_owned(), "ran".to_owned()][..]));
		assert_eq!(model.backward("the", "cat"), Some(&[DELIM.to_owned(), DELIM.to_owned()][..]));
		assert_eq!(model.forward("THE", "Cat"), model.forward("the", "cat"));
	}

	#[test]
	fn value_lists_cover_every_window() {
		let model = BigramModel::build(sentences());
		let forward_total: usize = model.forward.values().map(Vec::len).sum();
		let backward_total: usize = model.backward.values().map(Vec::len).sum();
		assert_eq!(forward_total, model.len() - 2);
		assert_eq!(backward_total, model.len() - 2);
	}

	#[test]
	fn empty_corpus_is_a_single_boundary() {
		let model = BigramModel::build(Vec::<Vec<String>>::new());
		assert_eq!(model.words(), &[DELIM]);
		assert!(model.is_empty());
		assert_eq!(model.bigram_count(), 0);
		assert_eq!(model, BigramModel::default());
	}

	#[test]
	fn boundary_tokens_inside_sentences_are_dropped() {
		let model = BigramModel::build(vec![vec!["a", DELIM, "b"]]);
		assert_eq!(model.words(), &[DELIM, "a", "b", DELIM]);
	}

	#[test]
	fn merge_equals_building_both_corpora() {
		let first = vec![vec!["howdy", "pardner"]];
		let second = vec![vec!["keep", "yer", "boots", "on"], vec!["howdy", "y'all"]];

		let mut merged = BigramModel::build(first.clone());
		merged.merge(&BigramModel::build(second.clone()));

		let whole = BigramModel::build(first.into_iter().chain(second));
		assert_eq!(merged, whole);

		let mut from_empty = BigramModel::default();
		from_empty.merge(&whole);
		assert_eq!(from_empty, whole);
	}

	#[test]
	fn encoding_is_canonical() {
		let model = BigramModel::build(sentences());
		let bytes = model.to_bytes().unwrap();
		let decoded = BigramModel::from_bytes(&bytes).unwrap();
		assert_eq!(decoded, model);
		assert_eq!(BigramModel::build(sentences()).to_bytes().unwrap(), bytes);
	}

	#[test]
	fn rejects_undelimited_streams() {
		let broken = BigramModel::from_words(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]);
		let bytes = postcard::to_stdvec(&broken).unwrap();
		assert!(matches!(BigramModel::from_bytes(&bytes), Err(VerseError::InvalidFormat { .. })));
	}
}

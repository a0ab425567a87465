use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;

use super::bigram::{DELIM, is_delim, pick};
use super::bigram_model::BigramModel;
use super::generator_config::{GeneratorConfig, validate_half_length};
use super::word_index::WordIndex;
use crate::error::{Result, VerseError};
use crate::rhyme::RhymeIndex;
use crate::tagger::{LexiconTagger, Tagger};

/// Punctuation a generated sentence must not start with.
static BAD_BEGINNING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[.!?,;]+$").expect("valid beginning pattern"));
/// Punctuation that ends a forward walk.
static GOOD_ENDING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[.!?]+$").expect("valid ending pattern"));

/// Tags a sentence must not end on.
const BAD_ENDING_TAGS: [&str; 5] = ["IN", "CC", "TO", "DT", "PRP$"];
/// Words a sentence must not end on.
const BAD_ENDING_WORDS: [&str; 8] = ["i", "she", "he", "we", "they", "i've", "it's", "just"];

/// Random draws before falling back to an exhaustive scan.
const RANDOM_DRAW_TRIES: usize = 100;
/// Resamples allowed when a predecessor overshoots the syllable budget.
const SYLLABLE_RESAMPLES: usize = 10;

/// Word-level Markov generator.
///
/// # Responsibilities
/// - Hold a shared, immutable model and its word index
/// - Own the RNG, the only mutable state of generation
/// - Walk the successor maps forward, backward or both around a seed
///
/// Every sequence returned here is free of `DELIM` unless documented
/// otherwise (the raw walks keep it so callers can see where a sentence
/// starts or stops).
///
/// Seed words given by callers are lowercased. Model keys compare
/// case-insensitively, while the word index is case-preserving.
pub struct Generator {
	model: Arc<BigramModel>,
	index: Arc<WordIndex>,
	tagger: Arc<dyn Tagger>,
	rng: StdRng,
	max_half_length: usize,
}

impl Generator {
	/// Creates a generator over `model`, building its word index.
	///
	/// The RNG is seeded from `config.seed`, or from OS entropy.
	pub fn new(model: Arc<BigramModel>, config: &GeneratorConfig) -> Self {
		let index = Arc::new(WordIndex::build(&model));
		Self::with_index(model, index, config)
	}

	/// Creates a generator sharing an existing word index.
	pub fn with_index(model: Arc<BigramModel>, index: Arc<WordIndex>, config: &GeneratorConfig) -> Self {
		let rng = match config.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		Self {
			model,
			index,
			tagger: Arc::new(LexiconTagger::default()),
			rng,
			max_half_length: config.max_half_length(),
		}
	}

	/// Replaces the default lexicon tagger.
	pub fn with_tagger(mut self, tagger: Arc<dyn Tagger>) -> Self {
		self.tagger = tagger;
		self
	}

	pub fn model(&self) -> &BigramModel {
		&self.model
	}

	/// A new handle on the shared model.
	pub fn shared_model(&self) -> Arc<BigramModel> {
		Arc::clone(&self.model)
	}

	pub fn index(&self) -> &WordIndex {
		&self.index
	}

	/// The generator's RNG, for callers that shuffle alongside it.
	pub fn rng(&mut self) -> &mut StdRng {
		&mut self.rng
	}

	pub fn max_half_length(&self) -> usize {
		self.max_half_length
	}

	/// # Errors
	/// Returns `InvalidArgument` if `max_half_length < 2`.
	pub fn set_max_half_length(&mut self, max_half_length: usize) -> Result<()> {
		validate_half_length(max_half_length)?;
		self.max_half_length = max_half_length;
		Ok(())
	}

	/// Generates a sentence around a random pair of adjacent words.
	///
	/// # Errors
	/// `NotFound` if no sentence holds two consecutive words (this covers
	/// the empty model).
	pub fn random_sentence(&mut self) -> Result<Vec<String>> {
		let seed = self.random_seed_index()?;
		let (w1, w2) = (self.model.words()[seed].clone(), self.model.words()[seed + 1].clone());
		debug!("Random sentence seeded with ({w1}, {w2})");
		Ok(self.centered_phrase(&w1, &w2))
	}

	/// Picks `i` in `[0, len - 3)` such that `words[i]` and `words[i + 1]`
	/// are both real words.
	fn random_seed_index(&mut self) -> Result<usize> {
		let words = self.model.words();
		let upper = words.len().saturating_sub(3);
		let usable = |i: usize| !is_delim(&words[i]) && !is_delim(&words[i + 1]);
		if upper == 0 {
			return Err(VerseError::NotFound("any sentence".to_owned()));
		}

		for _ in 0..RANDOM_DRAW_TRIES {
			let seed = self.rng.random_range(0..upper);
			if usable(seed) {
				return Ok(seed);
			}
		}

		let candidates: Vec<usize> = (0..upper).filter(|&i| usable(i)).collect();
		candidates
			.choose(&mut self.rng)
			.copied()
			.ok_or_else(|| VerseError::NotFound("any sentence".to_owned()))
	}

	/// Generates a sentence around a random occurrence of `seed_word`.
	///
	/// # Errors
	/// `NotFound` if the lowercased word is not in the corpus.
	pub fn random_around(&mut self, seed_word: &str) -> Result<Vec<String>> {
		let seed_word = seed_word.to_lowercase();
		let position = self.random_occurrence(&seed_word)?;
		let next = self.model.word(position + 1).unwrap_or(DELIM).to_owned();
		Ok(self.centered_phrase(&seed_word, &next))
	}

	/// Generates a sentence around the exact pair `(seed_word1, seed_word2)`.
	///
	/// # Errors
	/// `NotFound` if the pair never occurs in the corpus.
	pub fn random_around_pair(&mut self, seed_word1: &str, seed_word2: &str) -> Result<Vec<String>> {
		let (w1, w2) = (seed_word1.to_lowercase(), seed_word2.to_lowercase());
		if !self.model.contains_pair(&w1, &w2) {
			return Err(VerseError::NotFound(format!("{w1} {w2}")));
		}
		Ok(self.centered_phrase(&w1, &w2))
	}

	/// Generates a sentence starting at a random occurrence of `seed_word`.
	///
	/// # Errors
	/// `NotFound` if the lowercased word is not in the corpus.
	pub fn random_forwards(&mut self, seed_word: &str) -> Result<Vec<String>> {
		let seed_word = seed_word.to_lowercase();
		let position = self.random_occurrence(&seed_word)?;
		let next = self.model.word(position + 1).unwrap_or(DELIM).to_owned();
		let mut phrase = self.forward_walk(&seed_word, &next);
		phrase.retain(|w| !is_delim(w));
		Ok(phrase)
	}

	/// Extends the pair `(w1, w2)` both ways.
	///
	/// The backward half is bounded by `max_half_length`; the seed pair
	/// appears once and `DELIM` never appears.
	pub fn centered_phrase(&mut self, w1: &str, w2: &str) -> Vec<String> {
		let mut phrase = self.backward_walk(w1, w2, 0, self.max_half_length);
		let forward = self.forward_walk(w1, w2);
		phrase.extend(forward.into_iter().skip(2));
		phrase.retain(|w| !is_delim(w));
		phrase
	}

	/// Walks forward from `(w1, w2)`; the result starts with the pair.
	///
	/// Stops on a missing transition, on `DELIM` (not appended) or when
	/// [`check_end_condition`](Self::check_end_condition) holds. The result
	/// holds at most `max_half_length + 1` tokens.
	pub fn forward_walk(&mut self, w1: &str, w2: &str) -> Vec<String> {
		if is_delim(w2) {
			return vec![w1.to_owned(), DELIM.to_owned()];
		}

		let mut out = vec![w1.to_owned(), w2.to_owned()];
		let (mut first, mut second) = (w1.to_owned(), w2.to_owned());
		while out.len() <= self.max_half_length {
			let Some(next) = self
				.model
				.forward(&first, &second)
				.and_then(|list| pick(list, &mut self.rng))
				.map(str::to_owned)
			else {
				break;
			};
			if is_delim(&next) {
				break;
			}

			out.push(next.clone());
			if self.check_end_condition(&out) {
				break;
			}
			first = std::mem::replace(&mut second, next);
		}

		out
	}

	/// Walks backward from `(w2, w3)`; the result ends with the pair.
	///
	/// Extends while the sequence is no longer than `min_len` or shorter
	/// than `max_len`, counting a reached `DELIM`. A trailing `DELIM` and
	/// then a leading punctuation token are removed afterwards.
	///
	/// # Notes
	/// - `max_len == 2` or `w2 == DELIM` returns the pair untouched.
	/// - A missing transition returns the sequence as is; callers check
	///   the length they need.
	pub fn backward_walk(&mut self, w2: &str, w3: &str, min_len: usize, max_len: usize) -> Vec<String> {
		if max_len == 2 || is_delim(w2) {
			return vec![w2.to_owned(), w3.to_owned()];
		}

		// Built in reverse, flipped once at the end.
		let mut out = vec![w3.to_owned(), w2.to_owned()];
		let (mut second, mut third) = (w2.to_owned(), w3.to_owned());
		while out.len() <= min_len || out.len() < max_len {
			let Some(prev) = self
				.model
				.backward(&second, &third)
				.and_then(|list| pick(list, &mut self.rng))
				.map(str::to_owned)
			else {
				out.reverse();
				return out;
			};

			out.push(prev.clone());
			if Self::check_begin_condition(&out) {
				break;
			}
			third = std::mem::replace(&mut second, prev);
		}

		Self::trim_reversed_beginning(&mut out);
		out.reverse();
		out
	}

	/// Walks backward from `(w2, w3)` until `target_syllables` is reached.
	///
	/// Syllables come from `rhymes`; words outside the dictionary count
	/// for nothing. A predecessor overshooting the remaining budget is
	/// redrawn up to ten times, so the total may still overshoot. The
	/// result is free of `DELIM`, so it holds only `w3` when `w2` is a
	/// boundary.
	pub fn backward_syllables(&mut self, w2: &str, w3: &str, target_syllables: usize, rhymes: &RhymeIndex) -> Vec<String> {
		let syllables = |word: &str| rhymes.syllables(word).unwrap_or(0);

		let mut so_far = syllables(w2) + syllables(w3);
		if so_far >= target_syllables || is_delim(w2) {
			let mut pair = vec![w2.to_owned(), w3.to_owned()];
			pair.retain(|w| !is_delim(w));
			return pair;
		}

		let mut out = vec![w3.to_owned(), w2.to_owned()];
		let (mut second, mut third) = (w2.to_owned(), w3.to_owned());
		while so_far < target_syllables {
			let Some(list) = self.model.backward(&second, &third) else {
				break;
			};
			let budget = target_syllables - so_far;
			let mut prev = pick(list, &mut self.rng).unwrap_or(DELIM);
			for _ in 0..SYLLABLE_RESAMPLES {
				if syllables(prev) <= budget {
					break;
				}
				prev = pick(list, &mut self.rng).unwrap_or(DELIM);
			}
			let prev = prev.to_owned();

			so_far += syllables(&prev);
			out.push(prev.clone());
			if Self::check_begin_condition(&out) {
				break;
			}
			third = std::mem::replace(&mut second, prev);
		}

		Self::trim_reversed_beginning(&mut out);
		out.reverse();
		out.retain(|w| !is_delim(w));
		out
	}

	/// Generates a line ending with `word`, bounded by `max_half_length`.
	pub fn ending_at(&mut self, word: &str) -> Result<Vec<String>> {
		self.backward_ending_at(word, 0, self.max_half_length)
	}

	/// Generates a line of `min..=max` tokens ending with `word`.
	///
	/// # Errors
	/// - `NotFound` if the lowercased word is not in the corpus.
	/// - `UnderBudget` if the walk ended outside of the bounds; another
	///   attempt may succeed.
	pub fn backward_ending_at(&mut self, word: &str, min: usize, max: usize) -> Result<Vec<String>> {
		let word = word.to_lowercase();
		let position = self.random_occurrence(&word)?;
		let Some(prev) = position.checked_sub(1).and_then(|p| self.model.word(p)).map(str::to_owned) else {
			return Err(VerseError::NotFound(word));
		};

		let mut line = self.backward_walk(&prev, &word, min, max);
		line.retain(|w| !is_delim(w));
		if line.len() < min || line.len() > max {
			debug!("Line ending with '{word}' has {} tokens, wanted {min} to {max}", line.len());
			return Err(VerseError::UnderBudget { word, min, max });
		}
		Ok(line)
	}

	/// Generates a line of about `target_syllables` ending with `word`.
	///
	/// A word that alone fills the budget, or that opens its sentence, is
	/// returned by itself. The result is free of `DELIM`.
	///
	/// # Errors
	/// `NotFound` if the lowercased word is not in the corpus.
	pub fn backward_syllables_ending_at(&mut self, word: &str, target_syllables: usize, rhymes: &RhymeIndex) -> Result<Vec<String>> {
		let word = word.to_lowercase();
		let position = self.random_occurrence(&word)?;
		if rhymes.syllables(&word).unwrap_or(0) >= target_syllables {
			return Ok(vec![word]);
		}
		let prev = position
			.checked_sub(1)
			.and_then(|p| self.model.word(p))
			.unwrap_or(DELIM)
			.to_owned();
		let mut line = self.backward_syllables(&prev, &word, target_syllables, rhymes);
		line.retain(|w| !is_delim(w));
		Ok(line)
	}

	/// Every distinct pair `(words[p - 1], word)` for occurrences `p > 0`
	/// of the lowercased word, in corpus order.
	pub fn pairs_ending_with(&self, word: &str) -> Vec<(String, String)> {
		let word = word.to_lowercase();
		let Some(positions) = self.index.positions(&word) else {
			return Vec::new();
		};

		let mut seen = HashSet::new();
		positions
			.iter()
			.filter(|&&p| p > 0)
			.map(|&p| (self.model.words()[p - 1].clone(), word.clone()))
			.filter(|pair| seen.insert(pair.clone()))
			.collect()
	}

	/// Picks a uniform token from the corpus, never `DELIM`.
	///
	/// # Errors
	/// `NotFound` on an empty model.
	pub fn random_word(&mut self) -> Result<String> {
		let words = self.model.words();
		let upper = words.len().saturating_sub(3);
		if upper > 0 {
			for _ in 0..RANDOM_DRAW_TRIES {
				let word = &words[self.rng.random_range(0..upper)];
				if !is_delim(word) {
					return Ok(word.clone());
				}
			}
		}

		let candidates: Vec<&String> = words.iter().filter(|w| !is_delim(w)).collect();
		candidates
			.choose(&mut self.rng)
			.map(|w| (*w).clone())
			.ok_or_else(|| VerseError::NotFound("any word".to_owned()))
	}

	/// `true` if `sequence` reads as a complete sentence ending.
	///
	/// Rejects endings tagged as preposition, conjunction, infinitive
	/// "to", determiner or possessive pronoun, a few dangling words and
	/// anything ending with a comma.
	pub fn is_decent_ending(&self, sequence: &[String]) -> bool {
		let Some(last) = sequence.last() else {
			return false;
		};

		let tags = self.tagger.tag(sequence);
		if tags.last().is_some_and(|tag| BAD_ENDING_TAGS.contains(&tag.as_str())) {
			return false;
		}

		let last = last.to_lowercase();
		!(BAD_ENDING_WORDS.contains(&last.as_str()) || last.ends_with(','))
	}

	/// Stop condition of a forward walk.
	pub fn check_end_condition(&self, sequence: &[String]) -> bool {
		let Some(last) = sequence.last() else {
			return false;
		};
		sequence.len() >= self.max_half_length
			|| is_delim(last)
			|| GOOD_ENDING.is_match(last)
			|| (sequence.len() > self.max_half_length / 2 && self.is_decent_ending(sequence))
	}

	/// Stop condition of a backward walk: the last pushed token is `DELIM`.
	fn check_begin_condition(reversed: &[String]) -> bool {
		reversed.last().is_some_and(|w| is_delim(w))
	}

	/// Drops a reached `DELIM`, then a punctuation token left in front.
	///
	/// `reversed` is a backward walk before its final flip; the seed pair
	/// is never removed.
	fn trim_reversed_beginning(reversed: &mut Vec<String>) {
		if reversed.len() > 2 && reversed.last().is_some_and(|w| is_delim(w)) {
			reversed.pop();
		}
		if reversed.len() > 2 && reversed.last().is_some_and(|w| BAD_BEGINNING.is_match(w)) {
			reversed.pop();
		}
	}

	fn random_occurrence(&mut self, word: &str) -> Result<usize> {
		self.index
			.positions(word)
			.and_then(|positions| positions.choose(&mut self.rng))
			.copied()
			.ok_or_else(|| VerseError::NotFound(word.to_owned()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cowboys() -> Arc<BigramModel> {
		Arc::new(BigramModel::build(vec![
			vec!["howdy", "y'all", ".", "How", "are", "ya", "?"],
			vec![",", "howdy", "pardner"],
			vec!["keep", "yer", "!", "boots", "on"],
			vec![".", "I", "reckon"],
			vec!["who", "poisoned", "the", "water", "hole"],
		]))
	}

	fn generator(seed: u64) -> Generator {
		let config = GeneratorConfig::new(10, Some(seed)).unwrap();
		Generator::new(cowboys(), &config)
	}

	fn owned(tokens: &[&str]) -> Vec<String> {
		tokens.iter().map(|t| (*t).to_owned()).collect()
	}

	#[test]
	fn backward_walk_respects_max_length() {
		let mut generator = generator(1);
		assert_eq!(generator.backward_walk("How", "are", 0, 4), owned(&["y'all", ".", "How", "are"]));
		// A leading period is dropped.
		assert_eq!(generator.backward_walk("How", "are", 0, 3), owned(&["How", "are"]));
		assert_eq!(generator.backward_walk("How", "are", 0, 2), owned(&["How", "are"]));
		assert_eq!(generator.backward_walk(DELIM, "howdy", 0, 4), owned(&[DELIM, "howdy"]));
	}

	#[test]
	fn backward_walk_stops_at_sentence_start() {
		let mut generator = generator(2);
		assert_eq!(
			generator.backward_walk("How", "are", 0, 10),
			owned(&["howdy", "y'all", ".", "How", "are"])
		);
		assert_eq!(generator.backward_walk("howdy", "pardner", 0, 10), owned(&["howdy", "pardner"]));
	}

	#[test]
	fn forward_walk_stops_on_punctuation() {
		let mut generator = generator(3);
		assert_eq!(generator.forward_walk(DELIM, "keep"), owned(&[DELIM, "keep", "yer", "!"]));
		assert_eq!(generator.forward_walk("pardner", DELIM), owned(&["pardner", DELIM]));
		assert_eq!(generator.forward_walk("How", "are"), owned(&["How", "are", "ya", "?"]));
	}

	#[test]
	fn forward_walk_is_capped() {
		let model = Arc::new(BigramModel::build(vec![vec!["a", "b", "a", "b", "a", "b", "a", "b", "a", "b"]]));
		let config = GeneratorConfig::new(4, Some(5)).unwrap();
		let mut generator = Generator::new(model, &config);
		for _ in 0..50 {
			let walk = generator.forward_walk("a", "b");
			assert!(walk.len() <= 5, "{walk:?}");
			assert_eq!(&walk[..2], &["a", "b"]);
		}
	}

	#[test]
	fn centered_phrase_joins_both_halves() {
		let mut generator = generator(4);
		assert_eq!(
			generator.centered_phrase("How", "are"),
			owned(&["howdy", "y'all", ".", "How", "are", "ya", "?"])
		);
	}

	#[test]
	fn random_around_lowercases_seed() {
		let mut generator = generator(5);
		assert_eq!(generator.random_around("PARDNER").unwrap(), owned(&["howdy", "pardner"]));
		assert!(matches!(generator.random_around("sheriff"), Err(VerseError::NotFound(_))));
	}

	#[test]
	fn random_around_pair_requires_the_pair() {
		let mut generator = generator(6);
		assert_eq!(
			generator.random_around_pair("Boots", "ON").unwrap(),
			owned(&["keep", "yer", "!", "boots", "on"])
		);
		assert!(generator.random_around_pair("on", "boots").is_err());
	}

	#[test]
	fn random_sentence_never_holds_boundaries() {
		let mut generator = generator(7);
		for _ in 0..50 {
			let sentence = generator.random_sentence().unwrap();
			assert!(sentence.len() >= 2);
			assert!(sentence.iter().all(|w| !is_delim(w)));
		}
	}

	#[test]
	fn random_sentence_on_empty_model() {
		let config = GeneratorConfig::default();
		let mut generator = Generator::new(Arc::new(BigramModel::default()), &config);
		assert!(matches!(generator.random_sentence(), Err(VerseError::NotFound(_))));
		assert!(generator.random_word().is_err());
		assert!(generator.random_around("anything").is_err());
	}

	#[test]
	fn pairs_ending_with_are_distinct() {
		let model = Arc::new(BigramModel::build(vec![vec!["go", "home"], vec!["go", "home"], vec!["come", "home"]]));
		let generator = Generator::new(model, &GeneratorConfig::default());
		assert_eq!(generator.pairs_ending_with("HOME"), vec![
			("go".to_owned(), "home".to_owned()),
			("come".to_owned(), "home".to_owned())
		]);
		assert!(generator.pairs_ending_with("away").is_empty());
	}

	#[test]
	fn decent_endings() {
		let generator = generator(8);
		assert!(generator.is_decent_ending(&owned(&["it", "was", "I", "who", "found", "the", "lamp"])));
		assert!(generator.is_decent_ending(&owned(&["this", "is", "funny"])));
		assert!(!generator.is_decent_ending(&owned(&["what", "kind", "of", "thing", "is", "this", "and"])));
		assert!(!generator.is_decent_ending(&owned(&["what", "kind", "of", "thing", "is", "her"])));
		assert!(!generator.is_decent_ending(&owned(&["who", "found", "the", "lamp", "?", "it", "was", "I"])));
		assert!(!generator.is_decent_ending(&owned(&["...", "just"])));
		assert!(!generator.is_decent_ending(&owned(&["well", "sure,"])));
		assert!(!generator.is_decent_ending(&[]));
	}

	#[test]
	fn same_seed_same_output() {
		let (mut a, mut b) = (generator(42), generator(42));
		for _ in 0..20 {
			assert_eq!(a.random_sentence().unwrap(), b.random_sentence().unwrap());
			assert_eq!(a.random_word().unwrap(), b.random_word().unwrap());
		}
	}

	#[test]
	fn random_forwards_starts_with_the_seed() {
		let mut generator = generator(10);
		assert_eq!(generator.random_forwards("KEEP").unwrap(), owned(&["keep", "yer", "!"]));
		assert_eq!(generator.random_forwards("pardner").unwrap(), owned(&["pardner"]));
		assert!(matches!(generator.random_forwards("sheriff"), Err(VerseError::NotFound(_))));
	}

	struct ConjunctionTagger;

	impl Tagger for ConjunctionTagger {
		fn tag(&self, tokens: &[String]) -> Vec<String> {
			tokens.iter().map(|_| "CC".to_owned()).collect()
		}
	}

	#[test]
	fn custom_tagger_judges_endings() {
		let funny = owned(&["this", "is", "funny"]);
		let generator = generator(11);
		assert!(generator.is_decent_ending(&funny));

		let generator = generator.with_tagger(Arc::new(ConjunctionTagger));
		assert!(!generator.is_decent_ending(&funny));
	}

	#[test]
	fn half_length_is_validated() {
		let mut generator = generator(12);
		assert!(matches!(generator.set_max_half_length(1), Err(VerseError::InvalidArgument { .. })));
		assert_eq!(generator.max_half_length(), 10);
		generator.set_max_half_length(3).unwrap();
		assert_eq!(generator.max_half_length(), 3);
	}

	#[test]
	fn random_word_skips_boundaries() {
		let mut generator = generator(9);
		for _ in 0..100 {
			assert!(!is_delim(&generator.random_word().unwrap()));
		}
	}
}

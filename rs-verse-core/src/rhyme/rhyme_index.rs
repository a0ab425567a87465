use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info, log_enabled, warn, Level};
use rand::Rng;
use rand::seq::SliceRandom;

use serde::{Deserialize, Serialize};

use super::phonetic::{count_syllables, parse_dictionary_line, read_vowels, rhyme_keys, strip_homograph_suffix};
use crate::error::{Result, VerseError};

/// Two-way index between words and rhyme keys.
///
/// This struct manages:
/// - `vowels`: phonemes counted as syllable nuclei.
/// - `word_to_rhymes`: for each lowercased word, its rhyme keys sorted by
///   decreasing length, without duplicates. Among keys of equal length,
///   pronunciations loaded earlier come first.
/// - `rhyme_to_words`: for each key, every word whose list holds it.
/// - `syllables`: syllable count of the first pronunciation loaded.
///
/// Load custom dictionaries before the main one so their pronunciations
/// take precedence on ties.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RhymeIndex {
	vowels: BTreeSet<String>,
	word_to_rhymes: HashMap<String, Vec<String>>,
	rhyme_to_words: HashMap<String, Vec<String>>,
	syllables: HashMap<String, usize>,
}

impl RhymeIndex {
	/// Creates an empty index for the given vowel set.
	pub fn new(vowels: BTreeSet<String>) -> Self {
		Self { vowels, ..Self::default() }
	}

	/// Builds an index from a phoneme-class file and dictionaries.
	///
	/// # Parameters
	/// - `phones_path`: phoneme-class table; only `vowel` rows matter.
	/// - `dictionary_paths`: dictionaries in load order, custom ones first.
	///
	/// # Errors
	/// - `Io` if a file cannot be read.
	/// - `InvalidFormat` if the class table lists no vowel.
	pub fn from_files<P, D>(phones_path: P, dictionary_paths: &[D]) -> Result<Self>
	where
		P: AsRef<Path>,
		D: AsRef<Path>,
	{
		let vowels = read_vowels(BufReader::new(File::open(&phones_path)?))?;
		if vowels.is_empty() {
			return Err(VerseError::invalid_format(phones_path.as_ref().display().to_string(), "no vowel phoneme"));
		}

		let mut index = Self::new(vowels);
		for path in dictionary_paths {
			let added = index.add_dictionary(BufReader::new(File::open(path)?))?;
			info!("Loaded {} pronunciations from {}", added, path.as_ref().display());
		}
		info!("Rhyme index holds {} words and {} rhyme keys", index.len(), index.rhyme_to_words.len());
		Ok(index)
	}

	/// Adds every pronunciation of a CMU-style dictionary.
	///
	/// Returns the number of pronunciations added. Comments, blank lines
	/// and vowel-less pronunciations are skipped; lines without phonemes
	/// are skipped with a warning.
	pub fn add_dictionary<R: BufRead>(&mut self, reader: R) -> Result<usize> {
		let mut added = 0;
		for (number, line) in reader.lines().enumerate() {
			let line = line?;
			match parse_dictionary_line(&line) {
				Some((headword, phonemes)) => {
					if self.add_pronunciation(headword, &phonemes) {
						added += 1;
					}
				}
				None if line.split_whitespace().count() == 1 => {
					warn!("Skipping dictionary line {}: no phoneme for '{}'", number + 1, line.trim());
				}
				None => (),
			}
		}
		Ok(added)
	}

	/// Adds one pronunciation of `headword` (stress digits already stripped).
	///
	/// The headword is lowercased and loses its homograph suffix. A second
	/// pronunciation of a known word merges its keys into the existing list.
	///
	/// Returns `false`, leaving the index untouched, when the pronunciation
	/// holds no vowel and so cannot rhyme.
	pub fn add_pronunciation(&mut self, headword: &str, phonemes: &[String]) -> bool {
		let word = strip_homograph_suffix(headword).to_lowercase();
		let keys = rhyme_keys(phonemes, &self.vowels);
		if keys.is_empty() {
			debug!("Skipping '{word}': no vowel in {}", phonemes.join(" "));
			return false;
		}

		self.syllables
			.entry(word.clone())
			.or_insert_with(|| count_syllables(phonemes, &self.vowels));

		let known = self.word_to_rhymes.entry(word.clone()).or_default();
		let new_keys: Vec<String> = keys.iter().filter(|key| !known.contains(key)).cloned().collect();
		if !known.is_empty() {
			known.extend(keys);
			// Stable: earlier pronunciations keep their place among equal lengths.
			known.sort_by(|a, b| b.len().cmp(&a.len()));
			let mut seen = HashSet::new();
			known.retain(|key| seen.insert(key.clone()));
		} else {
			*known = keys;
		}

		for key in new_keys {
			self.rhyme_to_words.entry(key).or_default().push(word.clone());
		}
		true
	}

	/// Every known word sharing a rhyme key with `target`.
	///
	/// Keys are visited most specific first. The words of each key are
	/// shuffled with `rng` before being appended, and duplicates are
	/// dropped. The result holds `target` itself.
	///
	/// # Errors
	/// `UnknownWord` if `target` is not in the dictionary.
	pub fn find_rhymes<R: Rng + ?Sized>(&self, target: &str, rng: &mut R) -> Result<Vec<String>> {
		let target = target.to_lowercase();
		let keys = self
			.word_to_rhymes
			.get(&target)
			.ok_or_else(|| VerseError::UnknownWord(target.clone()))?;

		let mut seen = HashSet::new();
		let mut rhymes = Vec::new();
		for key in keys {
			let Some(words) = self.rhyme_to_words.get(key) else {
				continue;
			};
			let mut words = words.clone();
			words.shuffle(rng);
			rhymes.extend(words.into_iter().filter(|word| seen.insert(word.clone())));
		}
		debug!("{} words rhyme with '{}'", rhymes.len(), target);
		Ok(rhymes)
	}

	/// Rhyme keys of `word`, longest first.
	pub fn rhyme_keys(&self, word: &str) -> Option<&[String]> {
		self.word_to_rhymes.get(&word.to_lowercase()).map(Vec::as_slice)
	}

	/// `true` if both words are known and share at least one rhyme key.
	pub fn rhymes_with(&self, first: &str, second: &str) -> bool {
		match (self.rhyme_keys(first), self.rhyme_keys(second)) {
			(Some(a), Some(b)) => a.iter().any(|key| b.contains(key)),
			_ => false,
		}
	}

	/// Syllable count of `word`, if the dictionary knows it.
	pub fn syllables(&self, word: &str) -> Option<usize> {
		self.syllables.get(&word.to_lowercase()).copied()
	}

	pub fn is_known(&self, word: &str) -> bool {
		self.word_to_rhymes.contains_key(&word.to_lowercase())
	}

	pub fn vowels(&self) -> &BTreeSet<String> {
		&self.vowels
	}

	/// Number of known words.
	pub fn len(&self) -> usize {
		self.word_to_rhymes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.word_to_rhymes.is_empty()
	}

	/// Logs how many rhyme keys are shared by how many words.
	pub fn log_stats(&self) {
		if !log_enabled!(Level::Debug) {
			return;
		}
		let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
		for words in self.rhyme_to_words.values() {
			*histogram.entry(words.len()).or_insert(0) += 1;
		}
		for (size, count) in histogram {
			debug!("{count} rhyme keys shared by {size} words");
		}
	}

	/// Encodes the index with `postcard`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		std::fs::write(path, postcard::to_stdvec(self)?)?;
		Ok(())
	}

	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	const PHONES: &str = "AA\tvowel\nAE\tvowel\nAH\tvowel\nAO\tvowel\nER\tvowel\nEY\tvowel\nIY\tvowel\nOW\tvowel\n\
	                      B\tstop\nK\tstop\nT\tstop\nM\tnasal\nZ\tfricative\n";

	fn index(dictionaries: &[&str]) -> RhymeIndex {
		let mut index = RhymeIndex::new(read_vowels(PHONES.as_bytes()).unwrap());
		for dictionary in dictionaries {
			index.add_dictionary(dictionary.as_bytes()).unwrap();
		}
		index
	}

	fn sorted(mut words: Vec<String>) -> Vec<String> {
		words.sort();
		words
	}

	#[test]
	fn rhymes_share_the_single_rhyme() {
		let index = index(&["CURB  K ER1 B\nBLURB  B L ER1 B\nBLUR  B L ER1\nACTS  AE1 K T S\nFACTS  F AE1 K T S\n"]);
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(sorted(index.find_rhymes("curb", &mut rng).unwrap()), ["blurb", "curb"]);
		assert_eq!(sorted(index.find_rhymes("ACTS", &mut rng).unwrap()), ["acts", "facts"]);
		assert!(index.rhymes_with("curb", "blurb"));
		assert!(!index.rhymes_with("curb", "blur"));
		assert!(matches!(index.find_rhymes("zebra", &mut rng), Err(VerseError::UnknownWord(_))));
	}

	#[test]
	fn homographs_merge_in_load_order() {
		let index = index(&["TOMATO  T AH0 M EY1 T OW2\n", "TOMATO(1)  T AH0 M AA1 T OW2\n"]);
		assert_eq!(index.rhyme_keys("tomato").unwrap(), [
			"AHMEYTOW", "AHMAATOW", "MEYTOW", "MAATOW", "EYTOW", "AATOW", "TOW"
		]);
		assert_eq!(index.syllables("Tomato"), Some(3));

		let mut rng = StdRng::seed_from_u64(2);
		assert_eq!(index.find_rhymes("tomato", &mut rng).unwrap(), ["tomato"]);
	}

	#[test]
	fn vowel_less_pronunciations_are_skipped() {
		let index = index(&["HMM  HH M M\nMM  M\nMM(1)  EY1 M\n"]);
		assert!(!index.is_known("hmm"));
		assert_eq!(index.syllables("hmm"), None);
		let mut rng = StdRng::seed_from_u64(4);
		assert!(matches!(index.find_rhymes("hmm", &mut rng), Err(VerseError::UnknownWord(_))));

		// A later pronunciation with a vowel still counts.
		assert_eq!(index.rhyme_keys("mm").unwrap(), ["EYM"]);
		assert_eq!(index.syllables("mm"), Some(1));
		assert_eq!(index.find_rhymes("mm", &mut rng).unwrap(), ["mm"]);
	}

	#[test]
	fn rhymes_are_ordered_by_specificity() {
		let index = index(&["TOMATO  T AH0 M EY1 T OW2\nPOTATO  P AH0 T EY1 T OW2\nGROTTO  G R AA1 T OW0\n"]);
		let mut rng = StdRng::seed_from_u64(3);
		let rhymes = index.find_rhymes("potato", &mut rng).unwrap();
		// EYTOW is more specific than TOW, which is all grotto shares.
		assert_eq!(rhymes.last().map(String::as_str), Some("grotto"));
		assert_eq!(sorted(rhymes[..2].to_vec()), ["potato", "tomato"]);
	}

	#[test]
	fn shuffles_follow_the_seed() {
		let dictionary: String = (0..30).map(|i| format!("W{i}  B AE{i} T\n")).collect();
		let index = index(&[dictionary.as_str()]);
		let first = index.find_rhymes("w0", &mut StdRng::seed_from_u64(9)).unwrap();
		let second = index.find_rhymes("w0", &mut StdRng::seed_from_u64(9)).unwrap();
		assert_eq!(first.len(), 30);
		assert_eq!(first, second);
	}

	#[test]
	fn malformed_lines_are_skipped() {
		let index = index(&[";;; header\nALONE\n\nBAT  B AE1 T\n"]);
		assert!(index.is_known("bat"));
		assert!(!index.is_known("alone"));
		assert_eq!(index.len(), 1);
		assert_eq!(index.syllables("bat"), Some(1));
		assert_eq!(index.syllables("alone"), None);
	}

	#[test]
	fn round_trips_through_postcard() {
		let index = index(&["BAT  B AE1 T\nCAT  K AE1 T\n"]);
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("rhymes.bin");
		index.save(&path).unwrap();
		let loaded = RhymeIndex::load(&path).unwrap();
		assert_eq!(loaded.rhyme_keys("cat"), index.rhyme_keys("cat"));
		assert!(loaded.rhymes_with("bat", "cat"));
	}
}

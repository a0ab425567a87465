use std::collections::HashMap;
use std::io::BufRead;

use log::debug;

use crate::error::{Result, VerseError};

/// Assigns a Penn Treebank tag to every token of a sequence.
///
/// The generator only inspects the tag of the last token, to reject
/// endings such as prepositions or determiners.
pub trait Tagger: Send + Sync {
	/// Returns exactly one tag per token.
	fn tag(&self, tokens: &[String]) -> Vec<String>;
}

const CLOSED_CLASSES: [(&str, &[&str]); 7] = [
	(
		"IN",
		&[
			"about", "above", "across", "after", "against", "along", "among", "around", "at", "because", "before",
			"behind", "below", "beneath", "beside", "between", "beyond", "by", "despite", "during", "except", "for",
			"from", "if", "in", "inside", "into", "like", "near", "of", "off", "on", "onto", "outside", "over",
			"since", "than", "that", "through", "throughout", "toward", "towards", "under", "underneath", "unless",
			"until", "upon", "whether", "while", "with", "within", "without",
		],
	),
	("CC", &["and", "but", "or", "nor", "yet", "plus", "&"]),
	("TO", &["to"]),
	(
		"DT",
		&[
			"a", "an", "the", "this", "these", "those", "every", "each", "some", "any", "no", "all", "another",
			"either", "neither", "both",
		],
	),
	("PRP$", &["my", "your", "his", "her", "its", "our", "their", "thy"]),
	("PRP", &["i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them"]),
	("MD", &["can", "could", "may", "might", "must", "shall", "should", "will", "would"]),
];

/// Dictionary lookup tagger.
///
/// Ships with a closed-class lexicon (prepositions, conjunctions,
/// determiners, pronouns, modals). Every other word is tagged `NN`,
/// numbers `CD`, and punctuation-only tokens are tagged with themselves.
/// A Brill-style lexicon can be loaded on top.
#[derive(Clone, Debug)]
pub struct LexiconTagger {
	lexicon: HashMap<String, String>,
	default_tag: String,
}

impl Default for LexiconTagger {
	fn default() -> Self {
		let mut lexicon = HashMap::new();
		for (tag, words) in CLOSED_CLASSES {
			for word in words {
				lexicon.insert((*word).to_owned(), tag.to_owned());
			}
		}
		Self { lexicon, default_tag: "NN".to_owned() }
	}
}

impl LexiconTagger {
	/// Builds a tagger from a Brill-style lexicon only.
	///
	/// Each line is `word TAG [TAG...]`; the first tag is the most likely
	/// one and the only one kept.
	pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
		let mut tagger = Self { lexicon: HashMap::new(), default_tag: "NN".to_owned() };
		tagger.extend_from_reader(reader)?;
		Ok(tagger)
	}

	/// Adds (or overrides) entries from a Brill-style lexicon.
	///
	/// # Errors
	/// - `Io` if the reader fails.
	/// - `InvalidFormat` if a non-empty line has no tag.
	pub fn extend_from_reader<R: BufRead>(&mut self, reader: R) -> Result<()> {
		let before = self.lexicon.len();
		for (number, line) in reader.lines().enumerate() {
			let line = line?;
			let mut fields = line.split_whitespace();
			let Some(word) = fields.next() else {
				continue;
			};
			let tag = fields
				.next()
				.ok_or_else(|| VerseError::invalid_format(format!("lexicon line {}", number + 1), "missing tag"))?;
			self.lexicon.insert(word.to_owned(), tag.to_owned());
		}
		debug!("Lexicon grew from {} to {} entries", before, self.lexicon.len());
		Ok(())
	}

	fn tag_token(&self, token: &str) -> String {
		if let Some(tag) = self.lexicon.get(token) {
			return tag.clone();
		}
		if let Some(tag) = self.lexicon.get(&token.to_lowercase()) {
			return tag.clone();
		}
		if !token.is_empty() && token.chars().all(|c| c.is_ascii_punctuation()) {
			return token.to_owned();
		}
		let numeric = token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',');
		if numeric && token.chars().any(|c| c.is_ascii_digit()) {
			return "CD".to_owned();
		}
		self.default_tag.clone()
	}
}

impl Tagger for LexiconTagger {
	fn tag(&self, tokens: &[String]) -> Vec<String> {
		tokens.iter().map(|token| self.tag_token(token)).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tags(tagger: &LexiconTagger, sentence: &str) -> Vec<String> {
		let tokens: Vec<String> = sentence.split_whitespace().map(str::to_owned).collect();
		tagger.tag(&tokens)
	}

	#[test]
	fn closed_classes_are_tagged() {
		let tagger = LexiconTagger::default();
		assert_eq!(tags(&tagger, "The cat sat on her 3 mats and ran to it ."), [
			"DT", "NN", "NN", "IN", "PRP$", "CD", "NN", "CC", "NN", "TO", "PRP", "."
		]);
	}

	#[test]
	fn brill_lexicon_overrides() {
		let mut tagger = LexiconTagger::default();
		tagger.extend_from_reader("sat VBD VBN\nran VBD\n\n".as_bytes()).unwrap();
		assert_eq!(tags(&tagger, "cat sat"), ["NN", "VBD"]);

		let error = LexiconTagger::from_reader("lonely\n".as_bytes()).unwrap_err();
		assert!(matches!(error, VerseError::InvalidFormat { .. }));
	}
}

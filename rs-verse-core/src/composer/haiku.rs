use std::fmt;

use log::debug;

use super::Composer;
use crate::error::{Result, VerseError};
use crate::text::post_process;

/// Syllable targets of the three lines.
pub const HAIKU_SYLLABLES: [usize; 3] = [5, 7, 5];

/// Draws allowed to find an end word that does not rhyme.
const NON_RHYMING_TRIES: usize = 10;

/// Three lines of about 5, 7 and 5 syllables; the last ends with the topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Haiku {
	pub lines: [String; 3],
}

impl fmt::Display for Haiku {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.lines.join("\n"))
	}
}

impl Composer {
	/// Writes a haiku whose last line ends with `topic`.
	///
	/// The first two lines end with random corpus words that rhyme
	/// neither with the topic nor with each other. Syllable counts are a
	/// best effort.
	///
	/// # Errors
	/// - `TopicUnknown` if `topic` is not in the corpus.
	/// - `NotFound` if the corpus has no word to end the other lines.
	pub fn haiku(&mut self, topic: &str) -> Result<Haiku> {
		let topic = topic.to_lowercase();
		let [first_target, middle_target, last_target] = HAIKU_SYLLABLES;

		let last = match self.generator.backward_syllables_ending_at(&topic, last_target, &self.rhymes) {
			Ok(line) => line,
			Err(err) if err.is_recoverable() => return Err(VerseError::TopicUnknown(topic)),
			Err(err) => return Err(err),
		};

		let middle_word = self.random_non_rhyming_word(&[topic.as_str()])?;
		let middle = self.generator.backward_syllables_ending_at(&middle_word, middle_target, &self.rhymes)?;

		let first_word = self.random_non_rhyming_word(&[topic.as_str(), middle_word.as_str()])?;
		let first = self.generator.backward_syllables_ending_at(&first_word, first_target, &self.rhymes)?;

		Ok(Haiku { lines: [post_process(&first), post_process(&middle), post_process(&last)] })
	}

	/// Draws a corpus word that rhymes with none of `avoid`.
	///
	/// Only words holding a letter and usable as a lowercase seed are
	/// considered. After ten draws the
	/// last candidate is returned even if it rhymes.
	///
	/// # Errors
	/// `NotFound` if no draw produced a word.
	pub fn random_non_rhyming_word(&mut self, avoid: &[&str]) -> Result<String> {
		let mut candidate = None;
		for _ in 0..NON_RHYMING_TRIES {
			let word = self.generator.random_word()?.to_lowercase();
			if !word.chars().any(char::is_alphabetic) || !self.generator.index().contains(&word) {
				continue;
			}
			let rhymes = avoid.iter().any(|other| *other == word || self.rhymes.rhymes_with(other, &word));
			candidate = Some(word);
			if !rhymes {
				break;
			}
		}

		debug!("Non-rhyming end word: {candidate:?}");
		candidate.ok_or_else(|| VerseError::NotFound("a word to end a line".to_owned()))
	}
}

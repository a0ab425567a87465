use std::fmt;

use log::debug;

use serde::{Deserialize, Serialize};

use super::Composer;
use crate::error::{Result, VerseError};
use crate::text::post_process;

/// Shape of a rhyming poem.
///
/// # Invariants
/// - `line_count >= 2`: a topic line and at least one rhyming line.
/// - `max_line_length >= 2`: tokens per line, punctuation included.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PoemConfig {
	line_count: usize,
	max_line_length: usize,
}

impl Default for PoemConfig {
	fn default() -> Self {
		Self { line_count: 3, max_line_length: 6 }
	}
}

impl PoemConfig {
	pub fn new(line_count: usize, max_line_length: usize) -> Result<Self> {
		let mut config = Self::default();
		config.set_line_count(line_count)?;
		config.set_max_line_length(max_line_length)?;
		Ok(config)
	}

	pub fn line_count(&self) -> usize {
		self.line_count
	}

	pub fn max_line_length(&self) -> usize {
		self.max_line_length
	}

	/// # Errors
	/// Returns `InvalidArgument` if `line_count < 2`.
	pub fn set_line_count(&mut self, line_count: usize) -> Result<()> {
		if line_count < 2 {
			return Err(VerseError::invalid_argument("line_count", format!("must be at least 2, got {line_count}")));
		}
		self.line_count = line_count;
		Ok(())
	}

	/// # Errors
	/// Returns `InvalidArgument` if `max_line_length < 2`.
	pub fn set_max_line_length(&mut self, max_line_length: usize) -> Result<()> {
		if max_line_length < 2 {
			return Err(VerseError::invalid_argument(
				"max_line_length",
				format!("must be at least 2, got {max_line_length}"),
			));
		}
		self.max_line_length = max_line_length;
		Ok(())
	}

	/// Checks a configuration obtained through deserialization.
	pub fn validate(&self) -> Result<()> {
		Self::new(self.line_count, self.max_line_length).map(|_| ())
	}
}

/// A poem whose last line ends with the topic and the others with rhymes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poem {
	pub lines: Vec<String>,
}

impl fmt::Display for Poem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.lines.join("\n"))
	}
}

impl Composer {
	/// Writes a poem of up to `config.line_count` lines about `topic`.
	///
	/// # Behavior
	/// - The topic line is generated first and emitted last.
	/// - Rhymes are tried most specific first; a rhyme that cannot end a
	///   line is skipped.
	/// - Fewer lines than asked are returned when rhymes run out.
	///
	/// # Errors
	/// - `TopicUnknown` if no line can end with `topic`.
	/// - `UnknownWord` if `topic` is not in the dictionary.
	/// - `NoRhymes` if no other word rhymes, or none ends a line.
	pub fn poem(&mut self, topic: &str, config: &PoemConfig) -> Result<Poem> {
		let topic = topic.to_lowercase();
		let max_length = config.max_line_length();

		let topic_line = match self.generator.backward_ending_at(&topic, 0, max_length) {
			Ok(line) => line,
			Err(err) if err.is_recoverable() => return Err(VerseError::TopicUnknown(topic)),
			Err(err) => return Err(err),
		};

		let rhymes: Vec<String> = self
			.rhymes
			.find_rhymes(&topic, self.generator.rng())?
			.into_iter()
			.filter(|word| *word != topic)
			.collect();
		if rhymes.is_empty() {
			return Err(VerseError::NoRhymes(topic));
		}

		let mut lines = Vec::with_capacity(config.line_count());
		for rhyme in &rhymes {
			if lines.len() + 1 >= config.line_count() {
				break;
			}
			match self.generator.backward_ending_at(rhyme, 0, max_length) {
				Ok(line) => lines.push(post_process(&line)),
				Err(err) if err.is_recoverable() => debug!("Skipping rhyme '{rhyme}': {err}"),
				Err(err) => return Err(err),
			}
		}
		if lines.is_empty() {
			return Err(VerseError::NoRhymes(topic));
		}

		lines.push(post_process(&topic_line));
		Ok(Poem { lines })
	}
}

use std::collections::{HashSet, VecDeque};
use std::fmt;

use log::{debug, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use super::Composer;
use crate::error::{Result, VerseError};
use crate::model::BigramModel;
use crate::model::bigram::is_delim;
use crate::rhyme::RhymeIndex;
use crate::text::post_process;

/// Longest line, in tokens, the song search may build.
const MAX_LINE_DEPTH: usize = 20;
/// Predecessors tried per starting pair before giving up on it.
const MAX_EXPANSIONS: usize = 20_000;
/// Random words tried for a line with no end word constraint.
const FREE_LINE_TRIES: usize = 50;

/// One line of a song template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SongLineSpec {
	pub syllables: usize,
	/// Ends with a word rhyming with the topic.
	pub should_rhyme: bool,
	/// Ends with the topic itself.
	pub is_target: bool,
}

impl SongLineSpec {
	pub const fn new(syllables: usize, should_rhyme: bool, is_target: bool) -> Self {
		Self { syllables, should_rhyme, is_target }
	}
}

/// A named sequence of line specs, sung to a known tune.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongTemplate {
	pub name: String,
	pub lines: Vec<SongLineSpec>,
}

impl SongTemplate {
	pub fn new<S: Into<String>>(name: S, lines: Vec<SongLineSpec>) -> Self {
		Self { name: name.into(), lines }
	}

	pub fn pretty_woman() -> Self {
		Self::new("Pretty Woman", vec![
			SongLineSpec::new(4, true, true),
			SongLineSpec::new(5, true, false),
			SongLineSpec::new(4, false, false),
			SongLineSpec::new(5, false, false),
		])
	}

	pub fn all_star() -> Self {
		Self::new("All Star", vec![
			SongLineSpec::new(6, false, false),
			SongLineSpec::new(6, true, true),
			SongLineSpec::new(6, false, false),
			SongLineSpec::new(6, true, false),
		])
	}

	pub fn call_me_maybe() -> Self {
		Self::new("Call Me Maybe", vec![
			SongLineSpec::new(5, false, false),
			SongLineSpec::new(5, true, false),
			SongLineSpec::new(5, false, false),
			SongLineSpec::new(5, true, true),
		])
	}

	pub fn little_teapot() -> Self {
		Self::new("I'm a Little Teapot", vec![
			SongLineSpec::new(9, true, false),
			SongLineSpec::new(9, true, false),
			SongLineSpec::new(9, true, false),
			SongLineSpec::new(8, true, true),
		])
	}

	pub fn presets() -> Vec<Self> {
		vec![Self::pretty_woman(), Self::all_star(), Self::call_me_maybe(), Self::little_teapot()]
	}

	/// Finds a preset by (part of) its name, ignoring case and punctuation.
	pub fn by_name(name: &str) -> Option<Self> {
		let normalize = |s: &str| -> String {
			s.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
		};
		let wanted = normalize(name);
		if wanted.is_empty() {
			return None;
		}
		Self::presets().into_iter().find(|template| normalize(&template.name).contains(&wanted))
	}
}

/// A song built from a template; `None` marks a line that could not be built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
	pub tune: String,
	pub lines: Vec<Option<String>>,
}

impl Song {
	pub fn is_complete(&self) -> bool {
		self.lines.iter().all(Option::is_some)
	}
}

impl fmt::Display for Song {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "To the tune of {}", self.tune)?;
		for line in &self.lines {
			writeln!(f, "{}", line.as_deref().unwrap_or("..."))?;
		}
		Ok(())
	}
}

/// Depth-first backward search for a line of exactly `target` syllables.
struct LineSearch<'a, R: Rng> {
	model: &'a BigramModel,
	rhymes: &'a RhymeIndex,
	rng: &'a mut R,
	target: usize,
	expansions: usize,
}

impl<R: Rng> LineSearch<'_, R> {
	/// Prepends predecessors to `line` (front first) until it holds
	/// exactly `target` syllables.
	///
	/// Predecessors that are boundaries, unknown to the dictionary or
	/// over budget are never tried.
	fn extend(&mut self, line: &mut VecDeque<String>, syllables: usize) -> bool {
		if syllables == self.target {
			return true;
		}
		if line.len() >= MAX_LINE_DEPTH || self.expansions >= MAX_EXPANSIONS {
			return false;
		}
		let model = self.model;
		let Some(predecessors) = model.backward(&line[0], &line[1]) else {
			return false;
		};

		let mut seen = HashSet::new();
		let mut predecessors: Vec<&String> = predecessors.iter().filter(|w| seen.insert(w.as_str())).collect();
		predecessors.shuffle(&mut *self.rng);

		for prev in predecessors {
			if is_delim(prev) {
				continue;
			}
			let Some(count) = self.rhymes.syllables(prev) else {
				continue;
			};
			if syllables + count > self.target {
				continue;
			}

			self.expansions += 1;
			line.push_front(prev.clone());
			if self.extend(line, syllables + count) {
				return true;
			}
			line.pop_front();
			if self.expansions >= MAX_EXPANSIONS {
				return false;
			}
		}
		false
	}
}

impl Composer {
	/// Builds a line of exactly `syllables` syllables ending with `end_word`.
	///
	/// Starting pairs `(previous, end_word)` are shuffled; pairs holding a
	/// word unknown to the dictionary are skipped. The first line found wins.
	///
	/// # Errors
	/// `UnbuildableLine` if every starting pair was exhausted.
	pub fn song_line(&mut self, end_word: &str, syllables: usize) -> Result<Vec<String>> {
		let end_word = end_word.to_lowercase();
		let model = self.generator.shared_model();
		let mut starts = self.generator.pairs_ending_with(&end_word);
		starts.shuffle(self.generator.rng());

		for (w1, w2) in starts {
			let (Some(s1), Some(s2)) = (self.rhymes.syllables(&w1), self.rhymes.syllables(&w2)) else {
				continue;
			};
			if s1 + s2 > syllables {
				continue;
			}

			let mut search = LineSearch {
				model: &model,
				rhymes: &self.rhymes,
				rng: self.generator.rng(),
				target: syllables,
				expansions: 0,
			};
			let mut line = VecDeque::from([w1, w2]);
			if search.extend(&mut line, s1 + s2) {
				return Ok(line.into());
			}
			debug!("No {syllables} syllable line from {:?} after {} expansions", line, search.expansions);
		}

		Err(VerseError::UnbuildableLine { word: end_word, syllables })
	}

	/// Builds a line ending with any word that rhymes with `topic`.
	///
	/// # Errors
	/// - `UnknownWord` if `topic` is not in the dictionary.
	/// - `NoRhymes` if nothing but the topic rhymes with it.
	/// - `UnbuildableLine` if no rhyme can end such a line.
	pub fn rhyming_song_line(&mut self, topic: &str, syllables: usize) -> Result<Vec<String>> {
		let topic = topic.to_lowercase();
		let mut rhymes: Vec<String> = self
			.rhymes
			.find_rhymes(&topic, self.generator.rng())?
			.into_iter()
			.filter(|word| *word != topic)
			.collect();
		if rhymes.is_empty() {
			return Err(VerseError::NoRhymes(topic));
		}
		rhymes.shuffle(self.generator.rng());

		for rhyme in rhymes {
			match self.song_line(&rhyme, syllables) {
				Ok(line) => return Ok(line),
				Err(err) if err.is_recoverable() => continue,
				Err(err) => return Err(err),
			}
		}
		Err(VerseError::UnbuildableLine { word: topic, syllables })
	}

	/// Builds a line ending with a random known word that ends well.
	///
	/// # Errors
	/// `UnbuildableLine` if fifty random words all failed.
	pub fn free_song_line(&mut self, syllables: usize) -> Result<Vec<String>> {
		for _ in 0..FREE_LINE_TRIES {
			let word = self.generator.random_word()?;
			let decent = self.generator.is_decent_ending(std::slice::from_ref(&word));
			if !decent || !self.rhymes.is_known(&word) {
				continue;
			}
			match self.song_line(&word, syllables) {
				Ok(line) => return Ok(line),
				Err(err) if err.is_recoverable() => continue,
				Err(err) => return Err(err),
			}
		}
		Err(VerseError::UnbuildableLine { word: "any word".to_owned(), syllables })
	}

	/// Fills every line of `template` around `topic`.
	///
	/// Lines that cannot be built are left empty rather than failing the
	/// whole song.
	pub fn song(&mut self, topic: &str, template: &SongTemplate) -> Result<Song> {
		let mut lines = Vec::with_capacity(template.lines.len());
		for spec in &template.lines {
			let line = if spec.is_target {
				self.song_line(topic, spec.syllables)
			} else if spec.should_rhyme {
				self.rhyming_song_line(topic, spec.syllables)
			} else {
				self.free_song_line(spec.syllables)
			};

			match line {
				Ok(tokens) => lines.push(Some(post_process(&tokens))),
				Err(err) if err.is_recoverable() => {
					warn!("Can't find {} syllables for '{}': {}", spec.syllables, topic, err);
					lines.push(None);
				}
				Err(err) => return Err(err),
			}
		}
		Ok(Song { tune: template.name.clone(), lines })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn presets_are_found_by_name() {
		assert_eq!(SongTemplate::by_name("pretty woman"), Some(SongTemplate::pretty_woman()));
		assert_eq!(SongTemplate::by_name("ALL_STAR"), Some(SongTemplate::all_star()));
		assert_eq!(SongTemplate::by_name("little-teapot"), Some(SongTemplate::little_teapot()));
		assert_eq!(SongTemplate::by_name("never gonna"), None);
		assert_eq!(SongTemplate::by_name("  "), None);
	}

	#[test]
	fn every_preset_sings_the_topic_once() {
		for template in SongTemplate::presets() {
			assert_eq!(template.lines.len(), 4);
			assert_eq!(template.lines.iter().filter(|line| line.is_target).count(), 1, "{}", template.name);
		}
	}

	#[test]
	fn missing_lines_are_marked() {
		let song = Song { tune: "Call Me Maybe".to_owned(), lines: vec![Some("Hey I just met you".to_owned()), None] };
		assert!(!song.is_complete());
		assert_eq!(song.to_string(), "To the tune of Call Me Maybe\nHey I just met you\n...\n");
	}
}

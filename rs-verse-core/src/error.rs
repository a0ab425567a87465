//! Error type of the verse library.
//!
//! Generation failures that a caller can recover from (an unknown seed,
//! a walk that came up short, a word with no rhymes) are variants of the
//! same enum as the fatal ones. Use [`VerseError::is_recoverable`] to tell
//! them apart.

/// Result type of this crate, defaulting to [`VerseError`].
pub type Result<T, E = VerseError> = std::result::Result<T, E>;

/// Every error the library can surface.
#[derive(Debug, thiserror::Error)]
pub enum VerseError {
	/// Generation was requested while no model is loaded.
	#[error("No model is loaded")]
	NoModel,

	/// A seed word or seed pair does not occur in the corpus.
	#[error("'{0}' does not occur in the corpus")]
	NotFound(String),

	/// A backward walk ended outside of the requested length bounds.
	#[error("Could not build {min} to {max} tokens ending with '{word}'")]
	UnderBudget {
		word: String,
		min: usize,
		max: usize,
	},

	/// The word is absent from the pronunciation dictionary.
	#[error("'{0}' is not in the pronunciation dictionary")]
	UnknownWord(String),

	/// The word is known but shares no rhyme key with any usable word.
	#[error("Nothing rhymes with '{0}'")]
	NoRhymes(String),

	/// The topic of a poem or haiku could not end any generated line.
	#[error("Topic '{0}' does not occur in the corpus")]
	TopicUnknown(String),

	/// The song search ran out of starting pairs.
	#[error("No line of {syllables} syllables ends with '{word}'")]
	UnbuildableLine { word: String, syllables: usize },

	/// A caller-supplied value is out of range.
	#[error("Invalid argument '{arg}': {msg}")]
	InvalidArgument { arg: &'static str, msg: String },

	/// An input file or buffer is malformed.
	#[error("Invalid format in {arg}: {msg}")]
	InvalidFormat { arg: String, msg: String },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Postcard(#[from] postcard::Error),
}

impl VerseError {
	pub(crate) fn invalid_argument<S: Into<String>>(arg: &'static str, msg: S) -> Self {
		Self::InvalidArgument { arg, msg: msg.into() }
	}

	pub(crate) fn invalid_format<A: Into<String>, S: Into<String>>(arg: A, msg: S) -> Self {
		Self::InvalidFormat { arg: arg.into(), msg: msg.into() }
	}

	/// Returns `true` when retrying with another seed, word or template
	/// line may succeed.
	///
	/// `NoModel` and the I/O or format errors are fatal.
	pub fn is_recoverable(&self) -> bool {
		matches!(
			self,
			Self::NotFound(_)
				| Self::UnderBudget { .. }
				| Self::UnknownWord(_)
				| Self::NoRhymes(_)
				| Self::TopicUnknown(_)
				| Self::UnbuildableLine { .. }
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_generation_misses_are_recoverable() {
		assert!(VerseError::NotFound("x".into()).is_recoverable());
		assert!(VerseError::UnderBudget { word: "x".into(), min: 4, max: 8 }.is_recoverable());
		assert!(VerseError::UnbuildableLine { word: "x".into(), syllables: 5 }.is_recoverable());
		assert!(!VerseError::NoModel.is_recoverable());
		assert!(!VerseError::invalid_argument("max_half_length", "too small").is_recoverable());
	}

	#[test]
	fn messages_name_the_word() {
		let err = VerseError::UnderBudget { word: "pardner".into(), min: 4, max: 8 };
		assert_eq!(err.to_string(), "Could not build 4 to 8 tokens ending with 'pardner'");
	}
}

use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;

use serde::{Deserialize, Serialize};

/// Sentence boundary token.
///
/// Inserted before every sentence and once at the very end of the token
/// stream. It never appears inside a cleaned sentence.
pub const DELIM: &str = "<DELIM>";

/// Key of the successor maps: two adjacent tokens.
///
/// Both components are lowercased on construction, so equality, hashing
/// and ordering are case-insensitive. The original casing of the tokens
/// is kept in `BigramModel::words`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bigram {
	first: String,
	second: String,
}

impl Bigram {
	pub fn new(first: &str, second: &str) -> Self {
		Self {
			first: first.to_lowercase(),
			second: second.to_lowercase(),
		}
	}

	pub fn first(&self) -> &str {
		&self.first
	}

	pub fn second(&self) -> &str {
		&self.second
	}
}

impl fmt::Display for Bigram {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}, {})", self.first, self.second)
	}
}

/// Returns `true` if `token` is the sentence boundary.
pub fn is_delim(token: &str) -> bool {
	token == DELIM
}

/// Picks one successor uniformly; duplicates in `list` weight the draw.
pub(crate) fn pick<'a, R: Rng + ?Sized>(list: &'a [String], rng: &mut R) -> Option<&'a str> {
	list.choose(rng).map(String::as_str)
}

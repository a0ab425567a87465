//! Corpus cleaning and output formatting.
//!
//! [`clean_up_line`] turns a raw chat or prose line into the tokens fed to
//! the model builder. Trailing punctuation becomes its own token so that
//! sentence endings can be learned, and [`post_process`] glues it back
//! onto the words once a sequence has been generated.

use std::sync::LazyLock;

use log::trace;
use regex::Regex;

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.+>").expect("valid mention pattern"));
static ENDING_PUNCTUATION: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[.!?,;]+$").expect("valid ending pattern"));
static REATTACH_PUNCTUATION: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[.!?,;:]+$").expect("valid reattach pattern"));

const URL_THINGS: [&str; 6] = [".com", ".net", ".org", "www.", "http", "://"];
const REMOVE_THIS_PUNCTUATION: [&str; 8] = ["\"", "…", "^", "*", "“", "”", "•", ">"];
const KEEP_UPPERCASE: [&str; 5] = ["I", "I'm", "I'll", "I've", "I'd"];
const EMOTICONS: [&str; 13] = [":)", ":(", "(:", ";)", ";-)", ":'(", ":-(", ":-D", ":-)", ":D", ":d", ":p", ":P"];

/// Tokenizes and sanitizes one line of raw text.
///
/// The returned tokens are never empty. Steps run in this order:
/// mentions, URLs and literal `\n`, then punctuation (spaced out twice so
/// that doubled marks like `"hi!"` are caught), redundant endings, and
/// finally stray parentheses and colons, which may expose one more
/// trailing mark to split off.
pub fn clean_up_line(line: &str) -> Vec<String> {
	let mut tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();

	tokens = remove_mentions(tokens);
	tokens = lowercase_all(tokens);
	tokens.retain(|word| !URL_THINGS.iter().any(|thing| word.contains(thing)));
	tokens = remove_explicit_newlines(tokens);

	tokens = space_out_punctuation(tokens);
	tokens = handle_punctuation(tokens);
	tokens = space_out_punctuation(tokens);
	tokens = handle_punctuation(tokens);
	tokens = remove_redundant_punctuation(tokens);
	tokens = remove_unmatched_parentheses_and_colons(tokens);
	tokens = space_out_punctuation(tokens);
	tokens.retain(|word| !word.trim().is_empty());

	trace!("Cleaned line: {}", tokens.join(" "));
	tokens
}

/// Drops `<...>` mentions, `@here`/`@all` pings and the `@` of other mentions.
fn remove_mentions(tokens: Vec<String>) -> Vec<String> {
	tokens
		.into_iter()
		.map(|word| MENTION.replace_all(&word, "").into_owned())
		.filter(|word| !word.starts_with("@all") && !word.starts_with("@here"))
		.map(|word| if word.starts_with('@') { word.replace('@', "") } else { word })
		.collect()
}

/// Lowercases every token but the capital "I" forms.
fn lowercase_all(tokens: Vec<String>) -> Vec<String> {
	tokens
		.into_iter()
		.map(|word| if KEEP_UPPERCASE.contains(&word.as_str()) { word } else { word.to_lowercase() })
		.collect()
}

fn remove_explicit_newlines(tokens: Vec<String>) -> Vec<String> {
	tokens
		.into_iter()
		.flat_map(|word| {
			word.replace("\\n", " ")
				.split_whitespace()
				.map(str::to_owned)
				.collect::<Vec<_>>()
		})
		.collect()
}

/// Splits trailing sentence punctuation into its own token.
///
/// `Howdy!` becomes `Howdy !`. Tokens made only of punctuation stay as is.
fn space_out_punctuation(tokens: Vec<String>) -> Vec<String> {
	let mut out = Vec::with_capacity(tokens.len());
	for word in tokens {
		let word = word.trim();
		match ENDING_PUNCTUATION.find(word) {
			Some(m) if m.start() > 0 => {
				out.push(word[..m.start()].to_owned());
				out.push(m.as_str().to_owned());
			}
			_ => out.push(word.to_owned()),
		}
	}
	out
}

/// Removes punctuation that loses its partner once markovified.
fn handle_punctuation(tokens: Vec<String>) -> Vec<String> {
	let mut out = Vec::with_capacity(tokens.len());
	for word in tokens {
		let word = word.trim();
		if matches!(word, "'" | ":" | "(" | ")" | "...") {
			continue;
		}

		let word = word.strip_prefix('\'').unwrap_or(word);
		let word = word.strip_suffix('\'').unwrap_or(word);

		let mut word = word.to_owned();
		for punctuation in REMOVE_THIS_PUNCTUATION {
			word = word.replace(punctuation, "");
		}
		out.push(word);
	}
	out
}

/// Keeps only the last of several adjacent ending-punctuation tokens.
///
/// `happy birthday , !!` becomes `happy birthday !!`.
fn remove_redundant_punctuation(tokens: Vec<String>) -> Vec<String> {
	let is_ending = |word: &str| !word.is_empty() && ENDING_PUNCTUATION.find(word).is_some_and(|m| m.start() == 0);

	let mut out: Vec<String> = Vec::with_capacity(tokens.len());
	for word in tokens {
		if is_ending(word.as_str()) && out.last().is_some_and(|previous| is_ending(previous.as_str())) {
			out.pop();
		}
		out.push(word);
	}
	out
}

/// Strips parentheses and colons that were glued to words.
///
/// `(word)` tokens and the usual emoticons are left alone.
fn remove_unmatched_parentheses_and_colons(tokens: Vec<String>) -> Vec<String> {
	tokens
		.into_iter()
		.map(|word| {
			let mut word = word.trim().to_owned();
			if (word.starts_with('(') && word.ends_with(')')) || EMOTICONS.contains(&word.as_str()) {
				return word;
			}

			if word.starts_with('(') && !word.ends_with(')') {
				word = word.replace('(', "");
			}
			if !word.starts_with('(') && word.ends_with(')') {
				word = word.replace(')', "");
			}
			if word.starts_with(':') && !word.ends_with(':') {
				word = word.replace(':', "");
			}
			if !word.starts_with(':') && word.ends_with(':') {
				word = word.replace(':', "");
			}
			word
		})
		.collect()
}

/// Glues punctuation-only tokens (`.!?,;:`) to the word before them.
///
/// `["Hey", "!"]` becomes `["Hey!"]`; `["wat", "?", "!"]` becomes `["wat?!"]`.
pub fn reattach_punctuation(tokens: &[String]) -> Vec<String> {
	let mut out: Vec<String> = Vec::with_capacity(tokens.len());
	for token in tokens {
		match out.last_mut() {
			Some(previous) if REATTACH_PUNCTUATION.is_match(token) => previous.push_str(token),
			_ => out.push(token.clone()),
		}
	}
	out
}

/// Uppercases the first alphabetic character of the first token.
pub fn capitalize_initial_word(tokens: &mut [String]) {
	let Some(first) = tokens.first_mut() else {
		return;
	};
	if let Some((index, c)) = first.char_indices().find(|(_, c)| c.is_alphabetic()) {
		let upper: String = c.to_uppercase().collect();
		first.replace_range(index..index + c.len_utf8(), &upper);
	}
}

/// Joins tokens with single spaces.
pub fn stringify(tokens: &[String]) -> String {
	tokens.join(" ")
}

/// Formats a generated token sequence as a sentence.
pub fn post_process(tokens: &[String]) -> String {
	let mut tokens = reattach_punctuation(tokens);
	capitalize_initial_word(&mut tokens);
	stringify(&tokens)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn owned(tokens: &[&str]) -> Vec<String> {
		tokens.iter().map(|t| (*t).to_owned()).collect()
	}

	#[test]
	fn urls_are_dropped() {
		assert_eq!(clean_up_line("go to http://whatever.com/lol, ok?"), owned(&["go", "to", "ok", "?"]));
	}

	#[test]
	fn mentions_are_stripped() {
		assert_eq!(clean_up_line("go see @jack, ok?"), owned(&["go", "see", "jack", ",", "ok", "?"]));
		assert_eq!(clean_up_line("@here <@U123456> lunch"), owned(&["lunch"]));
	}

	#[test]
	fn capital_i_survives_lowercasing() {
		assert_eq!(clean_up_line("Well I'm TIRED"), owned(&["well", "I'm", "tired"]));
	}

	#[test]
	fn literal_newlines_split_tokens() {
		assert_eq!(clean_up_line("go see, ok?\\nbye"), owned(&["go", "see", ",", "ok", "?", "bye"]));
	}

	#[test]
	fn quotes_and_parentheses_are_cleaned() {
		assert_eq!(
			clean_up_line("\"what?\" nope, (disappear) '"),
			owned(&["what", "?", "nope", ",", "(disappear)"])
		);
		assert_eq!(
			clean_up_line("(go see, ok?) (awthanks) :) ;) :P"),
			owned(&["go", "see", ",", "ok", "?", "(awthanks)", ":)", ";)", ":p"])
		);
	}

	#[test]
	fn redundant_endings_collapse() {
		assert_eq!(clean_up_line("Hey!!! Wat??"), owned(&["hey", "!!!", "wat", "??"]));
		assert_eq!(clean_up_line("happy birthday , !!"), owned(&["happy", "birthday", "!!"]));
	}

	#[test]
	fn post_processing_builds_a_sentence() {
		let tokens = owned(&["howdy", "y'all", ".", "how", "are", "ya", "?", "!"]);
		assert_eq!(post_process(&tokens), "Howdy y'all. how are ya?!");
		assert_eq!(post_process(&owned(&["'twas", "brillig"])), "'Twas brillig");
		assert_eq!(post_process(&owned(&[",", "hi"])), ", hi");
		assert_eq!(post_process(&[]), "");
	}
}

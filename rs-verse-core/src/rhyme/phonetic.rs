use std::collections::BTreeSet;
use std::io::BufRead;

use crate::error::Result;

/// Prefix of comment lines in CMU-style dictionaries.
pub const COMMENT_PREFIX: &str = ";;;";

/// Removes the trailing stress digits of a phoneme (`EY1` → `EY`).
pub fn strip_stress(phoneme: &str) -> &str {
	phoneme.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// Removes a homograph counter from a headword (`PRESTIGIOUS(1)` → `PRESTIGIOUS`).
pub fn strip_homograph_suffix(headword: &str) -> &str {
	let Some(inner) = headword.strip_suffix(')') else {
		return headword;
	};
	match inner.rfind('(') {
		Some(open) if open > 0 && inner[open + 1..].chars().all(|c| c.is_ascii_digit()) && open + 1 < inner.len() => {
			&inner[..open]
		}
		_ => headword,
	}
}

/// Splits one dictionary line into its headword and stress-free phonemes.
///
/// Returns `None` for blank lines, comments and lines without phonemes.
/// The headword keeps its case and homograph suffix.
pub fn parse_dictionary_line(line: &str) -> Option<(&str, Vec<String>)> {
	let line = line.trim();
	if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
		return None;
	}

	let mut fields = line.split_whitespace();
	let headword = fields.next()?;
	let phonemes: Vec<String> = fields.map(|p| strip_stress(p).to_owned()).collect();
	if phonemes.is_empty() {
		return None;
	}
	Some((headword, phonemes))
}

/// Reads a phoneme-class table (`<phoneme> <class>` per line).
///
/// Only phonemes of class `vowel` are kept.
pub fn read_vowels<R: BufRead>(reader: R) -> Result<BTreeSet<String>> {
	let mut vowels = BTreeSet::new();
	for line in reader.lines() {
		let line = line?;
		let mut fields = line.split_whitespace();
		if let (Some(phoneme), Some("vowel")) = (fields.next(), fields.next()) {
			vowels.insert(strip_stress(phoneme).to_owned());
		}
	}
	Ok(vowels)
}

/// Number of vowel phonemes, i.e. syllables, of a pronunciation.
pub fn count_syllables(phonemes: &[String], vowels: &BTreeSet<String>) -> usize {
	phonemes.iter().filter(|p| vowels.contains(p.as_str())).count()
}

/// Computes the rhyme keys of one pronunciation, longest first.
///
/// # Behavior
/// - No vowel: no key.
/// - A single phoneme: that phoneme.
/// - A single vowel: the suffix starting at it.
/// - Several vowels: the shortest key starts at the last vowel, or one
///   phoneme earlier when the word ends with that vowel. Longer keys are
///   obtained by prepending phonemes one at a time, back to the first
///   vowel.
///
/// # Example
/// `P OW N IY` → `["OWNIY", "NIY"]`
pub fn rhyme_keys(phonemes: &[String], vowels: &BTreeSet<String>) -> Vec<String> {
	let is_vowel = |p: &String| vowels.contains(p.as_str());
	let (Some(first_vowel), Some(last_vowel)) =
		(phonemes.iter().position(is_vowel), phonemes.iter().rposition(is_vowel))
	else {
		return Vec::new();
	};

	if phonemes.len() == 1 {
		return vec![phonemes[0].clone()];
	}
	if first_vowel == last_vowel {
		return vec![phonemes[last_vowel..].concat()];
	}

	let start = if last_vowel == phonemes.len() - 1 { last_vowel - 1 } else { last_vowel };
	let mut key = phonemes[start..].concat();
	let mut keys = vec![key.clone()];
	for phoneme in phonemes[first_vowel..start].iter().rev() {
		key.insert_str(0, phoneme);
		keys.push(key.clone());
	}
	keys.reverse();
	keys
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cmu_vowels() -> BTreeSet<String> {
		["AA", "AE", "AH", "AO", "AW", "AY", "EH", "ER", "EY", "IH", "IY", "OW", "OY", "UH", "UW"]
			.iter()
			.map(|v| (*v).to_owned())
			.collect()
	}

	fn keys(pronunciation: &str) -> Vec<String> {
		let phonemes: Vec<String> = pronunciation.split_whitespace().map(str::to_owned).collect();
		rhyme_keys(&phonemes, &cmu_vowels())
	}

	#[test]
	fn multi_vowel_words_extend_leftward() {
		assert_eq!(keys("K AE T OW N AY N T EY L Z"), [
			"AETOWNAYNTEYLZ",
			"TOWNAYNTEYLZ",
			"OWNAYNTEYLZ",
			"NAYNTEYLZ",
			"AYNTEYLZ",
			"NTEYLZ",
			"TEYLZ",
			"EYLZ"
		]);
		assert_eq!(keys("K W AO R AH N T IY N"), ["AORAHNTIYN", "RAHNTIYN", "AHNTIYN", "NTIYN", "TIYN", "IYN"]);
		assert_eq!(keys("AA B S AH L IY T"), ["AABSAHLIYT", "BSAHLIYT", "SAHLIYT", "AHLIYT", "LIYT", "IYT"]);
		assert_eq!(keys("IH K S CH EY N JH"), ["IHKSCHEYNJH", "KSCHEYNJH", "SCHEYNJH", "CHEYNJH", "EYNJH"]);
	}

	#[test]
	fn vowel_endings_keep_one_more_phoneme() {
		assert_eq!(keys("P OW N IY"), ["OWNIY", "NIY"]);
		assert_eq!(keys("AO L T ER"), ["AOLTER", "LTER", "TER"]);
	}

	#[test]
	fn short_words_still_get_a_key() {
		assert_eq!(keys("AE K T"), ["AEKT"]);
		assert_eq!(keys("AH"), ["AH"]);
		assert_eq!(keys("B AY"), ["AY"]);
		assert_eq!(keys("P L EY Z"), ["EYZ"]);
		assert!(keys("HH M M").is_empty());
	}

	#[test]
	fn parses_cmu_lines() {
		assert_eq!(parse_dictionary_line(";;; comment"), None);
		assert_eq!(parse_dictionary_line("   "), None);
		assert_eq!(parse_dictionary_line("LONELY"), None);
		let (headword, phonemes) = parse_dictionary_line("FACTS(1)  F AE1 K T S").unwrap();
		assert_eq!(strip_homograph_suffix(headword), "FACTS");
		assert_eq!(phonemes, ["F", "AE", "K", "T", "S"]);
		assert_eq!(count_syllables(&phonemes, &cmu_vowels()), 1);
	}

	#[test]
	fn homograph_suffix_needs_digits() {
		assert_eq!(strip_homograph_suffix("PRESTIGIOUS(1)"), "PRESTIGIOUS");
		assert_eq!(strip_homograph_suffix("(PAREN)"), "(PAREN)");
		assert_eq!(strip_homograph_suffix("WORD()"), "WORD()");
		assert_eq!(strip_homograph_suffix("WORD"), "WORD");
	}

	#[test]
	fn reads_vowels_only() {
		let table = "AA\tvowel\nB\tstop\nAE1\tvowel\n\nCH\taffricate\n";
		let vowels = read_vowels(table.as_bytes()).unwrap();
		assert_eq!(vowels.into_iter().collect::<Vec<_>>(), ["AA", "AE"]);
	}
}

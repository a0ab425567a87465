use std::collections::HashMap;

use super::bigram_model::BigramModel;

/// Positions of every distinct token in a model's token stream.
///
/// Lookups are case-preserving: the generator lowercases user input
/// before querying. Position lists are strictly ascending.
#[derive(Clone, Debug, Default)]
pub struct WordIndex {
	positions: HashMap<String, Vec<usize>>,
}

impl WordIndex {
	pub fn build(model: &BigramModel) -> Self {
		let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
		for (index, word) in model.words().iter().enumerate() {
			positions.entry(word.clone()).or_default().push(index);
		}
		Self { positions }
	}

	pub fn positions(&self, word: &str) -> Option<&[usize]> {
		self.positions.get(word).map(Vec::as_slice)
	}

	pub fn contains(&self, word: &str) -> bool {
		self.positions.contains_key(word)
	}

	/// Number of distinct tokens, the boundary included.
	pub fn len(&self) -> usize {
		self.positions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::bigram::DELIM;

	#[test]
	fn positions_are_ascending_and_case_preserving() {
		let model = BigramModel::build(vec![vec!["Go", "go", "go"], vec!["go", "home"]]);
		let index = WordIndex::build(&model);
		assert_eq!(index.positions("go"), Some(&[2, 3, 5][..]));
		assert_eq!(index.positions("Go"), Some(&[1][..]));
		assert_eq!(index.positions(DELIM), Some(&[0, 4, 7][..]));
		assert!(!index.contains("GO"));
		assert_eq!(index.len(), 4);
	}
}

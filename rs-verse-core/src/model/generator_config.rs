use serde::{Deserialize, Serialize};

use crate::error::{Result, VerseError};

/// Default soft bound of each half of a centered sentence.
pub const DEFAULT_MAX_HALF_LENGTH: usize = 10;

/// Generation parameters of a [`Generator`](super::generator::Generator).
///
/// # Responsibilities
/// - Track the half-length bound applied to forward and backward walks
/// - Track the optional RNG seed (`None` draws from OS entropy)
///
/// # Invariants
/// - `max_half_length >= 2` (a walk always holds its seed pair)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
	/// Soft length bound of each walk.
	max_half_length: usize,

	/// Fixed seed for reproducible output.
	pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self { max_half_length: DEFAULT_MAX_HALF_LENGTH, seed: None }
	}
}

impl GeneratorConfig {
	pub fn new(max_half_length: usize, seed: Option<u64>) -> Result<Self> {
		let mut config = Self { seed, ..Self::default() };
		config.set_max_half_length(max_half_length)?;
		Ok(config)
	}

	pub fn max_half_length(&self) -> usize {
		self.max_half_length
	}

	/// Sets the half-length bound.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `max_half_length < 2`.
	pub fn set_max_half_length(&mut self, max_half_length: usize) -> Result<()> {
		validate_half_length(max_half_length)?;
		self.max_half_length = max_half_length;
		Ok(())
	}

	/// Checks a configuration obtained through deserialization.
	pub fn validate(&self) -> Result<()> {
		validate_half_length(self.max_half_length)
	}
}

/// A walk always holds its seed pair, so the bound is at least 2.
pub(crate) fn validate_half_length(max_half_length: usize) -> Result<()> {
	if max_half_length < 2 {
		return Err(VerseError::invalid_argument(
			"max_half_length",
			format!("must be at least 2, got {max_half_length}"),
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_half_lengths_below_two() {
		let mut config = GeneratorConfig::default();
		assert_eq!(config.max_half_length(), 10);
		assert!(config.set_max_half_length(1).is_err());
		assert_eq!(config.max_half_length(), 10);
		assert!(config.set_max_half_length(2).is_ok());
		assert!(GeneratorConfig::new(0, Some(3)).is_err());
	}

	#[test]
	fn validates_deserialized_bounds() {
		assert!(validate_half_length(1).is_err());
		assert!(validate_half_length(2).is_ok());
		assert!(GeneratorConfig::default().validate().is_ok());
	}
}

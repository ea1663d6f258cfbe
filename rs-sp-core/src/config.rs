//! Run configuration.
//!
//! A `SpConfig` is built once (in code or from a TOML file), validated, and
//! then only borrowed by the pipeline. Nothing in the crate mutates it after
//! `validate` succeeds.
//!
//! ```toml
//! window = 500000
//! ntrim = 1000
//! tie_break = { seeded = { seed = 42 } }
//!
//! [source]
//! corpus = "data/corpus.tsv"
//! corpus_sizes = "data/sizes.tsv"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SpError, SpResult};

/// Rule used to order rows that have the same frequency.
///
/// # Variants
/// - `Lexical`: ascending type, then non-rule-following before rule-following.
/// - `Seeded { seed }`: a random key per row, drawn from a generator seeded
///   with `seed` mixed with the time slice. Lexical order settles any
///   remaining collision.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
	#[default]
	Lexical,
	Seeded { seed: u64 },
}

/// Where the collaborator-supplied inputs live on disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SourceConfig {
	/// Delimited corpus file with the four canonical columns.
	pub corpus: PathBuf,
	/// Optional `time → size` override table.
	#[serde(default)]
	pub corpus_sizes: Option<PathBuf>,
}

/// Parameters of one productivity run.
///
/// # Invariants (after `validate`)
/// - `window >= 1`
/// - `ntrim >= 1`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpConfig {
	/// Trailing corpus mass visible to synchronic learners.
	pub window: u64,

	/// Overall frequency rank bounding inexperienced learners' vocabulary.
	pub ntrim: usize,

	/// How equal frequencies are ranked.
	#[serde(default)]
	pub tie_break: TieBreak,

	/// Number of slice worker chunks per CPU; 0 picks a default.
	#[serde(default)]
	pub threads: usize,

	/// Input locations, used by the binaries only.
	#[serde(default)]
	pub source: Option<SourceConfig>,
}

impl SpConfig {
	/// Creates a validated configuration with lexical tie-breaking.
	///
	/// # Errors
	/// Returns `SpError::InvalidConfig` if `window` or `ntrim` is zero.
	pub fn new(window: u64, ntrim: usize) -> SpResult<Self> {
		let config = Self {
			window,
			ntrim,
			tie_break: TieBreak::Lexical,
			threads: 0,
			source: None,
		};
		config.validate()?;
		Ok(config)
	}

	/// Returns a copy using the given tie-break rule.
	pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
		self.tie_break = tie_break;
		self
	}

	/// Returns a copy that splits slice work into `threads` chunks per CPU.
	pub fn with_threads(mut self, threads: usize) -> Self {
		self.threads = threads;
		self
	}

	/// Loads and validates a TOML configuration file.
	///
	/// # Errors
	/// I/O, TOML and validation errors.
	pub fn from_file<P: AsRef<Path>>(path: P) -> SpResult<Self> {
		let contents = std::fs::read_to_string(path)?;
		Self::parse(&contents)
	}

	/// Parses and validates a TOML configuration string.
	///
	/// # Errors
	/// TOML and validation errors.
	pub fn parse(contents: &str) -> SpResult<Self> {
		let config: Self = toml::from_str(contents)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the range constraints on `window` and `ntrim`.
	///
	/// # Errors
	/// Returns `SpError::InvalidConfig` naming the offending field.
	pub fn validate(&self) -> SpResult<()> {
		if self.window == 0 {
			return Err(SpError::InvalidConfig("window must be a positive integer".to_owned()));
		}
		if self.ntrim == 0 {
			return Err(SpError::InvalidConfig("ntrim must be a positive integer".to_owned()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_zero_window() {
		assert!(matches!(SpConfig::new(0, 10), Err(SpError::InvalidConfig(_))));
	}

	#[test]
	fn rejects_zero_ntrim() {
		assert!(matches!(SpConfig::new(10, 0), Err(SpError::InvalidConfig(_))));
	}

	#[test]
	fn parses_toml_with_seed_and_source() {
		let config = SpConfig::parse(
			r#"
			window = 5000
			ntrim = 200
			tie_break = { seeded = { seed = 7 } }

			[source]
			corpus = "data/corpus.tsv"
			"#,
		)
		.unwrap();

		assert_eq!(config.window, 5000);
		assert_eq!(config.ntrim, 200);
		assert_eq!(config.tie_break, TieBreak::Seeded { seed: 7 });
		let source = config.source.unwrap();
		assert_eq!(source.corpus, PathBuf::from("data/corpus.tsv"));
		assert!(source.corpus_sizes.is_none());
	}

	#[test]
	fn lexical_is_default_tie_break() {
		let config = SpConfig::parse("window = 1\nntrim = 1\n").unwrap();
		assert_eq!(config.tie_break, TieBreak::Lexical);
		assert_eq!(config.threads, 0);
	}

	#[test]
	fn parse_validates() {
		assert!(matches!(SpConfig::parse("window = 0\nntrim = 1\n"), Err(SpError::InvalidConfig(_))));
	}
}

//! Error types for the productivity pipeline.
//!
//! Fatal conditions abort a run and name the component and location that
//! produced them. Recoverable conditions (`MissingCorpusSize`,
//! `DegenerateThreshold`) are never returned from `ProductivityPipeline::run`;
//! they are recorded in the report diagnostics and logged instead.

use crate::model::learner::LearnerKind;

/// Errors produced by the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SpError {
	/// The corpus (or corpus-size table) lacks a canonical field or holds
	/// an unparsable value.
	#[error("schema error in {source_name} at line {line}: {reason}")]
	Schema {
		/// Which input was being read (`corpus` or `corpus sizes`).
		source_name: &'static str,
		/// 1-based line number; the header is line 1.
		line: usize,
		/// What was wrong with the line.
		reason: String,
	},

	/// A corpus-size override table has no entry for a time present in the events.
	#[error("time frequency table: no corpus size for time {time}")]
	MissingCorpusSize {
		/// The event time with no size.
		time: i64,
	},

	/// `θ_n` is undefined because `n <= 1`.
	#[error("sufficiency calculator: degenerate threshold for learner {learner} at time {time} (n = {n})")]
	DegenerateThreshold {
		/// Snapshot time.
		time: i64,
		/// Learner variant.
		learner: LearnerKind,
		/// Vocabulary size that made the threshold undefined.
		n: u32,
	},

	/// A configuration value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// A slice worker thread died before reporting its result.
	#[error("slice worker failed: {0}")]
	Worker(String),

	/// File I/O failed.
	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	/// The TOML configuration could not be parsed.
	#[error("failed to parse config TOML: {0}")]
	Toml(#[from] toml::de::Error),

	/// JSON export failed.
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	/// Binary report (de)serialization failed.
	#[error("binary report error: {0}")]
	Postcard(#[from] postcard::Error),
}

/// Result alias used across the crate.
pub type SpResult<T> = Result<T, SpError>;

//! Top-level module for the productivity computation.
//!
//! The stages, leaves first:
//! - Event log normalization (`Corpus`)
//! - Per-time corpus mass (`TimeFrequencyTable`)
//! - Corpus-wide type ranking and vocabulary cap (`VocabularyRanking`)
//! - Per-(time, type, rule) aggregation and ranking (`StructureAggregator`)
//! - Distinct-type vocabulary sizes (`VocabularySizeResolver`)
//! - Learner eligibility (`LearnerEligibilityClassifier`)
//! - Sufficiency verdicts (`SufficiencyCalculator`)
//! - Orchestration (`ProductivityPipeline`) and output (`ProductivityReport`)

/// Canonical events and the read-only event log.
pub mod event;

/// Per-time event counts (or overridden corpus sizes) and their running sum.
pub mod time_frequency;

/// Corpus-wide type ranking and `NTRIM_INCLASS`.
pub mod vocabulary_rank;

/// Structure rows, time slices and the cumulative/windowed aggregator.
pub mod structure;

/// Rank-to-vocabulary-size translation.
pub mod vocabulary_size;

/// The four learner models and the eligibility classifier.
pub mod learner;

/// `θ_n`, learner snapshots and their reduction from classified rows.
pub mod sufficiency;

/// Report, diagnostics and persistence.
pub mod report;

/// Stage orchestration and parallel slice processing.
pub mod pipeline;

/// Frequency ranking with explicit tie-breaking.
///
/// Not exposed publicly; callers see ranks only through the rows.
mod rank;

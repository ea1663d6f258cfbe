//! Sufficiency Principle productivity over historical corpora.
//!
//! This crate evaluates, from a chronological log of usage events, whether
//! a grammatical rule is productive at each point in time for four models
//! of a learner:
//! - panchronic or synchronic (whole history vs. a trailing window of
//!   corpus mass)
//! - experienced or inexperienced (unrestricted vs. frequency-capped
//!   vocabulary)
//!
//! The entry point is `ProductivityPipeline`; its output is a
//! `ProductivityReport` holding the structure table and learner snapshots.

/// Run configuration (window, vocabulary cap, tie-breaking, inputs).
pub mod config;

/// Error types.
pub mod error;

/// Pipeline stages and their tables.
pub mod model;

/// Corpus and corpus-size loading, path helpers.
pub mod io;

pub use config::{SourceConfig, SpConfig, TieBreak};
pub use error::{SpError, SpResult};
pub use model::event::{Corpus, Event};
pub use model::learner::{Experience, Exposure, LearnerKind};
pub use model::pipeline::ProductivityPipeline;
pub use model::report::{ComparisonPoint, Diagnostics, ProductivityReport, ReportSummary};
pub use model::structure::StructureRow;
pub use model::sufficiency::{theta, LearnerSnapshot};

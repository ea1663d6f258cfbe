use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SpConfig;
use crate::error::{SpError, SpResult};
use super::learner::{Experience, Exposure, LearnerKind};
use super::structure::StructureRow;
use super::sufficiency::LearnerSnapshot;
use super::time_frequency::{TimePoint, WindowSpan};
use super::vocabulary_rank::VocabularyRanking;

/// A snapshot left out because `θ_n` was undefined.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DegenerateSnapshot {
	pub time: i64,
	pub learner_id: LearnerKind,
	pub n: u32,
}

/// Non-fatal conditions met during a run.
///
/// Every skipped computation ends up here; nothing is dropped silently.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
	/// Event times with no corpus size (synchronic learners skipped there).
	pub missing_corpus_size: Vec<i64>,
	/// Snapshots omitted because `n <= 1`.
	pub degenerate: Vec<DegenerateSnapshot>,
}

impl Diagnostics {
	/// Records a recoverable error.
	///
	/// # Errors
	/// Hands back any error that is not `MissingCorpusSize` or
	/// `DegenerateThreshold`.
	pub fn record(&mut self, error: SpError) -> SpResult<()> {
		match error {
			SpError::MissingCorpusSize { time } => {
				if !self.missing_corpus_size.contains(&time) {
					warn!(time, "No corpus size for time, synchronic learners skipped");
					self.missing_corpus_size.push(time);
				}
				Ok(())
			}
			SpError::DegenerateThreshold { time, learner, n } => {
				debug!(time, %learner, n, "Degenerate threshold, snapshot omitted");
				self.degenerate.push(DegenerateSnapshot { time, learner_id: learner, n });
				Ok(())
			}
			other => Err(other),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.missing_corpus_size.is_empty() && self.degenerate.is_empty()
	}
}

/// Experienced and inexperienced verdicts side by side at one time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ComparisonPoint {
	pub time: i64,
	pub experienced: Option<LearnerSnapshot>,
	pub inexperienced: Option<LearnerSnapshot>,
}

/// Per-learner totals for the summary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LearnerSummary {
	pub learner_id: LearnerKind,
	pub snapshots: usize,
	pub sufficient: usize,
	pub first_sufficient_time: Option<i64>,
	pub last: Option<LearnerSnapshot>,
}

/// Short textual/JSON overview of a report.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReportSummary {
	pub corpus_name: String,
	pub window: u64,
	pub ntrim: usize,
	pub ntrim_inclass: u32,
	pub time_points: usize,
	pub structures: usize,
	pub learners: Vec<LearnerSummary>,
	pub missing_corpus_size: Vec<i64>,
	pub degenerate_snapshots: usize,
}

impl fmt::Display for ReportSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "corpus '{}': window = {}, ntrim = {} ({} in class)", self.corpus_name, self.window, self.ntrim, self.ntrim_inclass)?;
		writeln!(f, "{} time points, {} structure rows", self.time_points, self.structures)?;
		for learner in &self.learners {
			write!(f, "  {}: {}/{} sufficient", learner.learner_id, learner.sufficient, learner.snapshots)?;
			if let Some(time) = learner.first_sufficient_time {
				write!(f, ", first at {time}")?;
			}
			if let Some(last) = &learner.last {
				write!(f, ", last N={} M={} θ={} ({})", last.n, last.m, last.theta_n, if last.sufficient { "productive" } else { "unproductive" })?;
			}
			writeln!(f)?;
		}
		if !self.missing_corpus_size.is_empty() {
			writeln!(f, "missing corpus size at: {:?}", self.missing_corpus_size)?;
		}
		write!(f, "{} snapshot(s) omitted with n <= 1", self.degenerate_snapshots)
	}
}

/// Everything a run produces, handed to the reporting side.
///
/// # Invariants
/// - `structures` are ordered by time, then (type, follows_rule)
/// - `snapshots` are ordered by learner, then time
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProductivityReport {
	corpus_name: String,
	config: SpConfig,
	time_points: Vec<TimePoint>,
	vocabulary: VocabularyRanking,
	structures: Vec<StructureRow>,
	snapshots: Vec<LearnerSnapshot>,
	window_spans: Vec<WindowSpan>,
	diagnostics: Diagnostics,
}

impl ProductivityReport {
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn new(
		corpus_name: &str,
		config: SpConfig,
		time_points: Vec<TimePoint>,
		vocabulary: VocabularyRanking,
		structures: Vec<StructureRow>,
		snapshots: Vec<LearnerSnapshot>,
		window_spans: Vec<WindowSpan>,
		diagnostics: Diagnostics,
	) -> Self {
		Self {
			corpus_name: corpus_name.to_owned(),
			config,
			time_points,
			vocabulary,
			structures,
			snapshots,
			window_spans,
			diagnostics,
		}
	}

	pub fn corpus_name(&self) -> &str {
		&self.corpus_name
	}

	pub fn config(&self) -> &SpConfig {
		&self.config
	}

	pub fn time_points(&self) -> &[TimePoint] {
		&self.time_points
	}

	pub fn vocabulary(&self) -> &VocabularyRanking {
		&self.vocabulary
	}

	pub fn structures(&self) -> &[StructureRow] {
		&self.structures
	}

	pub fn snapshots(&self) -> &[LearnerSnapshot] {
		&self.snapshots
	}

	/// Window extent per time point, for the window-span plot.
	pub fn window_spans(&self) -> &[WindowSpan] {
		&self.window_spans
	}

	pub fn diagnostics(&self) -> &Diagnostics {
		&self.diagnostics
	}

	/// Rows of one time slice.
	pub fn structures_at(&self, time: i64) -> &[StructureRow] {
		let start = self.structures.partition_point(|row| row.time < time);
		let end = self.structures.partition_point(|row| row.time <= time);
		&self.structures[start..end]
	}

	/// The time series of one learner.
	pub fn series(&self, learner: LearnerKind) -> impl Iterator<Item = &LearnerSnapshot> + '_ {
		self.snapshots.iter().filter(move |snapshot| snapshot.learner_id == learner)
	}

	pub fn snapshot(&self, time: i64, learner: LearnerKind) -> Option<&LearnerSnapshot> {
		self.series(learner).find(|snapshot| snapshot.time == time)
	}

	/// Experienced vs inexperienced learners of one exposure, per time.
	///
	/// Panchronic exposure feeds the learner comparison plot, synchronic
	/// exposure the synchronic time series.
	pub fn comparison(&self, exposure: Exposure) -> Vec<ComparisonPoint> {
		let experienced = LearnerKind::new(exposure, Experience::Experienced);
		let inexperienced = LearnerKind::new(exposure, Experience::Inexperienced);

		let mut points: BTreeMap<i64, ComparisonPoint> = BTreeMap::new();
		for snapshot in &self.snapshots {
			let point = points.entry(snapshot.time).or_insert_with(|| ComparisonPoint {
				time: snapshot.time,
				experienced: None,
				inexperienced: None,
			});
			if snapshot.learner_id == experienced {
				point.experienced = Some(snapshot.clone());
			} else if snapshot.learner_id == inexperienced {
				point.inexperienced = Some(snapshot.clone());
			}
		}
		points
			.into_values()
			.filter(|point| point.experienced.is_some() || point.inexperienced.is_some())
			.collect()
	}

	pub fn summary(&self) -> ReportSummary {
		let learners = LearnerKind::ALL
			.into_iter()
			.map(|learner| {
				let series: Vec<&LearnerSnapshot> = self.series(learner).collect();
				LearnerSummary {
					learner_id: learner,
					snapshots: series.len(),
					sufficient: series.iter().filter(|snapshot| snapshot.sufficient).count(),
					first_sufficient_time: series.iter().find(|snapshot| snapshot.sufficient).map(|snapshot| snapshot.time),
					last: series.last().map(|snapshot| (*snapshot).clone()),
				}
			})
			.collect();

		ReportSummary {
			corpus_name: self.corpus_name.clone(),
			window: self.config.window,
			ntrim: self.config.ntrim,
			ntrim_inclass: self.vocabulary.ntrim_inclass(),
			time_points: self.time_points.len(),
			structures: self.structures.len(),
			learners,
			missing_corpus_size: self.diagnostics.missing_corpus_size.clone(),
			degenerate_snapshots: self.diagnostics.degenerate.len(),
		}
	}

	/// Writes the report in compact binary form (`postcard`).
	///
	/// # Errors
	/// Serialization or I/O errors.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> SpResult<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Reads a report written by `save`.
	///
	/// # Errors
	/// Deserialization or I/O errors.
	pub fn load<P: AsRef<Path>>(path: P) -> SpResult<Self> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Pretty JSON export for plotting tools.
	///
	/// # Errors
	/// JSON serialization errors.
	pub fn to_json(&self) -> SpResult<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn records_missing_size_once() {
		let mut diagnostics = Diagnostics::default();
		diagnostics.record(SpError::MissingCorpusSize { time: 3 }).unwrap();
		diagnostics.record(SpError::MissingCorpusSize { time: 3 }).unwrap();
		assert_eq!(diagnostics.missing_corpus_size, vec![3]);
	}

	#[test]
	fn records_degenerate_snapshots() {
		let mut diagnostics = Diagnostics::default();
		diagnostics
			.record(SpError::DegenerateThreshold { time: 1, learner: LearnerKind::Is, n: 0 })
			.unwrap();
		assert_eq!(diagnostics.degenerate, vec![DegenerateSnapshot { time: 1, learner_id: LearnerKind::Is, n: 0 }]);
		assert!(!diagnostics.is_empty());
	}

	#[test]
	fn refuses_fatal_errors() {
		let mut diagnostics = Diagnostics::default();
		let error = diagnostics.record(SpError::InvalidConfig("x".to_owned())).unwrap_err();
		assert!(matches!(error, SpError::InvalidConfig(_)));
		assert!(diagnostics.is_empty());
	}
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SpError, SpResult};
use super::event::Corpus;

/// Corpus mass observed at one time value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TimePoint {
	pub time: i64,
	/// Events (or override size) at `time`.
	pub clause_count: u64,
	/// Running sum of `clause_count` over all points up to and including `time`.
	pub clause_cum_count: u64,
}

/// Calendar extent of the synchronic window ending at `time`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WindowSpan {
	pub time: i64,
	/// Earliest point whose cumulative mass is within the window.
	pub start_time: i64,
}

impl WindowSpan {
	/// Number of calendar units covered by the window.
	pub fn span(&self) -> i64 {
		self.time - self.start_time
	}
}

/// Per-time corpus mass and its cumulative sum.
///
/// The table is built either from the event log itself (every event counts,
/// in-class or not) or from an external `time → size` table. In the second
/// case the override points drive the cumulative sum, and event times absent
/// from the override are reported as missing.
///
/// # Invariants
/// - `points` are sorted by strictly increasing time
/// - `clause_cum_count` is non-decreasing
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TimeFrequencyTable {
	points: Vec<TimePoint>,
	missing: Vec<i64>,
	overridden: bool,
}

impl TimeFrequencyTable {
	/// Counts events per time in the corpus.
	pub fn from_corpus(corpus: &Corpus) -> Self {
		let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
		for event in corpus.events() {
			*counts.entry(event.time).or_insert(0) += 1;
		}
		Self { points: Self::accumulate(&counts), missing: Vec::new(), overridden: false }
	}

	/// Uses an external corpus size per time instead of event counts.
	///
	/// Times present in the override but not in the events still add to the
	/// cumulative mass.
	pub fn with_corpus_sizes(corpus: &Corpus, sizes: &BTreeMap<i64, u64>) -> Self {
		let missing = corpus
			.times()
			.into_iter()
			.filter(|time| !sizes.contains_key(time))
			.collect();
		Self { points: Self::accumulate(sizes), missing, overridden: true }
	}

	fn accumulate(counts: &BTreeMap<i64, u64>) -> Vec<TimePoint> {
		let mut running = 0;
		counts
			.iter()
			.map(|(&time, &clause_count)| {
				running += clause_count;
				TimePoint { time, clause_count, clause_cum_count: running }
			})
			.collect()
	}

	pub fn points(&self) -> &[TimePoint] {
		&self.points
	}

	/// Event times the override table has no size for (always empty without override).
	pub fn missing_times(&self) -> &[i64] {
		&self.missing
	}

	pub fn is_overridden(&self) -> bool {
		self.overridden
	}

	pub fn point(&self, time: i64) -> Option<&TimePoint> {
		self.points
			.binary_search_by_key(&time, |point| point.time)
			.ok()
			.map(|index| &self.points[index])
	}

	/// # Errors
	/// `SpError::MissingCorpusSize` if no size is known for `time`.
	pub fn clause_count(&self, time: i64) -> SpResult<u64> {
		self.point(time)
			.map(|point| point.clause_count)
			.ok_or(SpError::MissingCorpusSize { time })
	}

	/// # Errors
	/// `SpError::MissingCorpusSize` if no size is known for `time`.
	pub fn clause_cum_count(&self, time: i64) -> SpResult<u64> {
		self.point(time)
			.map(|point| point.clause_cum_count)
			.ok_or(SpError::MissingCorpusSize { time })
	}

	/// Computes, for every point, the earliest point still inside a window
	/// of `window` corpus-mass units.
	///
	/// A point `p'` is inside the window ending at `p` when
	/// `cum(p') > cum(p) - window`. The start pointer only moves forward,
	/// so the whole pass is linear.
	pub fn window_spans(&self, window: u64) -> Vec<WindowSpan> {
		let mut spans = Vec::with_capacity(self.points.len());
		let mut start = 0;
		for point in &self.points {
			while self.points[start].clause_cum_count.saturating_add(window) <= point.clause_cum_count {
				start += 1;
			}
			spans.push(WindowSpan { time: point.time, start_time: self.points[start].time });
		}
		spans
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::event::Event;

	fn corpus() -> Corpus {
		Corpus::new(
			"test",
			vec![
				Event::new("a", 10, true, false),
				Event::new("b", 10, false, false),
				Event::new("a", 20, true, true),
				Event::new("c", 30, true, false),
				Event::new("c", 30, true, false),
				Event::new("d", 30, false, false),
			],
		)
	}

	#[test]
	fn counts_every_event() {
		let table = TimeFrequencyTable::from_corpus(&corpus());
		let counts: Vec<(i64, u64, u64)> = table
			.points()
			.iter()
			.map(|p| (p.time, p.clause_count, p.clause_cum_count))
			.collect();
		assert_eq!(counts, vec![(10, 2, 2), (20, 1, 3), (30, 3, 6)]);
		assert!(!table.is_overridden());
	}

	#[test]
	fn override_replaces_counts_and_reports_missing() {
		let sizes = BTreeMap::from([(5, 100), (10, 1000), (30, 500)]);
		let table = TimeFrequencyTable::with_corpus_sizes(&corpus(), &sizes);

		assert_eq!(table.clause_count(10).unwrap(), 1000);
		assert_eq!(table.clause_cum_count(10).unwrap(), 1100);
		assert_eq!(table.clause_cum_count(30).unwrap(), 1600);
		assert_eq!(table.missing_times(), &[20]);
		assert!(matches!(table.clause_cum_count(20), Err(SpError::MissingCorpusSize { time: 20 })));
	}

	#[test]
	fn window_is_measured_in_corpus_mass() {
		let sizes = BTreeMap::from([(1, 10), (2, 10), (3, 100), (4, 10)]);
		let table = TimeFrequencyTable::with_corpus_sizes(&Corpus::default(), &sizes);
		// cumulative: 10, 20, 120, 130
		let spans = table.window_spans(25);
		let starts: Vec<i64> = spans.iter().map(|s| s.start_time).collect();
		assert_eq!(starts, vec![1, 1, 3, 3]);
		assert_eq!(spans[1].span(), 1);
	}

	#[test]
	fn window_of_one_covers_only_current_point() {
		let table = TimeFrequencyTable::from_corpus(&corpus());
		assert!(table.window_spans(1).iter().all(|s| s.start_time == s.time));
	}
}

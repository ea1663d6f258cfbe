use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::TieBreak;
use super::event::Corpus;
use super::learner::LearnerKind;
use super::rank::rank_descending;
use super::time_frequency::TimeFrequencyTable;

/// One (time, type, follows_rule) structure and everything derived from it.
///
/// Window fields are `None` when the time has no known corpus size.
/// Ranks and vocabulary sizes are 0 / `None` until the row's slice has gone
/// through ranking and vocabulary resolution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StructureRow {
	pub time: i64,
	#[serde(rename = "type")]
	pub lemma: String,
	pub follows_rule: bool,
	/// In-class occurrences at exactly `time` (0 for carried-forward rows).
	pub freq: u64,
	/// Occurrences of this structure at or before `time`.
	pub cum_freq: u64,
	pub cum_freq_rank: u32,
	/// Cumulative corpus mass at `time`.
	pub clause_cum_freq: Option<u64>,
	/// Occurrences inside the trailing window of corpus mass.
	pub window_freq: Option<u64>,
	pub window_freq_rank: Option<u32>,
	/// Earliest time inside the window (diagnostic only).
	pub window_start_time: Option<i64>,
	/// Distinct types ranked at or above this row by `cum_freq`.
	pub cum_vocab_n: u32,
	/// Distinct types ranked at or above this row by `window_freq`.
	pub window_vocab_n: Option<u32>,
	pub eligible_ep: bool,
	pub eligible_es: bool,
	pub eligible_ip: bool,
	pub eligible_is: bool,
}

impl StructureRow {
	/// Eligibility flag for the given learner.
	pub fn is_eligible(&self, learner: LearnerKind) -> bool {
		match learner {
			LearnerKind::Ep => self.eligible_ep,
			LearnerKind::Es => self.eligible_es,
			LearnerKind::Ip => self.eligible_ip,
			LearnerKind::Is => self.eligible_is,
		}
	}
}

/// All rows sharing one time value.
///
/// Rows are kept in (type, follows_rule) order; seeded tie-breaking relies
/// on that order.
#[derive(Clone, Debug)]
pub struct TimeSlice {
	pub time: i64,
	/// False when the corpus size for `time` is unknown.
	pub windowed: bool,
	pub rows: Vec<StructureRow>,
}

impl TimeSlice {
	/// Assigns `cum_freq_rank` and, when windowed, `window_freq_rank`.
	///
	/// Both rankings draw their tie-break keys from the same slice stream,
	/// so two rows tied on both frequencies keep the same relative order.
	pub fn rank(&mut self, tie_break: TieBreak) {
		let lexical: Vec<(&str, bool)> = self
			.rows
			.iter()
			.map(|row| (row.lemma.as_str(), row.follows_rule))
			.collect();

		let cum_frequencies: Vec<u64> = self.rows.iter().map(|row| row.cum_freq).collect();
		let cum_ranks = rank_descending(&cum_frequencies, &lexical, tie_break, self.time);

		let window_ranks = if self.windowed {
			let window_frequencies: Vec<u64> =
				self.rows.iter().map(|row| row.window_freq.unwrap_or(0)).collect();
			Some(rank_descending(&window_frequencies, &lexical, tie_break, self.time))
		} else {
			None
		};

		for (index, row) in self.rows.iter_mut().enumerate() {
			row.cum_freq_rank = cum_ranks[index];
			row.window_freq_rank = window_ranks.as_ref().map(|ranks| ranks[index]);
		}
	}
}

/// Builds the structure table: one forward-filled row per (time, key).
///
/// # Responsibilities
/// - Count in-class occurrences per (type, follows_rule, time)
/// - Accumulate `cum_freq` by prefix sum along each key's timeline
/// - Accumulate `window_freq` with a sliding pointer over `clause_cum_freq`
///
/// # Notes
/// - A key gets rows from its first occurrence onward, at every event time.
/// - Out-of-class events never produce rows.
/// - Rows at times with unknown corpus size do not enter any window.
pub struct StructureAggregator<'a> {
	table: &'a TimeFrequencyTable,
	window: u64,
}

impl<'a> StructureAggregator<'a> {
	pub fn new(table: &'a TimeFrequencyTable, window: u64) -> Self {
		Self { table, window }
	}

	/// Produces the unranked time slices, ascending by time.
	pub fn accumulate(&self, corpus: &Corpus) -> Vec<TimeSlice> {
		let times = corpus.times();
		let starts: HashMap<i64, i64> = self
			.table
			.window_spans(self.window)
			.into_iter()
			.map(|span| (span.time, span.start_time))
			.collect();

		let mut counts: BTreeMap<(&str, bool), BTreeMap<i64, u64>> = BTreeMap::new();
		for event in corpus.events().iter().filter(|event| event.in_class) {
			*counts
				.entry((event.lemma.as_str(), event.follows_rule))
				.or_default()
				.entry(event.time)
				.or_insert(0) += 1;
		}

		let mut slices: Vec<TimeSlice> = times
			.iter()
			.map(|&time| TimeSlice {
				time,
				windowed: self.table.clause_cum_count(time).is_ok(),
				rows: Vec::new(),
			})
			.collect();

		for ((lemma, follows_rule), per_time) in &counts {
			let Some(&first) = per_time.keys().next() else {
				continue;
			};

			let mut cum_freq = 0;
			// (clause_cum_freq, freq) of this key's windowable rows, in time order
			let mut history: Vec<(u64, u64)> = Vec::new();
			let mut tail = 0;
			let mut window_sum = 0;

			let offset = times.partition_point(|&time| time < first);
			for (time, slice) in times[offset..].iter().zip(slices[offset..].iter_mut()) {
				let freq = per_time.get(time).copied().unwrap_or(0);
				cum_freq += freq;

				let (clause_cum_freq, window_freq, window_start_time) = match self.table.clause_cum_count(*time) {
					Ok(clause_cum) => {
						history.push((clause_cum, freq));
						window_sum += freq;
						while history[tail].0.saturating_add(self.window) <= clause_cum {
							window_sum -= history[tail].1;
							tail += 1;
						}
						(Some(clause_cum), Some(window_sum), starts.get(time).copied())
					}
					Err(_) => (None, None, None),
				};

				slice.rows.push(StructureRow {
					time: *time,
					lemma: (*lemma).to_owned(),
					follows_rule: *follows_rule,
					freq,
					cum_freq,
					cum_freq_rank: 0,
					clause_cum_freq,
					window_freq,
					window_freq_rank: None,
					window_start_time,
					cum_vocab_n: 0,
					window_vocab_n: None,
					eligible_ep: false,
					eligible_es: false,
					eligible_ip: false,
					eligible_is: false,
				});
			}
		}

		slices
	}
}

use std::collections::HashSet;

use super::structure::{StructureRow, TimeSlice};

/// Turns per-slice structure ranks into distinct-type counts.
///
/// A type may appear as two structures in the same slice (rule-following
/// and not). The vocabulary size of a row is the number of distinct *types*
/// whose best structure is ranked at or above it, so the second structure of
/// a type never adds to the count.
///
/// Ranks within a slice are unique, so one pass in rank order with a set of
/// seen types gives every row its count.
pub struct VocabularySizeResolver;

impl VocabularySizeResolver {
	/// Fills `cum_vocab_n`, and `window_vocab_n` when the slice is windowed.
	///
	/// Must run after `TimeSlice::rank`.
	pub fn resolve(slice: &mut TimeSlice) {
		let cum = Self::distinct_counts(&slice.rows, |row| Some(row.cum_freq_rank));
		let window = if slice.windowed {
			Some(Self::distinct_counts(&slice.rows, |row| row.window_freq_rank))
		} else {
			None
		};

		for (index, row) in slice.rows.iter_mut().enumerate() {
			row.cum_vocab_n = cum[index];
			row.window_vocab_n = window.as_ref().map(|counts| counts[index]);
		}
	}

	fn distinct_counts<F>(rows: &[StructureRow], rank: F) -> Vec<u32>
	where
		F: Fn(&StructureRow) -> Option<u32>,
	{
		let mut order: Vec<(u32, usize)> = rows
			.iter()
			.enumerate()
			.filter_map(|(index, row)| rank(row).map(|rank| (rank, index)))
			.collect();
		order.sort_unstable();

		let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());
		let mut counts = vec![0; rows.len()];
		for (_, index) in order {
			seen.insert(rows[index].lemma.as_str());
			counts[index] = seen.len() as u32;
		}
		counts
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::TieBreak;
	use crate::model::event::{Corpus, Event};
	use crate::model::structure::StructureAggregator;
	use crate::model::time_frequency::TimeFrequencyTable;

	fn resolved_slice(events: Vec<Event>) -> TimeSlice {
		let corpus = Corpus::new("test", events);
		let table = TimeFrequencyTable::from_corpus(&corpus);
		let mut slices = StructureAggregator::new(&table, 1000).accumulate(&corpus);
		let mut slice = slices.remove(0);
		slice.rank(TieBreak::Lexical);
		VocabularySizeResolver::resolve(&mut slice);
		slice
	}

	fn repeated(lemma: &str, follows_rule: bool, count: usize) -> Vec<Event> {
		(0..count).map(|_| Event::new(lemma, 1, true, follows_rule)).collect()
	}

	#[test]
	fn second_structure_of_a_type_does_not_add_to_vocabulary() {
		let mut events = Vec::new();
		events.extend(repeated("loven", false, 6));
		events.extend(repeated("dreden", false, 5));
		events.extend(repeated("admire", false, 4));
		events.extend(repeated("plesen", false, 3));
		events.extend(repeated("haten", false, 2));
		events.extend(repeated("dreden", true, 1));
		let slice = resolved_slice(events);

		let mut by_rank: Vec<&StructureRow> = slice.rows.iter().collect();
		by_rank.sort_by_key(|row| row.cum_freq_rank);
		let vocab: Vec<(&str, bool, u32)> = by_rank
			.iter()
			.map(|row| (row.lemma.as_str(), row.follows_rule, row.cum_vocab_n))
			.collect();

		assert_eq!(
			vocab,
			vec![
				("loven", false, 1),
				("dreden", false, 2),
				("admire", false, 3),
				("plesen", false, 4),
				("haten", false, 5),
				("dreden", true, 5),
			]
		);
	}

	#[test]
	fn duplicate_type_ranked_fifth_shares_count_with_fourth() {
		let mut events = Vec::new();
		events.extend(repeated("loven", false, 6));
		events.extend(repeated("dreden", false, 5));
		events.extend(repeated("admire", false, 4));
		events.extend(repeated("plesen", false, 3));
		events.extend(repeated("dreden", true, 2));
		events.extend(repeated("haten", false, 1));
		let slice = resolved_slice(events);

		let vocab_of = |lemma: &str, follows_rule: bool| {
			slice
				.rows
				.iter()
				.find(|row| row.lemma == lemma && row.follows_rule == follows_rule)
				.map(|row| (row.cum_freq_rank, row.cum_vocab_n))
				.unwrap()
		};
		assert_eq!(vocab_of("plesen", false), (4, 4));
		assert_eq!(vocab_of("dreden", true), (5, 4));
		assert_eq!(vocab_of("haten", false), (6, 5));
	}

	#[test]
	fn window_vocabulary_follows_window_ranks() {
		let slice = resolved_slice(vec![
			Event::new("a", 1, true, false),
			Event::new("a", 1, true, true),
			Event::new("b", 1, true, false),
		]);
		assert!(slice.rows.iter().all(|row| row.window_vocab_n.is_some()));
		let max = slice.rows.iter().filter_map(|row| row.window_vocab_n).max();
		assert_eq!(max, Some(2));
	}
}

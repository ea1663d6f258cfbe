use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::TieBreak;
use super::event::Corpus;
use super::rank::rank_descending;

/// Salt used for the corpus-wide ranking; time slices use their own time.
const CORPUS_RANK_SALT: i64 = i64::MIN;

/// Corpus-wide frequency of one type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TypeFrequency {
	#[serde(rename = "type")]
	pub lemma: String,
	/// Occurrences over the whole corpus, in-class or not.
	pub total_freq: u64,
	/// True if at least one occurrence is in-class.
	pub in_class: bool,
	/// 1-based rank by descending `total_freq`.
	pub rank: u32,
}

/// Overall type ranking and the in-class vocabulary cap derived from it.
///
/// `NTRIM` counts in- and out-of-class types alike, while learners only ever
/// see in-class rows. The cap applied to inexperienced learners is therefore
/// `ntrim_inclass`: the number of in-class types among the top `ntrim`.
///
/// # Invariants
/// - `types` is sorted by ascending `rank`
/// - `ntrim_inclass <= ntrim`
/// - `ntrim_inclass <= inclass_type_count()`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct VocabularyRanking {
	types: Vec<TypeFrequency>,
	ntrim: usize,
	ntrim_inclass: u32,
}

impl VocabularyRanking {
	/// Ranks every distinct type of the corpus and derives `NTRIM_INCLASS`.
	pub fn estimate(corpus: &Corpus, ntrim: usize, tie_break: TieBreak) -> Self {
		let mut totals: BTreeMap<&str, (u64, bool)> = BTreeMap::new();
		for event in corpus.events() {
			let entry = totals.entry(event.lemma.as_str()).or_insert((0, false));
			entry.0 += 1;
			entry.1 |= event.in_class;
		}

		let lemmas: Vec<&str> = totals.keys().copied().collect();
		let frequencies: Vec<u64> = totals.values().map(|(total, _)| *total).collect();
		let ranks = rank_descending(&frequencies, &lemmas, tie_break, CORPUS_RANK_SALT);

		let mut types: Vec<TypeFrequency> = totals
			.into_iter()
			.zip(ranks)
			.map(|((lemma, (total_freq, in_class)), rank)| TypeFrequency {
				lemma: lemma.to_owned(),
				total_freq,
				in_class,
				rank,
			})
			.collect();
		types.sort_by_key(|frequency| frequency.rank);

		let ntrim_inclass = types
			.iter()
			.take_while(|frequency| frequency.rank as usize <= ntrim)
			.filter(|frequency| frequency.in_class)
			.count() as u32;

		Self { types, ntrim, ntrim_inclass }
	}

	/// All types, best-ranked first.
	pub fn types(&self) -> &[TypeFrequency] {
		&self.types
	}

	pub fn ntrim(&self) -> usize {
		self.ntrim
	}

	/// Vocabulary cap for inexperienced learners.
	pub fn ntrim_inclass(&self) -> u32 {
		self.ntrim_inclass
	}

	pub fn inclass_type_count(&self) -> usize {
		self.types.iter().filter(|frequency| frequency.in_class).count()
	}

	pub fn rank_of(&self, lemma: &str) -> Option<u32> {
		self.types.iter().find(|frequency| frequency.lemma == lemma).map(|frequency| frequency.rank)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::event::Event;

	fn corpus() -> Corpus {
		let mut events = Vec::new();
		// "be" is out of class but the most frequent type overall
		for _ in 0..5 {
			events.push(Event::new("be", 1, false, false));
		}
		for _ in 0..4 {
			events.push(Event::new("love", 1, true, false));
		}
		for _ in 0..3 {
			events.push(Event::new("hate", 2, true, true));
		}
		events.push(Event::new("fear", 2, true, false));
		events.push(Event::new("run", 2, false, false));
		Corpus::new("test", events)
	}

	#[test]
	fn ranks_all_types_including_out_of_class() {
		let ranking = VocabularyRanking::estimate(&corpus(), 2, TieBreak::Lexical);
		let order: Vec<&str> = ranking.types().iter().map(|t| t.lemma.as_str()).collect();
		// fear and run tie at 1; lexical order puts fear first
		assert_eq!(order, vec!["be", "love", "hate", "fear", "run"]);
		assert_eq!(ranking.rank_of("run"), Some(5));
		assert_eq!(ranking.inclass_type_count(), 3);
	}

	#[test]
	fn ntrim_inclass_counts_only_inclass_types_in_top_ntrim() {
		let ranking = VocabularyRanking::estimate(&corpus(), 2, TieBreak::Lexical);
		assert_eq!(ranking.ntrim_inclass(), 1);

		let ranking = VocabularyRanking::estimate(&corpus(), 4, TieBreak::Lexical);
		assert_eq!(ranking.ntrim_inclass(), 3);
	}

	#[test]
	fn ntrim_inclass_is_bounded_by_inclass_types() {
		let ranking = VocabularyRanking::estimate(&corpus(), 1000, TieBreak::Seeded { seed: 9 });
		assert_eq!(ranking.ntrim_inclass() as usize, ranking.inclass_type_count());
	}
}

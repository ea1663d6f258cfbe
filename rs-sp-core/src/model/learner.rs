use std::fmt;

use serde::{Deserialize, Serialize};

use super::structure::{StructureRow, TimeSlice};

/// How much of the history a learner sees.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Exposure {
	/// The whole corpus up to the current time.
	Panchronic,
	/// Only the trailing window of corpus mass.
	Synchronic,
}

/// Whether a learner's vocabulary is capped by overall frequency rank.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Experience {
	Experienced,
	/// Capped at `NTRIM_INCLASS` types.
	Inexperienced,
}

/// The four learner models.
///
/// Each variant is a pair (exposure, experience); every per-learner
/// computation reads its frequency, vocabulary size and cap through the
/// accessors below instead of being written four times.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LearnerKind {
	/// Experienced panchronic.
	Ep,
	/// Experienced synchronic.
	Es,
	/// Inexperienced panchronic.
	Ip,
	/// Inexperienced synchronic.
	Is,
}

impl LearnerKind {
	pub const ALL: [LearnerKind; 4] = [LearnerKind::Ep, LearnerKind::Es, LearnerKind::Ip, LearnerKind::Is];

	pub fn new(exposure: Exposure, experience: Experience) -> Self {
		match (exposure, experience) {
			(Exposure::Panchronic, Experience::Experienced) => LearnerKind::Ep,
			(Exposure::Synchronic, Experience::Experienced) => LearnerKind::Es,
			(Exposure::Panchronic, Experience::Inexperienced) => LearnerKind::Ip,
			(Exposure::Synchronic, Experience::Inexperienced) => LearnerKind::Is,
		}
	}

	pub fn exposure(self) -> Exposure {
		match self {
			LearnerKind::Ep | LearnerKind::Ip => Exposure::Panchronic,
			LearnerKind::Es | LearnerKind::Is => Exposure::Synchronic,
		}
	}

	pub fn experience(self) -> Experience {
		match self {
			LearnerKind::Ep | LearnerKind::Es => Experience::Experienced,
			LearnerKind::Ip | LearnerKind::Is => Experience::Inexperienced,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			LearnerKind::Ep => "ep",
			LearnerKind::Es => "es",
			LearnerKind::Ip => "ip",
			LearnerKind::Is => "is",
		}
	}

	/// Parses `ep`, `es`, `ip` or `is` (case-insensitive).
	pub fn parse(value: &str) -> Option<Self> {
		LearnerKind::ALL
			.into_iter()
			.find(|learner| learner.as_str().eq_ignore_ascii_case(value.trim()))
	}

	/// Frequency the learner sees for this row (`None` if unknown).
	pub fn frequency(self, row: &StructureRow) -> Option<u64> {
		match self.exposure() {
			Exposure::Panchronic => Some(row.cum_freq),
			Exposure::Synchronic => row.window_freq,
		}
	}

	/// Vocabulary size the learner would have at this row's rank.
	pub fn vocabulary_size(self, row: &StructureRow) -> Option<u32> {
		match self.exposure() {
			Exposure::Panchronic => Some(row.cum_vocab_n),
			Exposure::Synchronic => row.window_vocab_n,
		}
	}

	/// Vocabulary cap, if any.
	pub fn cap(self, ntrim_inclass: u32) -> Option<u32> {
		match self.experience() {
			Experience::Experienced => None,
			Experience::Inexperienced => Some(ntrim_inclass),
		}
	}

	/// Whether the row is known to this learner.
	///
	/// The learner must have seen the structure at least once; an
	/// inexperienced learner must also not need more than `ntrim_inclass`
	/// types to reach it.
	pub fn knows(self, row: &StructureRow, ntrim_inclass: u32) -> bool {
		let seen = self.frequency(row).is_some_and(|frequency| frequency > 0);
		let within_cap = match self.cap(ntrim_inclass) {
			None => true,
			Some(cap) => self.vocabulary_size(row).is_some_and(|size| size <= cap),
		};
		seen && within_cap
	}
}

impl fmt::Display for LearnerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Sets the four `eligible_*` flags of every row in a resolved slice.
pub struct LearnerEligibilityClassifier {
	ntrim_inclass: u32,
}

impl LearnerEligibilityClassifier {
	pub fn new(ntrim_inclass: u32) -> Self {
		Self { ntrim_inclass }
	}

	/// Must run after `VocabularySizeResolver::resolve`.
	pub fn classify(&self, slice: &mut TimeSlice) {
		for row in &mut slice.rows {
			row.eligible_ep = LearnerKind::Ep.knows(row, self.ntrim_inclass);
			row.eligible_es = LearnerKind::Es.knows(row, self.ntrim_inclass);
			row.eligible_ip = LearnerKind::Ip.knows(row, self.ntrim_inclass);
			row.eligible_is = LearnerKind::Is.knows(row, self.ntrim_inclass);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row(cum_freq: u64, window_freq: Option<u64>, cum_vocab_n: u32, window_vocab_n: Option<u32>) -> StructureRow {
		StructureRow {
			time: 1,
			lemma: "love".to_owned(),
			follows_rule: false,
			freq: 0,
			cum_freq,
			cum_freq_rank: 1,
			clause_cum_freq: window_freq.map(|_| 10),
			window_freq,
			window_freq_rank: window_freq.map(|_| 1),
			window_start_time: window_freq.map(|_| 1),
			cum_vocab_n,
			window_vocab_n,
			eligible_ep: false,
			eligible_es: false,
			eligible_ip: false,
			eligible_is: false,
		}
	}

	fn classified(row: StructureRow, ntrim_inclass: u32) -> StructureRow {
		let mut slice = TimeSlice { time: 1, windowed: row.window_freq.is_some(), rows: vec![row] };
		LearnerEligibilityClassifier::new(ntrim_inclass).classify(&mut slice);
		slice.rows.remove(0)
	}

	#[test]
	fn variants_pair_exposure_and_experience() {
		for learner in LearnerKind::ALL {
			assert_eq!(LearnerKind::new(learner.exposure(), learner.experience()), learner);
		}
		assert_eq!(LearnerKind::parse("IS"), Some(LearnerKind::Is));
		assert_eq!(LearnerKind::parse("xx"), None);
	}

	#[test]
	fn stale_structure_is_known_only_panchronically() {
		let row = classified(row(3, Some(0), 2, Some(2)), 10);
		assert!(row.eligible_ep);
		assert!(!row.eligible_es);
		assert!(row.eligible_ip);
		assert!(!row.eligible_is);
	}

	#[test]
	fn cap_applies_to_inexperienced_learners_only() {
		let row = classified(row(3, Some(2), 5, Some(4)), 4);
		assert!(row.eligible_ep);
		assert!(row.eligible_es);
		assert!(!row.eligible_ip);
		assert!(row.eligible_is);
	}

	#[test]
	fn unknown_window_disables_synchronic_learners() {
		let row = classified(row(3, None, 1, None), 10);
		assert!(row.eligible_ep && row.eligible_ip);
		assert!(!row.eligible_es && !row.eligible_is);
	}

	#[test]
	fn serializes_as_short_ids() {
		assert_eq!(serde_json::to_string(&LearnerKind::Ip).unwrap(), "\"ip\"");
	}
}

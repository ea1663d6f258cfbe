use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SpError, SpResult};
use super::learner::{Exposure, LearnerKind};
use super::report::Diagnostics;
use super::structure::TimeSlice;

/// Tolerance threshold `θ_n = ceil(n / ln n)`.
///
/// Returns `None` when `n <= 1` (`ln 1 = 0`, and the threshold is undefined).
pub fn theta(n: u32) -> Option<u32> {
	if n <= 1 {
		return None;
	}
	let n = f64::from(n);
	Some((n / n.ln()).ceil() as u32)
}

/// Sufficiency verdict of one learner at one time.
///
/// # Invariants
/// - `n >= 2`
/// - `m <= n`
/// - `sufficient == (margin < 0)`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LearnerSnapshot {
	pub time: i64,
	pub learner_id: LearnerKind,
	/// Types known to the learner.
	pub n: u32,
	/// Known types seen following the rule.
	pub m: u32,
	pub theta_n: u32,
	/// `(n - m) < theta_n`.
	pub sufficient: bool,
	/// `(n - m) - theta_n`; negative when the rule is productive.
	pub margin: i64,
}

impl LearnerSnapshot {
	/// Applies the sufficiency test to `n` known types, `m` of them rule-following.
	///
	/// # Errors
	/// `SpError::DegenerateThreshold` if `n <= 1`.
	pub fn evaluate(time: i64, learner_id: LearnerKind, n: u32, m: u32) -> SpResult<Self> {
		let theta_n = theta(n).ok_or(SpError::DegenerateThreshold { time, learner: learner_id, n })?;
		let exceptions = i64::from(n) - i64::from(m);
		let margin = exceptions - i64::from(theta_n);
		Ok(Self { time, learner_id, n, m, theta_n, sufficient: margin < 0, margin })
	}

	/// Known types that do not follow the rule (`n - m`).
	pub fn exceptions(&self) -> u32 {
		self.n.saturating_sub(self.m)
	}
}

/// Reduces classified time slices to per-learner snapshots.
pub struct SufficiencyCalculator;

impl SufficiencyCalculator {
	/// Counts `(n, m)` over the rows eligible for `learner` in a slice.
	///
	/// - `n`: largest vocabulary size among eligible rows
	/// - `m`: distinct types among eligible rule-following rows
	pub fn counts(slice: &TimeSlice, learner: LearnerKind) -> (u32, u32) {
		let mut n: u32 = 0;
		let mut followers: HashSet<&str> = HashSet::new();
		for row in slice.rows.iter().filter(|row| row.is_eligible(learner)) {
			if let Some(size) = learner.vocabulary_size(row) {
				n = n.max(size);
			}
			if row.follows_rule {
				followers.insert(row.lemma.as_str());
			}
		}
		(n, followers.len() as u32)
	}

	/// Snapshot of one learner on one slice.
	///
	/// # Errors
	/// - `SpError::MissingCorpusSize` for a synchronic learner on a slice
	///   with no known corpus size
	/// - `SpError::DegenerateThreshold` if `n <= 1`
	pub fn snapshot(slice: &TimeSlice, learner: LearnerKind) -> SpResult<LearnerSnapshot> {
		if !slice.windowed && learner.exposure() == Exposure::Synchronic {
			return Err(SpError::MissingCorpusSize { time: slice.time });
		}
		let (n, m) = Self::counts(slice, learner);
		LearnerSnapshot::evaluate(slice.time, learner, n, m)
	}

	/// Builds the full series, ordered by learner then time.
	///
	/// Skipped snapshots are recorded in `diagnostics`.
	///
	/// # Errors
	/// Only if `diagnostics` refuses an error as non-recoverable, which
	/// `snapshot` never produces.
	pub fn evaluate(slices: &[TimeSlice], diagnostics: &mut Diagnostics) -> SpResult<Vec<LearnerSnapshot>> {
		let mut snapshots = Vec::with_capacity(slices.len() * LearnerKind::ALL.len());
		for learner in LearnerKind::ALL {
			for slice in slices {
				match Self::snapshot(slice, learner) {
					Ok(snapshot) => snapshots.push(snapshot),
					Err(error) => diagnostics.record(error)?,
				}
			}
			debug!(%learner, snapshots = snapshots.len(), "Learner series reduced");
		}
		Ok(snapshots)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn theta_of_ten_is_five() {
		assert_eq!(theta(10), Some(5));
	}

	#[test]
	fn theta_is_undefined_below_two() {
		assert_eq!(theta(0), None);
		assert_eq!(theta(1), None);
		assert_eq!(theta(2), Some(3));
	}

	#[test]
	fn ten_types_six_regular_is_sufficient() {
		let snapshot = LearnerSnapshot::evaluate(1500, LearnerKind::Ep, 10, 6).unwrap();
		assert_eq!(snapshot.theta_n, 5);
		assert_eq!(snapshot.exceptions(), 4);
		assert!(snapshot.sufficient);
		assert_eq!(snapshot.margin, -1);
	}

	#[test]
	fn ten_types_five_regular_is_not_sufficient() {
		let snapshot = LearnerSnapshot::evaluate(1500, LearnerKind::Es, 10, 5).unwrap();
		assert!(!snapshot.sufficient);
		assert_eq!(snapshot.margin, 0);
	}

	#[test]
	fn degenerate_n_is_an_error() {
		let error = LearnerSnapshot::evaluate(1500, LearnerKind::Ip, 1, 1).unwrap_err();
		assert!(matches!(error, SpError::DegenerateThreshold { time: 1500, n: 1, .. }));
	}
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::TieBreak;

/// Mixes the run seed with a slice identifier so every slice draws an
/// independent, reproducible key stream whatever thread it runs on.
fn slice_seed(seed: u64, salt: i64) -> u64 {
	let mut z = seed ^ (salt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
	z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
	z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
	z ^ (z >> 31)
}

/// Assigns dense 1-based ranks by descending frequency.
///
/// `frequencies[i]` and `lexical[i]` describe item `i`; the returned vector
/// holds the rank of item `i` at index `i`. Every rank in `1..=len` is used
/// exactly once.
///
/// # Notes
/// - With `TieBreak::Seeded`, item `i` gets the `i`-th key drawn from the
///   slice generator, so callers must present items in a canonical order.
/// - `lexical` is the final fallback in both strategies.
pub(crate) fn rank_descending<K: Ord>(
	frequencies: &[u64],
	lexical: &[K],
	tie_break: TieBreak,
	salt: i64,
) -> Vec<u32> {
	let len = frequencies.len();
	let keys: Vec<u64> = match tie_break {
		TieBreak::Lexical => vec![0; len],
		TieBreak::Seeded { seed } => {
			let mut rng = StdRng::seed_from_u64(slice_seed(seed, salt));
			(0..len).map(|_| rng.random::<u64>()).collect()
		}
	};

	let mut order: Vec<usize> = (0..len).collect();
	order.sort_by(|&a, &b| {
		frequencies[b]
			.cmp(&frequencies[a])
			.then(keys[a].cmp(&keys[b]))
			.then_with(|| lexical[a].cmp(&lexical[b]))
	});

	let mut ranks = vec![0; len];
	for (position, index) in order.into_iter().enumerate() {
		ranks[index] = position as u32 + 1;
	}
	ranks
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lexical_ties_follow_key_order() {
		let ranks = rank_descending(&[3, 5, 3, 1], &["b", "z", "a", "c"], TieBreak::Lexical, 0);
		assert_eq!(ranks, vec![3, 1, 2, 4]);
	}

	#[test]
	fn seeded_ranks_are_reproducible() {
		let frequencies = vec![2; 50];
		let lexical: Vec<usize> = (0..50).collect();
		let tie_break = TieBreak::Seeded { seed: 11 };
		let first = rank_descending(&frequencies, &lexical, tie_break, 1850);
		let second = rank_descending(&frequencies, &lexical, tie_break, 1850);
		assert_eq!(first, second);

		let mut sorted = first.clone();
		sorted.sort_unstable();
		assert_eq!(sorted, (1..=50).collect::<Vec<u32>>());
	}

	#[test]
	fn seeded_ranks_respect_frequency_order() {
		let ranks = rank_descending(&[1, 9, 4], &[0, 1, 2], TieBreak::Seeded { seed: 3 }, 0);
		assert_eq!(ranks, vec![3, 1, 2]);
	}

	#[test]
	fn different_seeds_shuffle_ties() {
		let frequencies = vec![1; 64];
		let lexical: Vec<usize> = (0..64).collect();
		let a = rank_descending(&frequencies, &lexical, TieBreak::Seeded { seed: 1 }, 0);
		let b = rank_descending(&frequencies, &lexical, TieBreak::Seeded { seed: 2 }, 0);
		assert_ne!(a, b);
	}
}

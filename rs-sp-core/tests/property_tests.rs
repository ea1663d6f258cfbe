//! Property-based checks of the pipeline invariants on random corpora.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rs_sp_core::{Corpus, Event, LearnerKind, ProductivityPipeline, ProductivityReport, SpConfig, TieBreak};

const LEMMAS: [&str; 7] = ["loven", "dreden", "admire", "plesen", "haten", "fearen", "wonder"];

fn corpus_strategy() -> impl Strategy<Value = Corpus> {
	prop::collection::vec((0..LEMMAS.len(), 0i64..8, prop::bool::weighted(0.8), any::<bool>()), 1..80).prop_map(
		|raw| {
			let events = raw
				.into_iter()
				.map(|(lemma, time, in_class, follows_rule)| Event::new(LEMMAS[lemma], time, in_class, follows_rule))
				.collect();
			Corpus::new("random", events)
		},
	)
}

fn run(corpus: &Corpus, window: u64, ntrim: usize, seed: u64) -> ProductivityReport {
	let config = SpConfig::new(window, ntrim)
		.unwrap()
		.with_tie_break(TieBreak::Seeded { seed })
		.with_threads(1);
	ProductivityPipeline::new(config).unwrap().run(corpus).unwrap()
}

fn n_by_time(report: &ProductivityReport, learner: LearnerKind) -> BTreeMap<i64, u32> {
	report.series(learner).map(|snapshot| (snapshot.time, snapshot.n)).collect()
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn window_frequency_never_exceeds_cumulative(corpus in corpus_strategy(), window in 1u64..40, seed in any::<u64>()) {
		let report = run(&corpus, window, 4, seed);
		for row in report.structures() {
			prop_assert!(row.cum_freq >= row.window_freq.unwrap_or(0));
			prop_assert!(row.cum_freq > 0);
		}
	}

	#[test]
	fn synchronic_vocabulary_grows_with_window(
		corpus in corpus_strategy(),
		small in 1u64..30,
		extra in 1u64..30,
		ntrim in 1usize..8,
		seed in any::<u64>(),
	) {
		let narrow = run(&corpus, small, ntrim, seed);
		let wide = run(&corpus, small + extra, ntrim, seed);

		for learner in [LearnerKind::Es, LearnerKind::Is] {
			let wide_n = n_by_time(&wide, learner);
			for (time, n) in n_by_time(&narrow, learner) {
				let larger = wide_n.get(&time).copied();
				prop_assert!(larger.is_some_and(|larger| larger >= n), "{learner} at {time}: {n} vs {larger:?}");
			}
		}
	}

	#[test]
	fn panchronic_experienced_learner_only_accumulates(corpus in corpus_strategy(), seed in any::<u64>()) {
		let report = run(&corpus, 10, 4, seed);
		let series: Vec<_> = report.series(LearnerKind::Ep).collect();
		for pair in series.windows(2) {
			prop_assert!(pair[0].n <= pair[1].n);
			prop_assert!(pair[0].m <= pair[1].m);
		}
	}

	#[test]
	fn snapshots_are_consistent(corpus in corpus_strategy(), window in 1u64..40, ntrim in 1usize..8) {
		let report = run(&corpus, window, ntrim, 7);
		let cap = report.vocabulary().ntrim_inclass();
		prop_assert!(cap as usize <= ntrim);
		prop_assert!(cap as usize <= corpus.inclass_types().len());

		for snapshot in report.snapshots() {
			prop_assert!(snapshot.n >= 2);
			prop_assert!(snapshot.m <= snapshot.n);
			prop_assert_eq!(snapshot.sufficient, snapshot.margin < 0);
			if snapshot.learner_id == LearnerKind::Ip || snapshot.learner_id == LearnerKind::Is {
				prop_assert!(snapshot.n <= cap);
			}
		}
	}

	#[test]
	fn identical_input_and_seed_give_identical_output(corpus in corpus_strategy(), seed in any::<u64>()) {
		let first = run(&corpus, 6, 3, seed);
		let second = run(&corpus, 6, 3, seed);
		prop_assert_eq!(first.snapshots(), second.snapshots());
		prop_assert_eq!(first.structures(), second.structures());
	}
}

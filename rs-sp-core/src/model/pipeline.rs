use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use tracing::{debug, info};

use crate::config::{SpConfig, TieBreak};
use crate::error::{SpError, SpResult};
use crate::io;
use super::event::Corpus;
use super::learner::LearnerEligibilityClassifier;
use super::report::{Diagnostics, ProductivityReport};
use super::structure::{StructureAggregator, TimeSlice};
use super::sufficiency::SufficiencyCalculator;
use super::time_frequency::TimeFrequencyTable;
use super::vocabulary_rank::VocabularyRanking;
use super::vocabulary_size::VocabularySizeResolver;

/// Default number of slice chunks per CPU.
const CHUNKS_PER_CPU: usize = 4;

/// High-level entry point running every stage in dependency order.
///
/// # Responsibilities
/// - Own the validated configuration and the optional corpus-size override
/// - Build the time table and the vocabulary ranking from the event log
/// - Aggregate structures, then rank/resolve/classify each time slice
///   on worker threads
/// - Reduce the classified slices to learner snapshots
///
/// Each stage reads only the output of earlier stages; no table is touched
/// again once its stage has finished.
#[derive(Debug, Clone)]
pub struct ProductivityPipeline {
	config: SpConfig,
	corpus_sizes: Option<BTreeMap<i64, u64>>,
}

impl ProductivityPipeline {
	/// # Errors
	/// `SpError::InvalidConfig` if the configuration is out of range.
	pub fn new(config: SpConfig) -> SpResult<Self> {
		config.validate()?;
		Ok(Self { config, corpus_sizes: None })
	}

	/// Loads the corpus (and corpus-size table, if any) named by `config.source`.
	///
	/// # Errors
	/// - `SpError::InvalidConfig` if the configuration has no `source`
	/// - I/O and schema errors from the input files
	pub fn from_source(config: SpConfig) -> SpResult<(Self, Corpus)> {
		let source = config
			.source
			.clone()
			.ok_or_else(|| SpError::InvalidConfig("no [source] section".to_owned()))?;

		let corpus = Corpus::from_file(&source.corpus)?;
		let mut pipeline = Self::new(config)?;
		if let Some(path) = &source.corpus_sizes {
			pipeline = pipeline.with_corpus_sizes(io::load_corpus_sizes(path)?);
		}
		Ok((pipeline, corpus))
	}

	/// Replaces computed per-time event counts with external corpus sizes.
	pub fn with_corpus_sizes(mut self, corpus_sizes: BTreeMap<i64, u64>) -> Self {
		self.corpus_sizes = Some(corpus_sizes);
		self
	}

	pub fn config(&self) -> &SpConfig {
		&self.config
	}

	/// Runs the whole computation on a corpus.
	///
	/// # Errors
	/// Only fatal errors; recoverable ones end up in the report diagnostics.
	pub fn run(&self, corpus: &Corpus) -> SpResult<ProductivityReport> {
		info!(
			corpus = corpus.name(),
			events = corpus.len(),
			window = self.config.window,
			ntrim = self.config.ntrim,
			"Productivity run started"
		);

		let table = match &self.corpus_sizes {
			Some(sizes) => TimeFrequencyTable::with_corpus_sizes(corpus, sizes),
			None => TimeFrequencyTable::from_corpus(corpus),
		};
		let mut diagnostics = Diagnostics::default();
		for &time in table.missing_times() {
			diagnostics.record(SpError::MissingCorpusSize { time })?;
		}

		let vocabulary = VocabularyRanking::estimate(corpus, self.config.ntrim, self.config.tie_break);
		debug!(
			types = vocabulary.types().len(),
			ntrim_inclass = vocabulary.ntrim_inclass(),
			"Vocabulary ranked"
		);

		let slices = StructureAggregator::new(&table, self.config.window).accumulate(corpus);
		debug!(slices = slices.len(), "Structures aggregated");

		let slices = self.process_slices(slices, vocabulary.ntrim_inclass())?;
		let snapshots = SufficiencyCalculator::evaluate(&slices, &mut diagnostics)?;
		let structures: Vec<_> = slices.into_iter().flat_map(|slice| slice.rows).collect();

		info!(
			structures = structures.len(),
			snapshots = snapshots.len(),
			missing_corpus_size = diagnostics.missing_corpus_size.len(),
			degenerate = diagnostics.degenerate.len(),
			"Productivity run finished"
		);

		let window_spans = table.window_spans(self.config.window);
		Ok(ProductivityReport::new(
			corpus.name(),
			self.config.clone(),
			table.points().to_vec(),
			vocabulary,
			structures,
			snapshots,
			window_spans,
			diagnostics,
		))
	}

	/// Ranks, resolves and classifies every slice on worker threads.
	///
	/// Slices are split into chunks (CPU count × factor), each chunk is
	/// processed on its own thread and sent back with its position, and the
	/// chunks are reassembled in time order. Slices share nothing, so the
	/// result does not depend on the number of chunks.
	fn process_slices(&self, slices: Vec<TimeSlice>, ntrim_inclass: u32) -> SpResult<Vec<TimeSlice>> {
		if slices.is_empty() {
			return Ok(slices);
		}

		let factor = if self.config.threads == 0 { CHUNKS_PER_CPU } else { self.config.threads };
		let chunks = num_cpus::get() * factor;
		let chunk_size = slices.len().div_ceil(chunks);
		let tie_break: TieBreak = self.config.tie_break;

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		let mut remaining = slices.into_iter().peekable();
		while remaining.peek().is_some() {
			let mut chunk: Vec<TimeSlice> = remaining.by_ref().take(chunk_size).collect();
			let tx = tx.clone();
			let position = spawned;

			thread::spawn(move || {
				let classifier = LearnerEligibilityClassifier::new(ntrim_inclass);
				for slice in &mut chunk {
					slice.rank(tie_break);
					VocabularySizeResolver::resolve(slice);
					classifier.classify(slice);
				}
				// The receiver only goes away if the run was abandoned
				let _ = tx.send((position, chunk));
			});
			spawned += 1;
		}
		drop(tx);

		let mut processed: Vec<(usize, Vec<TimeSlice>)> = rx.iter().collect();
		if processed.len() != spawned {
			return Err(SpError::Worker(format!(
				"{} of {} slice chunks were not returned",
				spawned - processed.len(),
				spawned
			)));
		}
		processed.sort_by_key(|(position, _)| *position);

		Ok(processed.into_iter().flat_map(|(_, chunk)| chunk).collect())
	}
}

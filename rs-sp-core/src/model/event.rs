use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SpResult;
use crate::io;

/// One corpus occurrence, already reduced to the four canonical fields.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
	/// Lexical item (e.g. a verb lemma).
	#[serde(rename = "type")]
	pub lemma: String,
	/// Ordinal period of the occurrence.
	pub time: i64,
	/// Whether the occurrence belongs to the class under study.
	pub in_class: bool,
	/// Whether the occurrence shows the rule-conforming structure.
	pub follows_rule: bool,
}

impl Event {
	pub fn new(lemma: &str, time: i64, in_class: bool, follows_rule: bool) -> Self {
		Self { lemma: lemma.to_owned(), time, in_class, follows_rule }
	}
}

/// The normalized, read-only event log.
///
/// Events are stably sorted by time on construction; the original order of
/// events sharing a time is preserved. Nothing mutates a `Corpus` afterwards.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
	name: String,
	events: Vec<Event>,
}

impl Corpus {
	/// Builds a corpus from events in any order.
	pub fn new(name: &str, mut events: Vec<Event>) -> Self {
		events.sort_by_key(|event| event.time);
		Self { name: name.to_owned(), events }
	}

	/// Loads a delimited corpus file; the corpus is named after the file stem.
	///
	/// # Errors
	/// I/O errors, or `SpError::Schema` if the file does not carry the
	/// canonical columns.
	pub fn from_file<P: AsRef<Path>>(path: P) -> SpResult<Self> {
		let name = io::get_filename(&path)?;
		let events = io::load_corpus(&path)?;
		Ok(Self::new(&name, events))
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn events(&self) -> &[Event] {
		&self.events
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}

	/// Distinct event times, ascending.
	pub fn times(&self) -> Vec<i64> {
		let mut times: Vec<i64> = self.events.iter().map(|event| event.time).collect();
		times.dedup();
		times
	}

	/// Distinct types with at least one in-class occurrence.
	pub fn inclass_types(&self) -> BTreeSet<&str> {
		self.events
			.iter()
			.filter(|event| event.in_class)
			.map(|event| event.lemma.as_str())
			.collect()
	}
}

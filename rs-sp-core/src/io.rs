use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fs, io};

use crate::error::{SpError, SpResult};
use crate::model::event::Event;

/// Canonical corpus columns, in no particular file order.
pub const CORPUS_COLUMNS: [&str; 4] = ["type", "time", "in_class", "follows_rule"];

const CORPUS: &str = "corpus";
const CORPUS_SIZES: &str = "corpus sizes";

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/corpus.tsv` + `"bin"` → `data/corpus.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/chaucer.tsv"` → `"chaucer"`
/// - `"chaucer.tsv"` → `"chaucer"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Splits a delimited line; tab wins over comma when both appear.
fn split_fields(line: &str) -> Vec<&str> {
	let delimiter = if line.contains('\t') { '\t' } else { ',' };
	line.split(delimiter).map(str::trim).collect()
}

fn schema_error(source_name: &'static str, line: usize, reason: String) -> SpError {
	SpError::Schema { source_name, line, reason }
}

/// Locates each requested column in a header line.
fn header_indices<const N: usize>(
	source_name: &'static str,
	lines: &[String],
	columns: [&str; N],
) -> SpResult<[usize; N]> {
	let header = lines
		.first()
		.ok_or_else(|| schema_error(source_name, 1, "missing header line".to_owned()))?;
	let fields: Vec<String> = split_fields(header).into_iter().map(str::to_lowercase).collect();

	let mut indices = [0; N];
	for (slot, column) in indices.iter_mut().zip(columns) {
		*slot = fields
			.iter()
			.position(|field| field == column)
			.ok_or_else(|| schema_error(source_name, 1, format!("missing column '{column}'")))?;
	}
	Ok(indices)
}

fn field<'l>(source_name: &'static str, fields: &[&'l str], index: usize, column: &str, line: usize) -> SpResult<&'l str> {
	fields
		.get(index)
		.copied()
		.filter(|value| !value.is_empty())
		.ok_or_else(|| schema_error(source_name, line, format!("empty '{column}' field")))
}

fn parse_flag(value: &str, column: &str, line: usize) -> SpResult<bool> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" => Ok(true),
		"0" | "false" => Ok(false),
		_ => Err(schema_error(CORPUS, line, format!("'{column}' must be 0/1, got '{value}'"))),
	}
}

fn parse_time(source_name: &'static str, value: &str, line: usize) -> SpResult<i64> {
	value
		.parse::<i64>()
		.map_err(|_| schema_error(source_name, line, format!("'time' must be an integer, got '{value}'")))
}

/// Parses corpus lines (header first) into events.
///
/// # Errors
/// `SpError::Schema` if a canonical column is missing or a value does not
/// parse. Blank lines are skipped.
pub fn parse_corpus(lines: &[String]) -> SpResult<Vec<Event>> {
	let [lemma_at, time_at, in_class_at, follows_rule_at] = header_indices(CORPUS, lines, CORPUS_COLUMNS)?;

	let mut events = Vec::with_capacity(lines.len().saturating_sub(1));
	for (offset, raw) in lines.iter().enumerate().skip(1) {
		if raw.trim().is_empty() {
			continue;
		}
		let line = offset + 1;
		let fields = split_fields(raw);

		let lemma = field(CORPUS, &fields, lemma_at, "type", line)?;
		let time = parse_time(CORPUS, field(CORPUS, &fields, time_at, "time", line)?, line)?;
		let in_class = parse_flag(field(CORPUS, &fields, in_class_at, "in_class", line)?, "in_class", line)?;
		let follows_rule = parse_flag(
			field(CORPUS, &fields, follows_rule_at, "follows_rule", line)?,
			"follows_rule",
			line,
		)?;

		events.push(Event::new(lemma, time, in_class, follows_rule));
	}
	Ok(events)
}

/// Loads a delimited corpus file.
///
/// # Errors
/// I/O or schema errors.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> SpResult<Vec<Event>> {
	parse_corpus(&read_file(path)?)
}

/// Parses a `time`/`size` table (header first).
///
/// # Errors
/// `SpError::Schema` on a missing column, a bad number or a repeated time.
pub fn parse_corpus_sizes(lines: &[String]) -> SpResult<BTreeMap<i64, u64>> {
	let [time_at, size_at] = header_indices(CORPUS_SIZES, lines, ["time", "size"])?;

	let mut sizes = BTreeMap::new();
	for (offset, raw) in lines.iter().enumerate().skip(1) {
		if raw.trim().is_empty() {
			continue;
		}
		let line = offset + 1;
		let fields = split_fields(raw);

		let time = parse_time(CORPUS_SIZES, field(CORPUS_SIZES, &fields, time_at, "time", line)?, line)?;
		let size_field = field(CORPUS_SIZES, &fields, size_at, "size", line)?;
		let size = size_field.parse::<u64>().map_err(|_| {
			schema_error(CORPUS_SIZES, line, format!("'size' must be a non-negative integer, got '{size_field}'"))
		})?;

		if sizes.insert(time, size).is_some() {
			return Err(schema_error(CORPUS_SIZES, line, format!("time {time} listed twice")));
		}
	}
	Ok(sizes)
}

/// Loads a corpus-size override file.
///
/// # Errors
/// I/O or schema errors.
pub fn load_corpus_sizes<P: AsRef<Path>>(path: P) -> SpResult<BTreeMap<i64, u64>> {
	parse_corpus_sizes(&read_file(path)?)
}

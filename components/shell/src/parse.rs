//! Structural parsing of input files
//!
//! Bytecode modules are decoded and dropped. Container files are loaded,
//! then every recorded tag is analyzed: embedded modules are decoded and
//! each tag is counted by name, optionally restricted to a symbol filter.

use bytecode_system::AbcFile;
use core_types::IndentingWriter;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Instant;
use swf::{FileLoader, LoadListener, SwfError, SwfFile, SwfTag};

use crate::cli::InputKind;
use crate::error::{ShellError, ShellResult};
use crate::timeline::{Counter, Timeline};

/// How to parse
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Print a JSON record per container instead of decoding modules
    pub for_database: bool,
    /// Tag names to analyze; empty means all
    pub filters: Vec<String>,
    /// Print the tag frequency table
    pub verbose: bool,
}

/// Per-container record printed with `--parseForDatabase`
#[derive(Debug, Serialize)]
pub struct DatabaseRecord<'a> {
    /// File size in bytes
    pub size: usize,
    /// Load and analysis time in milliseconds
    pub time: f64,
    /// File name without directory or extension
    pub name: &'a str,
    /// Tag counts and times
    pub tags: &'a Counter,
}

/// Whether `tag` is left out by `filters`.
///
/// Filter names that are not tag names never match.
pub fn ignore_tag(tag: SwfTag, filters: &[String]) -> bool {
    if filters.is_empty() {
        return false;
    }
    !filters
        .iter()
        .any(|name| SwfTag::from_name(name) == Some(tag))
}

#[derive(Default)]
struct Quiet;

impl LoadListener for Quiet {
    fn on_load_open(&mut self, _file: &SwfFile) {}
    fn on_load_error(&mut self, _error: &SwfError) {}
    fn on_load_complete(&mut self, _file: &SwfFile) {}
}

fn millis(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn read(path: &Path) -> ShellResult<Vec<u8>> {
    fs::read(path).map_err(|e| ShellError::io(path, e))
}

fn parse_abc(path: &Path, timeline: &mut Timeline) -> ShellResult<()> {
    let bytes = read(path)?;
    timeline
        .time("Parse ABC", || AbcFile::parse(&bytes, "ABC"))
        .map(drop)
        .map_err(|e| ShellError::parse(path, e))
}

fn parse_swf(
    path: &Path,
    options: &ParseOptions,
    timeline: &mut Timeline,
    writer: &IndentingWriter,
) -> ShellResult<()> {
    let buffer = read(path)?;
    let started = Instant::now();

    let mut loader = FileLoader::new(Quiet);
    timeline
        .time("Load", || loader.load_bytes(&buffer))
        .map_err(|e| ShellError::parse(path, e))?;
    let file = match loader.file() {
        Some(file) => file,
        None => return Ok(()),
    };

    let mut counter = Counter::new();
    let mut blocks = file.abc_blocks.iter();
    for record in &file.tags {
        let block = if record.tag.is_abc() { blocks.next() } else { None };
        if ignore_tag(record.tag, &options.filters) {
            continue;
        }
        let tag_started = Instant::now();
        if let (false, Some(block)) = (options.for_database, block) {
            timeline
                .time("Parse ABC", || AbcFile::parse(&block.data, "ABC"))
                .map_err(|e| ShellError::parse(path, e))?;
        }
        counter.count(&record.tag.name(), 1, millis(tag_started));
    }

    if options.for_database {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.strip_suffix(".swf").unwrap_or(n))
            .unwrap_or_default();
        let record = DatabaseRecord {
            size: buffer.len(),
            time: millis(started),
            name,
            tags: &counter,
        };
        match serde_json::to_string(&record) {
            Ok(json) => writer.write_ln(&json),
            Err(e) => writer.warn_ln(&format!("Cannot encode record for {}: {}", name, e)),
        }
    } else if options.verbose {
        writer.enter("Tag Frequency:");
        counter.trace_sorted(writer);
        writer.outdent();
    }
    Ok(())
}

/// Parse one input file, reporting failures on `writer`.
///
/// Returns whether the file parsed.
pub fn parse_file(
    path: &Path,
    options: &ParseOptions,
    timeline: &mut Timeline,
    writer: &IndentingWriter,
) -> bool {
    let result = match InputKind::of(path) {
        Some(InputKind::Swf) => parse_swf(path, options, timeline, writer),
        Some(InputKind::Abc) => parse_abc(path, timeline),
        _ => Ok(()),
    };
    match result {
        Ok(()) => true,
        Err(error) => {
            let reason = match &error {
                ShellError::Io { source, .. } => source.to_string(),
                ShellError::Parse { source, .. } => source.to_string(),
                other => other.to_string(),
            };
            writer.red_ln(&format!(
                "Cannot parse: {}, reason: {}",
                path.display(),
                reason
            ));
            false
        }
    }
}

//! Timing instruments: named timeline sections and counters
//!
//! A [`Timeline`] accumulates wall time per section name. A [`Counter`]
//! counts named events with the time spent on each, and serializes to the
//! `{ "counts": .., "times": .. }` shape used by database records.

use core_types::IndentingWriter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Totals for one section name
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionStats {
    /// Times the section was entered
    pub count: usize,
    /// Total time spent inside, in milliseconds
    pub total_ms: f64,
}

/// Named, possibly nested, timing sections
#[derive(Debug, Default)]
pub struct Timeline {
    open: Vec<(String, Instant)>,
    sections: BTreeMap<String, SectionStats>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing section `name`
    pub fn enter(&mut self, name: &str) {
        self.open.push((name.to_string(), Instant::now()));
    }

    /// Stop timing the innermost section, which must be `name`.
    ///
    /// A mismatched or unbalanced leave is ignored.
    pub fn leave(&mut self, name: &str) {
        if self.open.last().map(|(open, _)| open.as_str()) != Some(name) {
            return;
        }
        if let Some((name, started)) = self.open.pop() {
            let stats = self.sections.entry(name).or_default();
            stats.count += 1;
            stats.total_ms += millis(started.elapsed());
        }
    }

    /// Time `f` as section `name`
    pub fn time<R>(&mut self, name: &str, f: impl FnOnce() -> R) -> R {
        self.enter(name);
        let result = f();
        self.leave(name);
        result
    }

    /// Forget every section
    pub fn reset(&mut self) {
        self.open.clear();
        self.sections.clear();
    }

    /// Totals of the closed sections
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            sections: self.sections.clone(),
        }
    }
}

/// Section totals at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineSnapshot {
    sections: BTreeMap<String, SectionStats>,
}

impl TimelineSnapshot {
    /// Totals for `name`
    pub fn get(&self, name: &str) -> Option<SectionStats> {
        self.sections.get(name).copied()
    }

    /// Section names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    /// Write one line per section
    pub fn trace(&self, writer: &IndentingWriter) {
        writer.enter("Timeline:");
        for (name, stats) in &self.sections {
            let average = if stats.count > 0 {
                stats.total_ms / stats.count as f64
            } else {
                0.0
            };
            writer.write_ln(&format!(
                "{}: total {:.2} ms, count {}, average {:.2} ms",
                name, stats.total_ms, stats.count, average
            ));
        }
        writer.leave("");
    }
}

/// Event counts and times by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Counter {
    counts: BTreeMap<String, usize>,
    times: BTreeMap<String, f64>,
}

impl Counter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `increment` occurrences of `name` taking `time_ms`
    pub fn count(&mut self, name: &str, increment: usize, time_ms: f64) {
        *self.counts.entry(name.to_string()).or_default() += increment;
        *self.times.entry(name.to_string()).or_default() += time_ms;
    }

    /// Occurrences of `name`
    pub fn get(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Whether nothing was counted
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Names by descending count, ties by name
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> =
            self.counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Write one line per name, most frequent first
    pub fn trace_sorted(&self, writer: &IndentingWriter) {
        for (name, count) in self.sorted() {
            let time = self.times.get(name).copied().unwrap_or(0.0);
            writer.write_ln(&format!("{}: {} ({:.2} ms)", name, count, time));
        }
    }
}

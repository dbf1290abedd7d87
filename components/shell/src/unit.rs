//! Unit-test scripts
//!
//! A test script registers its tests through `pushUnitTest` while it
//! initializes. The [`TestSession`] is the script's [`Host`], so the queue
//! fills as a side effect of execution; [`TestSession::run_unit_tests`]
//! then drains it front to back, including tests registered while draining.

use bytecode_system::assemble;
use core_types::{IndentingWriter, Value};
use interpreter::{DomainScope, Host, SecurityDomain, UnitTestRegistration};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::{ShellError, ShellResult};

/// Totals of one drain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitTestReport {
    /// Invocations, the sum of the repeat counts
    pub tests: usize,
    /// Invocations that threw
    pub failures: usize,
    /// Wall time of the drain
    pub elapsed: Duration,
}

impl UnitTestReport {
    /// Elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Unit-test queue and failure state for one shell run
#[derive(Debug)]
pub struct TestSession {
    queue: VecDeque<UnitTestRegistration>,
    ever_failed: bool,
    writer: IndentingWriter,
}

impl TestSession {
    /// Create a session tracing to `writer`
    pub fn new(writer: IndentingWriter) -> Self {
        Self {
            queue: VecDeque::new(),
            ever_failed: false,
            writer,
        }
    }

    /// Whether any test failed during the run
    pub fn ever_failed(&self) -> bool {
        self.ever_failed
    }

    /// Record a failure outside a test body
    pub fn mark_failed(&mut self) {
        self.ever_failed = true;
    }

    /// Entries still queued
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue an entry
    pub fn push(&mut self, registration: UnitTestRegistration) {
        self.queue.push_back(registration);
    }

    /// Drain the queue, invoking each test in `domain`.
    ///
    /// `Repeat(n)` applies to the next test; zero skips it. A failing
    /// invocation is reported and the drain goes on.
    pub fn run_unit_tests(
        &mut self,
        file: &str,
        domain: &mut SecurityDomain,
        writer: &IndentingWriter,
        verbose: bool,
    ) -> UnitTestReport {
        let started = Instant::now();
        let mut tests = 0;
        let mut failures = 0;
        let mut repeat: Option<u32> = None;

        while let Some(entry) = self.queue.pop_front() {
            let (name, function) = match entry {
                UnitTestRegistration::Repeat(n) => {
                    repeat = Some(n);
                    continue;
                }
                UnitTestRegistration::Test { name, function } => (name, function),
            };
            let count = repeat.take().unwrap_or(1);
            if verbose && !name.is_empty() {
                writer.write_ln(&format!("Test: {}", name));
            }
            tests += count as usize;
            for _ in 0..count {
                if let Err(error) = domain.invoke(&function, &[], self) {
                    failures += 1;
                    self.ever_failed = true;
                    writer.red_ln(&format!(
                        "Exception encountered while running {}:({}) {}",
                        file, name, error
                    ));
                    writer.red_lns(&error.stack_lines());
                }
            }
        }

        let report = UnitTestReport {
            tests,
            failures,
            elapsed: started.elapsed(),
        };
        writer.write_ln(&format!(
            "Completed {} test{} in {:.2} ms.",
            report.tests,
            if report.tests > 1 { "s" } else { "" },
            report.elapsed_ms()
        ));
        report
    }

    /// Assemble and run the test script at `path`, then drain its tests.
    ///
    /// A script that throws while registering is reported and marks the
    /// session failed; the tests it registered before throwing still run.
    ///
    /// # Errors
    ///
    /// Fails if the script cannot be read or assembled.
    pub fn execute_file(
        &mut self,
        path: &Path,
        domain: &mut SecurityDomain,
        writer: &IndentingWriter,
        verbose: bool,
    ) -> ShellResult<UnitTestReport> {
        let file = path.display().to_string();
        writer.write_ln(&format!("Running test file: {} ...", file));
        let source = fs::read_to_string(path).map_err(|e| ShellError::io(path, e))?;
        let abc = assemble(&source, file.as_str()).map_err(|e| ShellError::parse(path, e))?;

        if let Err(error) = domain.execute_abc(DomainScope::Application, Rc::new(abc), self) {
            self.ever_failed = true;
            writer.red_ln(&format!(
                "Exception encountered while running {}: {}",
                file, error
            ));
            writer.red_lns(&error.stack_lines());
        }
        Ok(self.run_unit_tests(&file, domain, writer, verbose))
    }
}

impl Host for TestSession {
    fn trace(&mut self, message: &str) {
        self.writer.write_ln(message);
    }

    fn register_unit_test(&mut self, registration: UnitTestRegistration) {
        self.push(registration);
    }
}

/// A test entry for `function`, named for diagnostics
pub fn test_entry(name: &str, function: Value) -> UnitTestRegistration {
    UnitTestRegistration::Test {
        name: name.to_string(),
        function,
    }
}

//! Execution dispatcher
//!
//! Runs the selected pipelines over the input files in a fixed order: fuzz
//! mill, compile, parse, then execute or disassemble, then the failure
//! check. Read and parse failures are reported per file, except in the
//! compile pipeline where they abort the batch.

use async_runtime::MicroTasksQueue;
use bytecode_system::AbcFile;
use core_types::{IndentingWriter, LogLevel};
use interpreter::{create_security_domain, CatalogPaths, DomainOptions, DomainScope, WriterHost};
use player::Player;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use crate::cli::{Cli, InputKind};
use crate::error::{ShellError, ShellResult};
use crate::extract::extract_abcs_from_swf;
use crate::fuzz::Mill;
use crate::host::ShellPlayer;
use crate::parse::{parse_file, ParseOptions};
use crate::timeline::Timeline;
use crate::unit::TestSession;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every pipeline finished and no unit test failed
    Passed,
    /// At least one unit test failed
    TestsFailed,
}

impl Outcome {
    /// Process exit status
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Passed => 0,
            Outcome::TestsFailed => 1,
        }
    }
}

/// One shell run over a set of input files
pub struct Shell {
    cli: Cli,
    files: Vec<PathBuf>,
    writer: IndentingWriter,
    queue: MicroTasksQueue,
    session: TestSession,
    timeline: Timeline,
    load_catalog: bool,
    domains_created: usize,
}

impl Shell {
    /// Prepare a run and configure `writer` from the options.
    ///
    /// # Errors
    ///
    /// [`ShellError::Argument`] if a positional argument is not an input
    /// file.
    pub fn new(cli: Cli, writer: IndentingWriter) -> ShellResult<Self> {
        let files = cli.input_files()?;
        writer.set_log_level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        });
        writer.set_porcelain(cli.porcelain);

        // Container playback needs the player globals.
        let load_catalog = cli.player_global
            || files
                .iter()
                .any(|file| InputKind::of(file) == Some(InputKind::Swf));

        Ok(Self {
            session: TestSession::new(writer.clone()),
            cli,
            files,
            writer,
            queue: MicroTasksQueue::new(),
            timeline: Timeline::new(),
            load_catalog,
            domains_created: 0,
        })
    }

    /// Input files of the run
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether domains are created with the player-global catalog
    pub fn loads_catalog(&self) -> bool {
        self.load_catalog
    }

    /// Security domains created so far
    pub fn domains_created(&self) -> usize {
        self.domains_created
    }

    /// The unit-test session
    pub fn session(&self) -> &TestSession {
        &self.session
    }

    /// The micro-task queue container playback runs on
    pub fn queue(&self) -> &MicroTasksQueue {
        &self.queue
    }

    /// Run every selected pipeline.
    ///
    /// # Errors
    ///
    /// Compile failures, bootstrap failures, and errors thrown by executed
    /// modules outside unit tests end the run.
    pub fn run(&mut self) -> ShellResult<Outcome> {
        if self.cli.verbose {
            self.cli.trace(&self.writer);
        }

        if let Some(path) = self.cli.fuzz.clone() {
            Mill::new(self.writer.fork(), path).fuzz()?;
        }

        if self.cli.compile {
            self.compile()?;
        }

        if self.cli.parse {
            self.parse();
        }

        let files = self.files.clone();
        if self.cli.execute {
            for file in &files {
                for _ in 0..self.cli.repeat {
                    self.execute_file(file)?;
                }
            }
        } else if self.cli.disassemble {
            for file in files.iter().filter(|f| InputKind::of(f) == Some(InputKind::Abc)) {
                self.disassemble_file(file);
            }
        }

        if self.session.ever_failed() {
            self.writer.error_ln("Some unit tests failed");
            return Ok(Outcome::TestsFailed);
        }
        Ok(Outcome::Passed)
    }

    fn domain_options(&self) -> DomainOptions {
        DomainOptions::default()
            .with_writer(self.writer.clone())
            .with_release(self.cli.release)
            .with_tracing(self.cli.trace_runtime(), self.cli.trace_interpreter())
    }

    fn catalog(&self) -> Option<CatalogPaths> {
        self.load_catalog.then(|| self.cli.catalog_paths())
    }

    fn report(&self, error: &ShellError) {
        self.writer.error_ln(&error.to_string());
    }

    fn compile(&mut self) -> ShellResult<()> {
        let mut buffers: Vec<(String, Vec<u8>)> = Vec::new();
        for file in &self.files {
            let label = file.display().to_string();
            match InputKind::of(file) {
                Some(InputKind::Abc) => {
                    let bytes = fs::read(file).map_err(|e| ShellError::io(file, e))?;
                    buffers.push((label, bytes));
                }
                Some(InputKind::Swf) => {
                    let bytes = fs::read(file).map_err(|e| ShellError::io(file, e))?;
                    if let Some(blocks) = extract_abcs_from_swf(&bytes, &self.writer) {
                        buffers.extend(
                            blocks
                                .into_iter()
                                .enumerate()
                                .map(|(i, block)| (format!("{}#{}", label, i), block)),
                        );
                    }
                }
                _ => {}
            }
        }

        self.timeline.enter("Parse");
        let parsed = buffers.iter().try_for_each(|(label, bytes)| {
            AbcFile::parse(bytes, label.as_str())
                .map(drop)
                .map_err(|e| ShellError::parse(label, e))
        });
        self.timeline.leave("Parse");
        parsed?;

        if self.cli.verbose {
            self.writer
                .write_ln(&format!("Loading {} ABCs", buffers.len()));
        }
        self.timeline.snapshot().trace(&self.writer);
        Ok(())
    }

    fn parse(&self) {
        let options = ParseOptions {
            for_database: self.cli.parse_for_database,
            filters: self.cli.symbol_filters(),
            verbose: self.cli.verbose,
        };
        let mut timeline = Timeline::new();
        for file in &self.files {
            let started = Instant::now();
            self.writer
                .debug_ln(&format!("Parsing: {}", file.display()));
            timeline.reset();
            parse_file(file, &options, &mut timeline, &self.writer);
            if self.cli.verbose {
                self.writer.write_ln(&format!(
                    "Total Parse Time: {:.2} ms.",
                    started.elapsed().as_secs_f64() * 1000.0
                ));
            }
            if self.cli.profile {
                timeline.snapshot().trace(&self.writer);
            }
        }
    }

    fn execute_file(&mut self, file: &Path) -> ShellResult<()> {
        match InputKind::of(file) {
            Some(InputKind::Script) => self.execute_script(file),
            Some(InputKind::Abc) => self.execute_abc(file),
            Some(InputKind::Swf) => self.execute_swf(file),
            None => Ok(()),
        }
    }

    fn execute_script(&mut self, file: &Path) -> ShellResult<()> {
        let builtin = self.cli.builtin_path();
        let aux = self.cli.shell_path();
        let catalog = self.catalog();
        let options = self.domain_options();
        let mut domain = create_security_domain(
            &builtin,
            aux.as_deref(),
            catalog.as_ref(),
            options,
            &mut self.session,
        )?;
        self.domains_created += 1;

        let writer = self.writer.clone();
        if let Err(error) = self
            .session
            .execute_file(file, &mut domain, &writer, self.cli.verbose)
        {
            self.report(&error);
            self.session.mark_failed();
        }
        Ok(())
    }

    fn execute_abc(&mut self, file: &Path) -> ShellResult<()> {
        let abc = match fs::read(file)
            .map_err(|e| ShellError::io(file, e))
            .and_then(|bytes| {
                AbcFile::parse(&bytes, file.display().to_string())
                    .map_err(|e| ShellError::parse(file, e))
            }) {
            Ok(abc) => abc,
            Err(error) => {
                self.report(&error);
                return Ok(());
            }
        };

        let mut host = WriterHost::new(self.writer.clone());
        let mut domain = create_security_domain(
            &self.cli.builtin_path(),
            self.cli.shell_path().as_deref(),
            self.catalog().as_ref(),
            self.domain_options(),
            &mut host,
        )?;
        self.domains_created += 1;

        domain
            .execute_abc(DomainScope::Application, Rc::new(abc), &mut host)
            .map_err(|source| ShellError::Execution {
                path: file.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    fn execute_swf(&mut self, file: &Path) -> ShellResult<()> {
        let host = ShellPlayer::new(self.writer.clone(), self.queue.stop_handle());
        let player = Player::create(
            &self.cli.builtin_path(),
            self.cli.shell_path().as_deref(),
            self.catalog().as_ref(),
            self.domain_options(),
            Box::new(host),
        )?;
        self.domains_created += 1;

        if let Err(error) = player.load_file(&mut self.queue, file) {
            self.report(&ShellError::from(error));
            return Ok(());
        }
        self.writer
            .info_ln(&format!("-Running: {}", file.display()));
        let summary = self
            .queue
            .run(self.cli.duration, self.cli.count, true)
            .map_err(|source| ShellError::Execution {
                path: file.to_path_buf(),
                source,
            })?;
        self.writer.debug_ln(&format!(
            "Ran {} micro task(s), {} frame(s) processed",
            summary.executed,
            player.frames_processed()
        ));
        Ok(())
    }

    fn disassemble_file(&self, file: &Path) {
        let parsed = fs::read(file)
            .map_err(|e| ShellError::io(file, e))
            .and_then(|bytes| {
                AbcFile::parse(&bytes, file.display().to_string())
                    .map_err(|e| ShellError::parse(file, e))
            });
        match parsed {
            Ok(abc) => abc.trace(&self.writer),
            Err(error) => self.report(&error),
        }
    }
}

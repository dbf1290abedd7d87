//! Event-driven container loader.
//!
//! A [`FileLoader`] feeds bytes to the push parser and reports what it finds
//! to one [`LoadListener`]. Per load the listener sees `on_load_open` once,
//! then progress and eagerly parsed symbols in discovery order, and finally
//! exactly one of `on_load_complete` or `on_load_error`. A header failure
//! produces the error without an open.

use crate::error::SwfError;
use crate::file::{SwfFile, Symbol, SymbolKind};
use crate::parser::SwfParser;
use std::collections::VecDeque;

/// Reply to a batch of eagerly parsed symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolsAck {
    /// Keep loading
    Done,
    /// Hold further events until [`FileLoader::resume`]
    Pending,
}

/// Byte and frame counts carried by a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    /// Uncompressed bytes parsed
    pub bytes_loaded: usize,
    /// Declared uncompressed length
    pub bytes_total: usize,
    /// Frames completed so far
    pub frames_loaded: usize,
}

/// Receiver of loader events
pub trait LoadListener {
    /// Header and the tags available so far have been parsed
    fn on_load_open(&mut self, file: &SwfFile);

    /// More tags were parsed
    fn on_load_progress(&mut self, _file: &SwfFile, _progress: LoadProgress) {}

    /// The load failed; no more events follow
    fn on_load_error(&mut self, error: &SwfError);

    /// The End tag was reached; no more events follow
    fn on_load_complete(&mut self, file: &SwfFile);

    /// Images and fonts parsed since the last batch; `delta` is the number of
    /// bytes the batch covers
    fn on_new_eagerly_parsed_symbols(&mut self, _symbols: &[Symbol], _delta: usize) -> SymbolsAck {
        SymbolsAck::Done
    }

    /// An announced image is ready
    fn on_image_bytes_loaded(&mut self, _symbol: &Symbol) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Header,
    Open,
    Complete,
    Failed,
}

struct Batch {
    symbols: Vec<Symbol>,
    delta: usize,
}

/// Drives one load and owns its listener.
///
/// # Examples
///
/// ```
/// use swf::{FileLoader, LoadListener, SwfBuilder, SwfError, SwfFile};
///
/// #[derive(Default)]
/// struct Blocks(Vec<Vec<u8>>);
///
/// impl LoadListener for Blocks {
///     fn on_load_open(&mut self, file: &SwfFile) {
///         self.0.extend(file.abc_blocks.iter().map(|b| b.data.clone()));
///     }
///     fn on_load_error(&mut self, _error: &SwfError) {}
///     fn on_load_complete(&mut self, _file: &SwfFile) {}
/// }
///
/// let bytes = SwfBuilder::new().do_abc("main", vec![1, 2, 3]).show_frame().build();
/// let mut loader = FileLoader::new(Blocks::default());
/// loader.load_bytes(&bytes).unwrap();
/// assert_eq!(loader.into_listener().0, vec![vec![1, 2, 3]]);
/// ```
pub struct FileLoader<L: LoadListener> {
    listener: L,
    parser: SwfParser,
    state: LoadState,
    batches: VecDeque<Batch>,
    progress_due: bool,
    awaiting_ack: bool,
    input_finished: bool,
}

impl<L: LoadListener> FileLoader<L> {
    /// Creates a loader reporting to `listener`.
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            parser: SwfParser::new(),
            state: LoadState::Header,
            batches: VecDeque::new(),
            progress_due: false,
            awaiting_ack: false,
            input_finished: false,
        }
    }

    /// The listener
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// The listener, mutably
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Give the listener back
    pub fn into_listener(self) -> L {
        self.listener
    }

    /// The file as far as it has been parsed
    pub fn file(&self) -> Option<&SwfFile> {
        self.parser.file()
    }

    /// Whether the load ended, successfully or not
    pub fn is_finished(&self) -> bool {
        matches!(self.state, LoadState::Complete | LoadState::Failed)
    }

    /// Whether a symbol batch is waiting for [`FileLoader::resume`]
    pub fn is_waiting(&self) -> bool {
        self.awaiting_ack
    }

    /// Load a whole file at once
    ///
    /// # Errors
    ///
    /// Returns the error also reported through `on_load_error`.
    pub fn load_bytes(&mut self, data: &[u8]) -> Result<(), SwfError> {
        self.append_load_data(data)?;
        self.finish()
    }

    /// Push the next piece of a streamed file.
    ///
    /// Bytes arriving after the End tag, such as the zlib trailer, are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns the error also reported through `on_load_error`, or
    /// [`SwfError::Closed`] after a failure or [`FileLoader::finish`].
    pub fn append_load_data(&mut self, data: &[u8]) -> Result<(), SwfError> {
        if self.state == LoadState::Complete && !self.input_finished {
            return Ok(());
        }
        if self.is_finished() || self.input_finished {
            return Err(SwfError::Closed);
        }
        if let Err(error) = self.parser.push(data) {
            return self.fail(error);
        }
        self.process()
    }

    /// Declare the end of input
    ///
    /// # Errors
    ///
    /// Fails if the data ended before the End tag.
    pub fn finish(&mut self) -> Result<(), SwfError> {
        let already_failed = self.state == LoadState::Failed;
        self.input_finished = true;
        if already_failed {
            return Err(SwfError::Closed);
        }
        self.process()
    }

    /// Acknowledge a pending symbol batch and continue
    ///
    /// # Errors
    ///
    /// Any failure the resumed parse runs into.
    pub fn resume(&mut self) -> Result<(), SwfError> {
        if !self.awaiting_ack {
            return Ok(());
        }
        self.awaiting_ack = false;
        self.process()
    }

    fn fail(&mut self, error: SwfError) -> Result<(), SwfError> {
        self.state = LoadState::Failed;
        self.batches.clear();
        self.listener.on_load_error(&error);
        Err(error)
    }

    fn incomplete(&self) -> SwfError {
        SwfError::Incomplete {
            loaded: self.parser.bytes_received(),
            expected: self.parser.file_length(),
        }
    }

    fn process(&mut self) -> Result<(), SwfError> {
        loop {
            if self.awaiting_ack || self.is_finished() {
                return Ok(());
            }
            if let Some(batch) = self.batches.pop_front() {
                let ack = self
                    .listener
                    .on_new_eagerly_parsed_symbols(&batch.symbols, batch.delta);
                for symbol in batch.symbols.iter().filter(|s| s.kind == SymbolKind::Image) {
                    self.listener.on_image_bytes_loaded(symbol);
                }
                if ack == SymbolsAck::Pending {
                    self.awaiting_ack = true;
                    return Ok(());
                }
                continue;
            }

            match self.state {
                LoadState::Header => match self.parser.parse_header() {
                    Ok(true) => {
                        if let Err(error) = self.scan() {
                            return self.fail(error);
                        }
                        self.state = LoadState::Open;
                        if let Some(file) = self.parser.file() {
                            self.listener.on_load_open(file);
                        }
                    }
                    Ok(false) if self.input_finished => {
                        let error = self.incomplete();
                        return self.fail(error);
                    }
                    Ok(false) => return Ok(()),
                    Err(error) => return self.fail(error),
                },
                LoadState::Open => {
                    if self.progress_due {
                        self.progress_due = false;
                        if let Some(file) = self.parser.file() {
                            let progress = LoadProgress {
                                bytes_loaded: file.bytes_loaded,
                                bytes_total: file.header.file_length,
                                frames_loaded: file.frames.len(),
                            };
                            self.listener.on_load_progress(file, progress);
                        }
                        continue;
                    }
                    match self.scan() {
                        Ok(true) => continue,
                        Ok(false) => {}
                        Err(error) => return self.fail(error),
                    }
                    let complete = self.parser.file().map(SwfFile::is_complete);
                    match complete {
                        Some(true) => {
                            self.state = LoadState::Complete;
                            if let Some(file) = self.parser.file() {
                                self.listener.on_load_complete(file);
                            }
                            return Ok(());
                        }
                        _ if self.input_finished => {
                            let error = self.incomplete();
                            return self.fail(error);
                        }
                        _ => return Ok(()),
                    }
                }
                LoadState::Complete | LoadState::Failed => return Ok(()),
            }
        }
    }

    /// Parse buffered tags; true when any were applied
    fn scan(&mut self) -> Result<bool, SwfError> {
        let scan = self.parser.scan()?;
        if scan.tags == 0 {
            return Ok(false);
        }
        if !scan.eager.is_empty() {
            self.batches.push_back(Batch {
                symbols: scan.eager,
                delta: scan.bytes,
            });
        }
        self.progress_due = true;
        Ok(true)
    }
}

//! Playback state shared by the load and frame tasks

use bytecode_system::AbcFile;
use core_types::{IndentingWriter, Value};
use interpreter::{DomainScope, SecurityDomain};
use std::cell::RefCell;
use std::rc::Rc;
use swf::{AbcBlock, LoadListener, LoadProgress, SwfError, SwfFile, Symbol, SymbolsAck};

use crate::host::{HostBridge, PlayerHost};

/// Frame rate used when a file declares zero
pub const DEFAULT_FRAME_RATE: f64 = 24.0;

/// Name of the per-frame callback looked up in the application scope
pub const ENTER_FRAME: &str = "onEnterFrame";

/// Where the container load stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing loaded yet
    Idle,
    /// Chunks are still arriving
    Loading,
    /// The End tag was reached
    Complete,
    /// The load failed
    Failed,
}

#[derive(Debug)]
pub(crate) struct StageFrame {
    label: Option<String>,
    blocks: Vec<AbcBlock>,
    scripts_run: bool,
}

/// Result of one frame tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    Played,
    Waiting,
    Finished,
}

pub(crate) struct Stage {
    pub(crate) domain: SecurityDomain,
    pub(crate) host: Box<dyn PlayerHost>,
    pub(crate) writer: IndentingWriter,
    pub(crate) url: String,
    pub(crate) status: LoadStatus,
    pub(crate) frame_rate: f64,
    pub(crate) opened: bool,
    pub(crate) frame_task_scheduled: bool,
    pub(crate) frames_processed: usize,
    frames: Vec<StageFrame>,
    next_frame: usize,
}

impl Stage {
    pub(crate) fn new(domain: SecurityDomain, host: Box<dyn PlayerHost>) -> Self {
        let writer = domain.writer().clone();
        Self {
            domain,
            host,
            writer,
            url: String::new(),
            status: LoadStatus::Idle,
            frame_rate: DEFAULT_FRAME_RATE,
            opened: false,
            frame_task_scheduled: false,
            frames_processed: 0,
            frames: Vec::new(),
            next_frame: 0,
        }
    }

    pub(crate) fn frames_loaded(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn frame_label(&self, index: usize) -> Option<&str> {
        self.frames.get(index).and_then(|f| f.label.as_deref())
    }

    /// Virtual milliseconds between frames
    pub(crate) fn frame_interval(&self) -> f64 {
        let rate = if self.frame_rate > 0.0 {
            self.frame_rate
        } else {
            DEFAULT_FRAME_RATE
        };
        1000.0 / rate
    }

    fn sync_frames(&mut self, file: &SwfFile) {
        for frame in file.frames.iter().skip(self.frames.len()) {
            let blocks = frame
                .abc_blocks
                .iter()
                .filter_map(|i| file.abc_blocks.get(*i).cloned())
                .collect();
            self.frames.push(StageFrame {
                label: frame.label.clone(),
                blocks,
                scripts_run: false,
            });
        }
    }

    fn enter_frame_handler(&self) -> Option<Value> {
        match self.domain.get_global(DomainScope::Application, ENTER_FRAME) {
            Some(f @ (Value::Function(_) | Value::NativeFunction(_))) => Some(f.clone()),
            _ => None,
        }
    }

    /// Advance the timeline by one frame.
    ///
    /// The timeline loops while an enter-frame handler is defined; otherwise
    /// playback finishes after the last frame of a fully loaded file.
    pub(crate) fn tick(&mut self) -> Tick {
        if self.next_frame >= self.frames.len() {
            if self.status == LoadStatus::Loading {
                return Tick::Waiting;
            }
            if self.frames.is_empty() || self.enter_frame_handler().is_none() {
                return Tick::Finished;
            }
            self.next_frame = 0;
        }
        let index = self.next_frame;
        self.next_frame += 1;
        let number = index + 1;

        if !self.frames[index].scripts_run {
            self.frames[index].scripts_run = true;
            let blocks = std::mem::take(&mut self.frames[index].blocks);
            for (i, block) in blocks.iter().enumerate() {
                self.run_block(number, i, block);
            }
        }

        if let Some(handler) = self.enter_frame_handler() {
            let mut bridge = HostBridge::new(self.host.as_mut());
            let arg = Value::Int(i32::try_from(number).unwrap_or(i32::MAX));
            if let Err(e) = self.domain.invoke(&handler, &[arg], &mut bridge) {
                self.writer
                    .red_ln(&format!("Error in {} at frame {}: {}", ENTER_FRAME, number, e));
                self.writer.red_lns(&e.stack_lines());
            }
        }

        self.frames_processed += 1;
        self.host.on_frame_processed(number);
        Tick::Played
    }

    fn run_block(&mut self, frame: usize, index: usize, block: &AbcBlock) {
        let label = if block.name.is_empty() {
            format!("{}#frame{}.abc{}", self.url, frame, index)
        } else {
            format!("{}#{}", self.url, block.name)
        };
        let abc = match AbcFile::parse(&block.data, label.clone()) {
            Ok(abc) => Rc::new(abc),
            Err(e) => {
                self.writer
                    .red_ln(&format!("Cannot parse ABC block {}: {}", label, e));
                return;
            }
        };
        self.writer.debug_ln(&format!("Executing {}", label));
        let mut bridge = HostBridge::new(self.host.as_mut());
        if let Err(e) = self
            .domain
            .execute_abc(DomainScope::Application, abc, &mut bridge)
        {
            self.writer
                .red_ln(&format!("Error while executing {}: {}", label, e));
            self.writer.red_lns(&e.stack_lines());
        }
    }
}

/// Load listener recording frames into the shared stage
pub(crate) struct StageListener {
    stage: Rc<RefCell<Stage>>,
}

impl StageListener {
    pub(crate) fn new(stage: Rc<RefCell<Stage>>) -> Self {
        Self { stage }
    }
}

impl LoadListener for StageListener {
    fn on_load_open(&mut self, file: &SwfFile) {
        let mut stage = self.stage.borrow_mut();
        stage.opened = true;
        stage.frame_rate = file.header.frame_rate;
        stage.writer.debug_ln(&format!(
            "Opened {}: version {}, {} frame(s) at {} fps",
            stage.url, file.header.version, file.header.frame_count, file.header.frame_rate
        ));
        stage.sync_frames(file);
    }

    fn on_load_progress(&mut self, file: &SwfFile, _progress: LoadProgress) {
        self.stage.borrow_mut().sync_frames(file);
    }

    fn on_load_error(&mut self, error: &SwfError) {
        let mut stage = self.stage.borrow_mut();
        stage.status = LoadStatus::Failed;
        stage
            .writer
            .red_ln(&format!("Cannot load {}: {}", stage.url, error));
    }

    fn on_load_complete(&mut self, file: &SwfFile) {
        let mut stage = self.stage.borrow_mut();
        stage.sync_frames(file);
        stage.status = LoadStatus::Complete;
        stage.writer.debug_ln(&format!(
            "Loaded {}: {} frame(s), {} ABC block(s)",
            stage.url,
            file.frames.len(),
            file.abc_blocks.len()
        ));
    }

    fn on_new_eagerly_parsed_symbols(&mut self, symbols: &[Symbol], _delta: usize) -> SymbolsAck {
        self.stage
            .borrow()
            .writer
            .debug_ln(&format!("{} eagerly parsed symbol(s)", symbols.len()));
        SymbolsAck::Done
    }
}

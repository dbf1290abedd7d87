//! The hosted player.
//!
//! Loading and playback are micro-tasks on the embedder's queue: one
//! repeating task feeds the container to the loader in fixed-size chunks,
//! and once the file opens a second task advances the timeline every
//! `1000 / frame_rate` milliseconds of virtual time.

use async_runtime::{MicroTask, MicroTasksQueue, TaskId};
use interpreter::{create_security_domain, CatalogPaths, DomainOptions, SecurityDomain};
use std::cell::RefCell;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::rc::Rc;
use swf::FileLoader;

use crate::error::PlayerError;
use crate::host::{HostBridge, PlayerHost};
use crate::stage::{LoadStatus, Stage, StageListener, Tick};

/// Bytes handed to the loader per load task run
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Virtual milliseconds between chunk reads
pub const LOAD_INTERVAL_MS: f64 = 1.0;

/// A container player bound to its own security domain
pub struct Player {
    stage: Rc<RefCell<Stage>>,
    chunk_size: usize,
}

impl Player {
    /// Wrap an initialized domain
    pub fn new(domain: SecurityDomain, host: Box<dyn PlayerHost>) -> Self {
        Self {
            stage: Rc::new(RefCell::new(Stage::new(domain, host))),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Bootstrap a domain from the builtin module and wrap it
    ///
    /// # Errors
    ///
    /// Any bootstrap failure.
    pub fn create(
        builtin: &Path,
        aux: Option<&Path>,
        catalog: Option<&CatalogPaths>,
        options: DomainOptions,
        mut host: Box<dyn PlayerHost>,
    ) -> Result<Self, PlayerError> {
        let domain = {
            let mut bridge = HostBridge::new(host.as_mut());
            create_security_domain(builtin, aux, catalog, options, &mut bridge)?
        };
        Ok(Self::new(domain, host))
    }

    /// Set the load chunk size; zero is treated as one byte
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Schedule loading of the container at `path`
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened; read errors later in the load are
    /// logged.
    pub fn load_file(
        &self,
        queue: &mut MicroTasksQueue,
        path: &Path,
    ) -> Result<TaskId, PlayerError> {
        let file = File::open(path).map_err(|source| PlayerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.load(queue, Box::new(file), path.display().to_string()))
    }

    /// Schedule loading of an in-memory container
    pub fn load_bytes(&self, queue: &mut MicroTasksQueue, bytes: Vec<u8>, url: &str) -> TaskId {
        self.load(queue, Box::new(Cursor::new(bytes)), url.to_string())
    }

    fn load(&self, queue: &mut MicroTasksQueue, mut source: Box<dyn Read>, url: String) -> TaskId {
        {
            let mut stage = self.stage.borrow_mut();
            stage.url = url;
            stage.status = LoadStatus::Loading;
        }
        let stage = Rc::clone(&self.stage);
        let mut loader = FileLoader::new(StageListener::new(Rc::clone(&stage)));
        let mut buffer = vec![0u8; self.chunk_size];

        queue.schedule(MicroTask::repeating(LOAD_INTERVAL_MS, move |ctx| {
            // Errors reach the listener, which logs them.
            match source.read(&mut buffer) {
                Ok(0) => {
                    let _ = loader.finish();
                }
                Ok(n) => {
                    let _ = loader.append_load_data(&buffer[..n]);
                }
                Err(e) => {
                    let mut stage = stage.borrow_mut();
                    stage.status = LoadStatus::Failed;
                    stage
                        .writer
                        .red_ln(&format!("Cannot read {}: {}", stage.url, e));
                }
            }
            if loader.is_waiting() {
                let _ = loader.resume();
            }

            let (done, frame_interval) = {
                let mut stage = stage.borrow_mut();
                let done = loader.is_finished() || stage.status == LoadStatus::Failed;
                let interval = if stage.opened && !stage.frame_task_scheduled {
                    stage.frame_task_scheduled = true;
                    Some(stage.frame_interval())
                } else {
                    None
                };
                (done, interval)
            };
            if let Some(interval) = frame_interval {
                ctx.schedule(frame_task(Rc::clone(&stage), interval));
            }
            if done {
                ctx.cancel_current();
            }
            Ok(())
        }))
    }

    /// Status of the current load
    pub fn load_status(&self) -> LoadStatus {
        self.stage.borrow().status
    }

    /// Frames received so far
    pub fn frames_loaded(&self) -> usize {
        self.stage.borrow().frames_loaded()
    }

    /// Frame ticks played so far
    pub fn frames_processed(&self) -> usize {
        self.stage.borrow().frames_processed
    }

    /// Label of frame `index` (0-based), if it has one
    pub fn frame_label(&self, index: usize) -> Option<String> {
        self.stage.borrow().frame_label(index).map(str::to_string)
    }

    /// Inspect the player's security domain
    pub fn with_domain<R>(&self, f: impl FnOnce(&SecurityDomain) -> R) -> R {
        f(&self.stage.borrow().domain)
    }
}

fn frame_task(stage: Rc<RefCell<Stage>>, interval: f64) -> MicroTask {
    MicroTask::repeating(interval, move |ctx| {
        let tick = stage.borrow_mut().tick();
        if tick == Tick::Finished {
            ctx.cancel_current();
        }
        Ok(())
    })
}

//! Hosted playback of container files
//!
//! A [`Player`] owns a security domain and plays one container on a
//! [`async_runtime::MicroTasksQueue`]. Each frame's bytecode blocks run once
//! in the application scope, then the hosted `onEnterFrame(frame)` is called
//! if the content defined one.
//!
//! # Example
//!
//! ```
//! use async_runtime::MicroTasksQueue;
//! use core_types::IndentingWriter;
//! use interpreter::{DomainOptions, SecurityDomain};
//! use player::{LoadStatus, Player, PlayerHost};
//! use swf::SwfBuilder;
//!
//! struct Quiet;
//!
//! impl PlayerHost for Quiet {
//!     fn trace(&mut self, _message: &str) {}
//!     fn on_fs_command(&mut self, _command: &str, _args: &str) {}
//! }
//!
//! let (writer, _) = IndentingWriter::captured();
//! let mut domain = SecurityDomain::new(DomainOptions::default().with_writer(writer));
//! domain.initialize();
//!
//! let player = Player::new(domain, Box::new(Quiet));
//! let mut queue = MicroTasksQueue::new();
//! let bytes = SwfBuilder::new().show_frame().show_frame().build();
//! player.load_bytes(&mut queue, bytes, "movie.swf");
//! queue.run(0, 0, true).unwrap();
//!
//! assert_eq!(player.load_status(), LoadStatus::Complete);
//! assert_eq!(player.frames_processed(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod host;
pub mod player;
pub mod stage;

// Re-export main types at crate root
pub use error::PlayerError;
pub use host::PlayerHost;
pub use player::{Player, DEFAULT_CHUNK_SIZE, LOAD_INTERVAL_MS};
pub use stage::{LoadStatus, DEFAULT_FRAME_RATE, ENTER_FRAME};

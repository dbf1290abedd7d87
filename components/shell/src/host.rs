//! The shell's player host

use async_runtime::StopHandle;
use core_types::IndentingWriter;
use player::PlayerHost;

/// Writes traces and stops the micro-task queue on `fscommand("quit")`
#[derive(Debug, Clone)]
pub struct ShellPlayer {
    writer: IndentingWriter,
    stop: StopHandle,
}

impl ShellPlayer {
    /// Create a host tracing to `writer` and raising `stop` on quit
    pub fn new(writer: IndentingWriter, stop: StopHandle) -> Self {
        Self { writer, stop }
    }
}

impl PlayerHost for ShellPlayer {
    fn trace(&mut self, message: &str) {
        self.writer.write_ln(message);
    }

    fn on_fs_command(&mut self, command: &str, _args: &str) {
        if command == "quit" {
            self.stop.stop();
        }
    }
}

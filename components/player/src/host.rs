//! Callbacks from the player to its embedder

use interpreter::Host;

/// Services the embedding program provides to a [`crate::Player`].
pub trait PlayerHost {
    /// Output of the `trace` native
    fn trace(&mut self, message: &str);

    /// `fscommand(command, args)` from hosted content
    fn on_fs_command(&mut self, command: &str, args: &str);

    /// A frame finished; `frame` is the 1-based frame number
    fn on_frame_processed(&mut self, _frame: usize) {}
}

/// Adapts a [`PlayerHost`] to the interpreter's [`Host`]
pub(crate) struct HostBridge<'a> {
    host: &'a mut dyn PlayerHost,
}

impl<'a> HostBridge<'a> {
    pub(crate) fn new(host: &'a mut dyn PlayerHost) -> Self {
        Self { host }
    }
}

impl Host for HostBridge<'_> {
    fn trace(&mut self, message: &str) {
        self.host.trace(message);
    }

    fn fs_command(&mut self, command: &str, args: &str) {
        self.host.on_fs_command(command, args);
    }
}

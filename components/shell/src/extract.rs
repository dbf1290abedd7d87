//! Pulling bytecode modules out of container files

use core_types::IndentingWriter;
use swf::{FileLoader, LoadListener, SwfError, SwfFile};

/// Collects every block present when the file opens
#[derive(Debug, Default)]
struct AbcCollector {
    blocks: Vec<Vec<u8>>,
}

impl LoadListener for AbcCollector {
    fn on_load_open(&mut self, file: &SwfFile) {
        self.blocks
            .extend(file.abc_blocks.iter().map(|block| block.data.clone()));
    }

    fn on_load_error(&mut self, _error: &SwfError) {}

    fn on_load_complete(&mut self, _file: &SwfFile) {}
}

/// Bytes of every bytecode block embedded in `buffer`, in file order.
///
/// Returns `None` if the container does not load; a container without
/// blocks yields an empty list.
pub fn extract_abcs_from_swf(buffer: &[u8], writer: &IndentingWriter) -> Option<Vec<Vec<u8>>> {
    let mut loader = FileLoader::new(AbcCollector::default());
    match loader.load_bytes(buffer) {
        Ok(()) => Some(loader.into_listener().blocks),
        Err(error) => {
            writer.red_ln(&format!("Cannot parse SWF, reason: {}", error));
            None
        }
    }
}

//! Random container generation
//!
//! The [`Mill`] builds a random but well-formed container, writes it to
//! disk, loads it back and prints an XML description of the tags it holds.

use bytecode_system::assemble;
use core_types::IndentingWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::PathBuf;
use swf::{FileLoader, LoadListener, SwfBuilder, SwfError, SwfFile, SwfTag};

use crate::error::{ShellError, ShellResult};

const FRAME_RATES: [f64; 4] = [12.0, 24.0, 30.0, 60.0];
const MAX_FRAMES: usize = 4;
const MAX_TAGS_PER_FRAME: usize = 3;

/// A generated tag as read back from the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilledTag {
    /// Tag
    pub tag: SwfTag,
    /// Body length
    pub length: usize,
}

/// What the mill produced
#[derive(Debug, Clone, PartialEq)]
pub struct MilledSwf {
    /// Format version
    pub version: u8,
    /// Whether the body is compressed
    pub compressed: bool,
    /// Frames per second
    pub frame_rate: f64,
    /// Declared frame count
    pub frame_count: u16,
    /// File size in bytes
    pub size: usize,
    /// Tags in file order
    pub tags: Vec<MilledTag>,
}

#[derive(Default)]
struct ReadBack {
    file: Option<SwfFile>,
}

impl LoadListener for ReadBack {
    fn on_load_open(&mut self, _file: &SwfFile) {}

    fn on_load_error(&mut self, _error: &SwfError) {}

    fn on_load_complete(&mut self, file: &SwfFile) {
        self.file = Some(file.clone());
    }
}

/// Random container generator
pub struct Mill {
    writer: IndentingWriter,
    path: PathBuf,
    rng: StdRng,
}

impl Mill {
    /// A mill seeded from the operating system
    pub fn new(writer: IndentingWriter, path: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            path: path.into(),
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible mill
    pub fn with_seed(writer: IndentingWriter, path: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            writer,
            path: path.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn bytes(&mut self, max: usize) -> Vec<u8> {
        let len = self.rng.gen_range(0..=max);
        (0..len).map(|_| self.rng.gen()).collect()
    }

    fn script(&self, message: &str) -> Vec<u8> {
        let source = format!(
            ".method main\n  getglobal trace\n  pushstring \"{}\"\n  call 1\n  pop\n  returnvoid\n.end\n.init main",
            message
        );
        // The source is fixed apart from a plain identifier.
        assemble(&source, message)
            .map(|abc| abc.to_bytes())
            .unwrap_or_default()
    }

    fn build(&mut self) -> Vec<u8> {
        let version = self.rng.gen_range(9..=15);
        let compressed = self.rng.gen_bool(0.5);
        let frame_rate = FRAME_RATES[self.rng.gen_range(0..FRAME_RATES.len())];
        let frames = self.rng.gen_range(1..=MAX_FRAMES);

        let mut builder = SwfBuilder::new()
            .version(version)
            .compressed(compressed)
            .frame_rate(frame_rate)
            .as3()
            .background_color(self.rng.gen_range(0..0x0100_0000));

        let mut next_id: u16 = 1;
        for frame in 0..frames {
            if self.rng.gen_bool(0.3) {
                builder = builder.frame_label(&format!("frame{}", frame + 1));
            }
            for _ in 0..self.rng.gen_range(0..=MAX_TAGS_PER_FRAME) {
                let id = next_id;
                next_id += 1;
                builder = match self.rng.gen_range(0..4) {
                    0 => {
                        let payload = self.bytes(64);
                        builder.define_image(id, &payload)
                    }
                    1 => builder.define_font(id, &format!("Font{}", id)),
                    2 => {
                        let data = self.bytes(32);
                        builder.define_binary_data(id, &data)
                    }
                    _ => {
                        let name = format!("script{}", id);
                        let data = self.script(&name);
                        builder.do_abc(&name, data)
                    }
                };
            }
            builder = builder.show_frame();
        }
        builder.build()
    }

    /// Generate one container, write it, and print its description.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written or does not load back.
    pub fn fuzz(&mut self) -> ShellResult<MilledSwf> {
        let bytes = self.build();
        fs::write(&self.path, &bytes).map_err(|e| ShellError::io(&self.path, e))?;

        let mut loader = FileLoader::new(ReadBack::default());
        loader
            .load_bytes(&bytes)
            .map_err(|e| ShellError::parse(&self.path, e))?;
        let file = match loader.into_listener().file {
            Some(file) => file,
            None => {
                return Err(ShellError::parse(
                    &self.path,
                    SwfError::Incomplete {
                        loaded: bytes.len(),
                        expected: bytes.len(),
                    },
                ))
            }
        };

        let milled = MilledSwf {
            version: file.header.version,
            compressed: file.header.compressed,
            frame_rate: file.header.frame_rate,
            frame_count: file.header.frame_count,
            size: bytes.len(),
            tags: file
                .tags
                .iter()
                .map(|record| MilledTag {
                    tag: record.tag,
                    length: record.length,
                })
                .collect(),
        };
        self.describe(&milled);
        Ok(milled)
    }

    fn describe(&self, milled: &MilledSwf) {
        self.writer.enter(&format!(
            "<swf path=\"{}\" version=\"{}\" compressed=\"{}\" frameRate=\"{}\" frameCount=\"{}\" size=\"{}\">",
            self.path.display(),
            milled.version,
            milled.compressed,
            milled.frame_rate,
            milled.frame_count,
            milled.size
        ));
        for tag in &milled.tags {
            self.writer.write_ln(&format!(
                "<tag name=\"{}\" code=\"{}\" length=\"{}\"/>",
                tag.tag.name(),
                tag.tag.code(),
                tag.length
            ));
        }
        self.writer.leave("</swf>");
    }
}

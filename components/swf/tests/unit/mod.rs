//! Unit tests for the container loader

use swf::{
    FileLoader, LoadListener, LoadProgress, Rect, SwfBuilder, SwfError, SwfFile, SwfTag, Symbol,
    SymbolKind, SymbolsAck,
};

/// Records every event as a line of text
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    ack: Option<SymbolsAck>,
}

impl Recorder {
    fn deferring() -> Self {
        Self {
            events: Vec::new(),
            ack: Some(SymbolsAck::Pending),
        }
    }

    fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn position(&self, event: &str) -> usize {
        self.events
            .iter()
            .position(|e| e == event)
            .unwrap_or_else(|| panic!("no {} in {:?}", event, self.events))
    }
}

impl LoadListener for Recorder {
    fn on_load_open(&mut self, file: &SwfFile) {
        self.events.push(format!(
            "open frames={} abcs={}",
            file.frames.len(),
            file.abc_blocks.len()
        ));
    }

    fn on_load_progress(&mut self, _file: &SwfFile, progress: LoadProgress) {
        self.events
            .push(format!("progress frames={}", progress.frames_loaded));
    }

    fn on_load_error(&mut self, error: &SwfError) {
        self.events.push(format!("error {}", error));
    }

    fn on_load_complete(&mut self, file: &SwfFile) {
        self.events
            .push(format!("complete frames={}", file.frames.len()));
    }

    fn on_new_eagerly_parsed_symbols(&mut self, symbols: &[Symbol], _delta: usize) -> SymbolsAck {
        let ids: Vec<String> = symbols.iter().map(|s| s.id.to_string()).collect();
        self.events.push(format!("symbols {}", ids.join(",")));
        self.ack.unwrap_or(SymbolsAck::Done)
    }

    fn on_image_bytes_loaded(&mut self, symbol: &Symbol) {
        self.events.push(format!("image {}", symbol.id));
    }
}

fn sample(compressed: bool) -> Vec<u8> {
    SwfBuilder::new()
        .compressed(compressed)
        .as3()
        .do_abc("main", vec![1, 2, 3])
        .define_image(5, &[0xaa; 10])
        .show_frame()
        .define_font(6, "Arial")
        .show_frame()
        .build()
}

fn load_whole(bytes: &[u8]) -> (Result<(), SwfError>, Recorder) {
    let mut loader = FileLoader::new(Recorder::default());
    let result = loader.load_bytes(bytes);
    (result, loader.into_listener())
}

fn load_chunked(bytes: &[u8], chunk: usize) -> (Result<(), SwfError>, Recorder) {
    let mut loader = FileLoader::new(Recorder::default());
    for piece in bytes.chunks(chunk) {
        if let Err(e) = loader.append_load_data(piece) {
            return (Err(e), loader.into_listener());
        }
    }
    let result = loader.finish();
    (result, loader.into_listener())
}

#[test]
fn whole_load_event_order() {
    let (result, recorder) = load_whole(&sample(false));
    assert!(result.is_ok());
    assert_eq!(
        recorder.events,
        vec![
            "open frames=2 abcs=1",
            "symbols 5,6",
            "image 5",
            "progress frames=2",
            "complete frames=2",
        ]
    );
}

#[test]
fn compressed_whole_load_matches_uncompressed() {
    let (plain, plain_events) = load_whole(&sample(false));
    let (packed, packed_events) = load_whole(&sample(true));
    assert!(plain.is_ok() && packed.is_ok());
    assert_eq!(plain_events.events, packed_events.events);
}

#[test]
fn byte_by_byte_load_orders_events() {
    let (result, recorder) = load_chunked(&sample(false), 1);
    assert!(result.is_ok());

    assert_eq!(recorder.events[0], "open frames=0 abcs=0");
    assert_eq!(recorder.count("open"), 1);
    assert_eq!(recorder.events.last().unwrap(), "complete frames=2");
    assert_eq!(recorder.count("complete"), 1);
    assert_eq!(recorder.count("error"), 0);

    // FileAttributes, DoABC, image, ShowFrame, font, ShowFrame, End
    assert_eq!(recorder.count("progress"), 7);
    assert!(recorder.position("symbols 5") < recorder.position("image 5"));
    assert!(recorder.position("image 5") < recorder.position("symbols 6"));
}

#[test]
fn compressed_chunked_load_completes() {
    for chunk in [1, 7, 64, 4096] {
        let (result, recorder) = load_chunked(&sample(true), chunk);
        assert!(result.is_ok(), "chunk size {}", chunk);
        assert_eq!(recorder.count("open"), 1);
        assert_eq!(recorder.events.last().unwrap(), "complete frames=2");
    }
}

#[test]
fn pending_acknowledgement_gates_completion() {
    let mut loader = FileLoader::new(Recorder::deferring());
    loader.load_bytes(&sample(false)).unwrap();

    assert!(loader.is_waiting());
    assert!(!loader.is_finished());
    assert_eq!(
        loader.listener().events,
        vec!["open frames=2 abcs=1", "symbols 5,6", "image 5"]
    );

    loader.resume().unwrap();
    assert!(loader.is_finished());
    assert_eq!(
        &loader.listener().events[3..],
        &["progress frames=2", "complete frames=2"]
    );
}

#[test]
fn data_pushed_while_waiting_is_buffered() {
    let bytes = sample(false);
    let mut loader = FileLoader::new(Recorder::deferring());
    let mut waited = false;
    for piece in bytes.chunks(3) {
        loader.append_load_data(piece).unwrap();
        while loader.is_waiting() {
            waited = true;
            let seen = loader.listener().events.len();
            loader.append_load_data(&[]).unwrap();
            assert_eq!(loader.listener().events.len(), seen);
            loader.resume().unwrap();
        }
    }
    loader.finish().unwrap();
    assert!(waited);
    assert_eq!(loader.listener().count("symbols"), 2);
    assert_eq!(
        loader.listener().events.last().unwrap(),
        "complete frames=2"
    );
}

#[test]
fn header_failure_reports_error_without_open() {
    let (result, recorder) = load_whole(b"GIF89a\x00\x00\x00\x00");
    assert_eq!(result, Err(SwfError::InvalidSignature("GIF".to_string())));
    assert_eq!(recorder.count("open"), 0);
    assert_eq!(recorder.count("error"), 1);
}

#[test]
fn lzma_container_is_rejected() {
    let mut bytes = sample(false);
    bytes[0] = b'Z';
    let (result, recorder) = load_whole(&bytes);
    assert_eq!(result, Err(SwfError::UnsupportedCompression("LZMA")));
    assert_eq!(recorder.events, vec!["error unsupported compression: LZMA"]);
}

#[test]
fn truncated_file_fails_on_finish() {
    let bytes = sample(false);
    let (result, recorder) = load_whole(&bytes[..bytes.len() - 4]);
    assert!(matches!(result, Err(SwfError::Incomplete { .. })));
    assert_eq!(recorder.count("open"), 1);
    assert_eq!(recorder.count("complete"), 0);
    assert!(recorder.events.last().unwrap().starts_with("error"));
}

#[test]
fn preamble_only_fails_without_open() {
    let bytes = sample(false);
    let (result, recorder) = load_whole(&bytes[..8]);
    assert!(matches!(result, Err(SwfError::Incomplete { .. })));
    assert_eq!(recorder.count("open"), 0);
}

#[test]
fn loader_is_closed_after_failure() {
    let mut loader = FileLoader::new(Recorder::default());
    assert!(loader.load_bytes(b"XYZ\x01\x00\x00\x00\x00").is_err());
    assert_eq!(loader.append_load_data(&[0]), Err(SwfError::Closed));
    assert_eq!(loader.listener().count("error"), 1);
}

#[test]
fn malformed_tag_is_reported() {
    let bytes = SwfBuilder::new()
        .tag(SwfTag::SymbolClass, vec![5, 0])
        .build();
    let (result, recorder) = load_whole(&bytes);
    assert!(matches!(result, Err(SwfError::MalformedTag { .. })));
    assert_eq!(recorder.count("complete"), 0);
    assert_eq!(recorder.count("error"), 1);
}

#[test]
fn file_model_is_populated() {
    let bytes = SwfBuilder::new()
        .frame_rate(30.0)
        .bounds(Rect {
            x_min: 0,
            x_max: 2000,
            y_min: 0,
            y_max: 1000,
        })
        .as3()
        .background_color(0x336699)
        .frame_label("intro")
        .do_abc("first", vec![1])
        .do_abc_define(vec![2])
        .symbol_class(0, "Main")
        .symbol_class(3, "Asset")
        .export(3, "asset")
        .define_binary_data(3, b"payload")
        .show_frame()
        .do_abc_with_flags("second", 0, vec![3])
        .show_frame()
        .build();

    let mut loader = FileLoader::new(Recorder::default());
    loader.load_bytes(&bytes).unwrap();
    let file = loader.file().unwrap();

    assert_eq!(file.header.frame_rate, 30.0);
    assert_eq!(file.header.frame_count, 2);
    assert_eq!(file.header.bounds.x_max, 2000);
    assert_eq!(file.header.file_length, bytes.len());
    assert!(file.is_as3());
    assert_eq!(file.background_color, Some(0x336699));
    assert_eq!(file.main_class(), Some("Main"));
    assert_eq!(file.exports, vec![(3, "asset".to_string())]);
    assert_eq!(file.dictionary[&3].kind, SymbolKind::BinaryData);
    assert_eq!(file.dictionary[&3].length, 7);

    assert_eq!(file.frames.len(), 2);
    assert_eq!(file.frames[0].label.as_deref(), Some("intro"));
    let first: Vec<&str> = file.frame_abc_blocks(0).map(|b| b.name.as_str()).collect();
    assert_eq!(first, vec!["first", ""]);
    let second: Vec<&[u8]> = file.frame_abc_blocks(1).map(|b| b.data.as_slice()).collect();
    assert_eq!(second, vec![&[3u8][..]]);
    assert!(!file.abc_blocks[2].is_lazy());
    assert_eq!(file.bytes_loaded, bytes.len());
}

#[test]
fn tag_records_cover_every_tag() {
    let bytes = SwfBuilder::new()
        .tag(SwfTag::Unknown(200), vec![0; 70])
        .show_frame()
        .build();
    let mut loader = FileLoader::new(Recorder::default());
    loader.load_bytes(&bytes).unwrap();
    let tags: Vec<(String, usize)> = loader
        .file()
        .unwrap()
        .tags
        .iter()
        .map(|t| (t.tag.name(), t.length))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("TAG200".to_string(), 70),
            ("SHOW_FRAME".to_string(), 0),
            ("END".to_string(), 0),
        ]
    );
}

#[test]
fn font_symbol_carries_name() {
    let mut loader = FileLoader::new(Recorder::default());
    loader.load_bytes(&sample(false)).unwrap();
    let font = &loader.file().unwrap().dictionary[&6];
    assert_eq!(font.kind, SymbolKind::Font);
    assert_eq!(font.name.as_deref(), Some("Arial"));
    assert!(font.is_eager());
}

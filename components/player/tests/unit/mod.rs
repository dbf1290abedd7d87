//! Unit tests for hosted playback

use async_runtime::{MicroTasksQueue, StopHandle, VIRTUAL_EPOCH_MS};
use bytecode_system::assemble;
use core_types::{IndentingWriter, SharedBuffer};
use interpreter::{DomainOptions, DomainScope, SecurityDomain};
use player::{LoadStatus, Player, PlayerError, PlayerHost};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use swf::SwfBuilder;

#[derive(Default)]
struct Log {
    traces: Vec<String>,
    commands: Vec<String>,
    frames: Vec<usize>,
}

struct Recorder {
    log: Rc<RefCell<Log>>,
    stop: Option<StopHandle>,
}

impl PlayerHost for Recorder {
    fn trace(&mut self, message: &str) {
        self.log.borrow_mut().traces.push(message.to_string());
    }

    fn on_fs_command(&mut self, command: &str, _args: &str) {
        self.log.borrow_mut().commands.push(command.to_string());
        if command == "quit" {
            if let Some(stop) = &self.stop {
                stop.stop();
            }
        }
    }

    fn on_frame_processed(&mut self, frame: usize) {
        self.log.borrow_mut().frames.push(frame);
    }
}

struct Fixture {
    player: Player,
    queue: MicroTasksQueue,
    log: Rc<RefCell<Log>>,
    output: SharedBuffer,
}

fn fixture() -> Fixture {
    fixture_with_chunks(player::DEFAULT_CHUNK_SIZE)
}

fn fixture_with_chunks(chunk_size: usize) -> Fixture {
    let (writer, output) = IndentingWriter::captured();
    let mut domain = SecurityDomain::new(DomainOptions::default().with_writer(writer));
    domain.initialize();
    let queue = MicroTasksQueue::new();
    let log = Rc::new(RefCell::new(Log::default()));
    let host = Recorder {
        log: Rc::clone(&log),
        stop: Some(queue.stop_handle()),
    };
    Fixture {
        player: Player::new(domain, Box::new(host)).with_chunk_size(chunk_size),
        queue,
        log,
        output,
    }
}

fn abc(source: &str) -> Vec<u8> {
    assemble(source, "frame.abc").unwrap().to_bytes()
}

fn tracing(message: &str) -> Vec<u8> {
    abc(&format!(
        ".method main\n  getglobal trace\n  pushstring \"{}\"\n  call 1\n  pop\n  returnvoid\n.end\n.init main",
        message
    ))
}

const ENTER_FRAME: &str = "
.method enter params=1
  getglobal trace
  pushstring \"enter\"
  getlocal 0
  call 2
  pop
  returnvoid
.end
.method main
  returnvoid
.end
.function onEnterFrame enter
.init main
";

const QUIT: &str = "
.method main
  getglobal fscommand
  pushstring \"quit\"
  call 1
  pop
  returnvoid
.end
.init main
";

#[test]
fn frame_scripts_run_once_in_application_scope() {
    let mut f = fixture();
    let bytes = SwfBuilder::new()
        .do_abc("one", abc(".method main\n  pushint 1\n  setglobal counter\n  returnvoid\n.end\n.init main"))
        .do_abc("two", tracing("frame 1"))
        .show_frame()
        .do_abc("three", tracing("frame 2"))
        .show_frame()
        .build();
    f.player.load_bytes(&mut f.queue, bytes, "movie.swf");

    let summary = f.queue.run(0, 0, true).unwrap();
    assert!(!summary.stopped());
    assert_eq!(f.player.load_status(), LoadStatus::Complete);
    assert_eq!(f.player.frames_processed(), 2);
    assert_eq!(f.log.borrow().traces, vec!["frame 1", "frame 2"]);
    assert_eq!(f.log.borrow().frames, vec![1, 2]);
    assert!(f.player.with_domain(|d| d.scope(DomainScope::Application).contains("counter")));
    assert!(f.player.with_domain(|d| !d.scope(DomainScope::System).contains("counter")));
}

#[test]
fn frames_advance_on_virtual_frame_rate() {
    let mut f = fixture();
    let bytes = SwfBuilder::new()
        .frame_rate(25.0)
        .show_frame()
        .show_frame()
        .show_frame()
        .build();
    f.player.load_bytes(&mut f.queue, bytes, "movie.swf");
    f.queue.run(0, 0, true).unwrap();

    assert_eq!(f.player.frames_processed(), 3);
    // Three frames 40 ms apart, then the tick that finds the timeline done.
    assert_eq!(f.queue.now(), VIRTUAL_EPOCH_MS + 120.0);
}

#[test]
fn enter_frame_handler_loops_the_timeline() {
    let mut f = fixture();
    let bytes = SwfBuilder::new()
        .do_abc("main", abc(ENTER_FRAME))
        .show_frame()
        .show_frame()
        .build();
    f.player.load_bytes(&mut f.queue, bytes, "movie.swf");

    // One load run, then five frame ticks.
    let summary = f.queue.run(0, 6, true).unwrap();
    assert_eq!(summary.executed, 6);
    assert_eq!(
        f.log.borrow().traces,
        vec!["enter 1", "enter 2", "enter 1", "enter 2", "enter 1"]
    );
    assert!(f.queue.is_empty());
}

#[test]
fn quit_command_stops_the_queue() {
    let mut f = fixture();
    let bytes = SwfBuilder::new()
        .do_abc("main", abc(ENTER_FRAME))
        .show_frame()
        .do_abc("quit", abc(QUIT))
        .show_frame()
        .do_abc("late", tracing("never"))
        .show_frame()
        .build();
    f.player.load_bytes(&mut f.queue, bytes, "movie.swf");

    let summary = f.queue.run(0, 0, true).unwrap();
    assert!(summary.stopped());
    assert_eq!(f.log.borrow().commands, vec!["quit"]);
    assert_eq!(f.log.borrow().frames, vec![1, 2]);
    assert!(!f.log.borrow().traces.contains(&"never".to_string()));
}

#[test]
fn script_errors_do_not_stop_playback() {
    let mut f = fixture();
    let bytes = SwfBuilder::new()
        .do_abc("bad", abc(".method main\n  pushstring \"boom\"\n  throw\n.end\n.init main"))
        .show_frame()
        .do_abc("good", tracing("still playing"))
        .show_frame()
        .build();
    f.player.load_bytes(&mut f.queue, bytes, "movie.swf");
    f.queue.run(0, 0, true).unwrap();

    assert_eq!(f.player.frames_processed(), 2);
    assert_eq!(f.log.borrow().traces, vec!["still playing"]);
    let output = f.output.contents();
    assert!(output.contains("Error while executing movie.swf#bad: Error: boom"));
    assert!(output.contains("at main (movie.swf#bad:1)"));
}

#[test]
fn unparsable_block_is_logged() {
    let mut f = fixture();
    let bytes = SwfBuilder::new()
        .do_abc("junk", vec![0xde, 0xad])
        .show_frame()
        .build();
    f.player.load_bytes(&mut f.queue, bytes, "movie.swf");
    f.queue.run(0, 0, true).unwrap();

    assert_eq!(f.player.frames_processed(), 1);
    assert!(f.output.contents().contains("Cannot parse ABC block movie.swf#junk"));
}

#[test]
fn small_chunks_of_compressed_file_play_all_frames() {
    let mut f = fixture_with_chunks(16);
    let bytes = SwfBuilder::new()
        .compressed(true)
        .frame_label("start")
        .do_abc("a", tracing("a"))
        .show_frame()
        .do_abc("b", tracing("b"))
        .show_frame()
        .do_abc("c", tracing("c"))
        .show_frame()
        .build();
    f.player.load_bytes(&mut f.queue, bytes, "movie.swf");
    f.queue.run(0, 0, true).unwrap();

    assert_eq!(f.player.load_status(), LoadStatus::Complete);
    assert_eq!(f.player.frames_loaded(), 3);
    assert_eq!(f.player.frames_processed(), 3);
    assert_eq!(f.player.frame_label(0).as_deref(), Some("start"));
    assert_eq!(f.log.borrow().traces, vec!["a", "b", "c"]);
}

#[test]
fn truncated_file_plays_loaded_frames_and_logs() {
    let mut f = fixture();
    let bytes = SwfBuilder::new()
        .do_abc("a", tracing("a"))
        .show_frame()
        .do_abc("b", tracing("b"))
        .show_frame()
        .build();
    let cut = bytes.len() - 6;
    f.player.load_bytes(&mut f.queue, bytes[..cut].to_vec(), "movie.swf");
    f.queue.run(0, 0, true).unwrap();

    assert_eq!(f.player.load_status(), LoadStatus::Failed);
    assert_eq!(f.log.borrow().traces, vec!["a"]);
    assert!(f.output.contents().contains("Cannot load movie.swf"));
}

#[test]
fn load_file_reads_from_disk() {
    let mut f = fixture();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&SwfBuilder::new().do_abc("a", tracing("disk")).show_frame().build())
        .unwrap();
    f.player.load_file(&mut f.queue, file.path()).unwrap();
    f.queue.run(0, 0, true).unwrap();
    assert_eq!(f.log.borrow().traces, vec!["disk"]);
}

#[test]
fn load_file_reports_missing_file() {
    let mut f = fixture();
    let dir = tempfile::tempdir().unwrap();
    let err = f
        .player
        .load_file(&mut f.queue, &dir.path().join("missing.swf"))
        .unwrap_err();
    assert!(matches!(err, PlayerError::Io { .. }));
    assert!(f.queue.is_empty());
}

#[test]
fn create_bootstraps_from_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let builtin = dir.path().join("builtin.abc");
    std::fs::write(
        &builtin,
        abc(".method main\n  pushstring \"builtin\"\n  setglobal origin\n  returnvoid\n.end\n.init main"),
    )
    .unwrap();
    let (writer, _) = IndentingWriter::captured();
    let log = Rc::new(RefCell::new(Log::default()));
    let host = Recorder {
        log,
        stop: None,
    };

    let player = Player::create(
        &builtin,
        None,
        None,
        DomainOptions::default().with_writer(writer),
        Box::new(host),
    )
    .unwrap();
    assert!(player.with_domain(|d| d.is_initialized()));
    assert!(player.with_domain(|d| d.scope(DomainScope::System).contains("origin")));

    let missing = Player::create(
        &dir.path().join("nope.abc"),
        None,
        None,
        DomainOptions::default(),
        Box::new(Recorder {
            log: Rc::new(RefCell::new(Log::default())),
            stop: None,
        }),
    );
    assert!(matches!(missing, Err(PlayerError::Bootstrap(_))));
}

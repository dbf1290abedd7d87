//! Container / Player Integration Tests
//!
//! Builds container files, writes them to disk, and plays them through a
//! player bootstrapped from on-disk artifacts.

use async_runtime::MicroTasksQueue;
use core_types::IndentingWriter;
use integration_tests::fixtures::{module_bytes, tracing, Home};
use interpreter::{CatalogPaths, DomainOptions};
use player::{LoadStatus, Player, PlayerHost};
use std::cell::RefCell;
use std::rc::Rc;
use swf::SwfBuilder;

#[derive(Clone, Default)]
struct Traces(Rc<RefCell<Vec<String>>>);

impl PlayerHost for Traces {
    fn trace(&mut self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }

    fn on_fs_command(&mut self, _command: &str, _args: &str) {}
}

fn player(home: &Home, traces: &Traces) -> Player {
    let (writer, _) = IndentingWriter::captured();
    let catalog = CatalogPaths::new(
        home.path("build/playerglobal/playerglobal.abcs"),
        home.path("build/playerglobal/playerglobal.json"),
    );
    Player::create(
        &home.path("src/avm2/generated/builtin/builtin.abc"),
        None,
        Some(&catalog),
        DomainOptions::default().with_writer(writer),
        Box::new(traces.clone()),
    )
    .expect("player bootstrap failed")
}

/// Test: a compressed file plays every frame from disk
#[test]
fn test_compressed_file_from_disk() {
    let home = Home::new();
    let movie = home.write(
        "movie.swf",
        SwfBuilder::new()
            .compressed(true)
            .as3()
            .do_abc("one", module_bytes(&tracing("frame 1"), "one"))
            .show_frame()
            .do_abc("two", module_bytes(&tracing("frame 2"), "two"))
            .show_frame()
            .build(),
    );
    let traces = Traces::default();
    let player = player(&home, &traces);
    let mut queue = MicroTasksQueue::new();

    player.load_file(&mut queue, &movie).expect("load failed");
    queue.run(0, 0, true).expect("run failed");

    assert_eq!(player.load_status(), LoadStatus::Complete);
    assert_eq!(player.frames_processed(), 2);
    assert_eq!(*traces.0.borrow(), vec!["frame 1", "frame 2"]);
}

/// Test: frame scripts resolve player globals through the catalog
#[test]
fn test_frame_script_uses_catalog() {
    let home = Home::new();
    let script = ".method main\n  getglobal trace\n  getglobal Stage\n  call 1\n  pop\n  returnvoid\n.end\n.init main";
    let movie = home.write(
        "movie.swf",
        SwfBuilder::new()
            .do_abc("main", module_bytes(script, "main"))
            .show_frame()
            .build(),
    );
    let traces = Traces::default();
    let player = player(&home, &traces);
    let mut queue = MicroTasksQueue::new();

    player.load_file(&mut queue, &movie).expect("load failed");
    queue.run(0, 0, true).expect("run failed");
    assert_eq!(*traces.0.borrow(), vec!["550"]);
    assert!(player.with_domain(|d| d.scope(interpreter::DomainScope::System).contains("Stage")));
}

/// Test: the micro-task count bounds playback
#[test]
fn test_task_count_bounds_playback() {
    let home = Home::new();
    let movie = home.write(
        "movie.swf",
        SwfBuilder::new()
            .show_frame()
            .show_frame()
            .show_frame()
            .build(),
    );
    let traces = Traces::default();
    let player = player(&home, &traces);
    let mut queue = MicroTasksQueue::new();

    player.load_file(&mut queue, &movie).expect("load failed");
    let summary = queue.run(0, 2, true).expect("run failed");
    assert_eq!(summary.executed, 2);
    assert!(player.frames_processed() < 3);
    assert!(queue.is_empty());
}

//! Unit tests for IndentingWriter

use core_types::{IndentingWriter, LogLevel};

#[test]
fn test_enter_leave_indentation() {
    let (writer, buffer) = IndentingWriter::captured();
    writer.enter("outer {");
    writer.enter("inner {");
    writer.write_ln("body");
    writer.leave("}");
    writer.leave("}");
    assert_eq!(buffer.contents(), "outer {\n  inner {\n    body\n  }\n}\n");
}

#[test]
fn test_default_level_shows_warnings_not_info() {
    let (writer, buffer) = IndentingWriter::captured();
    writer.info_ln("info");
    writer.warn_ln("warn");
    assert_eq!(buffer.contents(), "warn\n");
}

#[test]
fn test_info_shown_at_debug_level() {
    let (writer, buffer) = IndentingWriter::captured();
    writer.set_log_level(LogLevel::Debug);
    writer.info_ln("info");
    assert_eq!(buffer.contents(), "info\n");
}

#[test]
fn test_red_lines_colored_only_when_enabled() {
    let (writer, buffer) = IndentingWriter::captured();
    writer.red_ln("plain");
    writer.set_colors(true);
    writer.red_ln("red");
    assert_eq!(buffer.contents(), "plain\n\x1b[91mred\x1b[0m\n");
}

#[test]
fn test_write_lns_splits_lines() {
    let (writer, buffer) = IndentingWriter::captured();
    writer.indent();
    writer.write_lns("a\nb");
    assert_eq!(buffer.contents(), "  a\n  b\n");
}

#[test]
fn test_outdent_saturates() {
    let (writer, buffer) = IndentingWriter::captured();
    writer.outdent();
    writer.write_ln("x");
    assert_eq!(buffer.contents(), "x\n");
}

//! Tests for the disassembly trace

use bytecode_system::assemble;
use core_types::IndentingWriter;

const PROGRAM: &str = r#"
.method main locals=1
  pushint 0
  setlocal 0
loop:
  getlocal 0
  pushint 3
  lessthan
  iffalse done
  getlocal 0
  pushint 1
  add
  setlocal 0
  jump loop
done:
  getglobal trace
  pushstring "finished \"ok\""
  call 1
  pop
  returnvoid
.end
.method helper params=1
  getlocal 0
  returnvalue
.end
.slot count int 3
.slot ratio double 1.5
.slot "odd name" string "hi there"
.slot nothing undefined
.function helper helper
.init main
"#;

#[test]
fn test_trace_header_and_structure() {
    let module = assemble(PROGRAM, "loop.abc").unwrap();
    let text = module.disassemble();
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("; abc loop.abc version=46.16"));
    assert!(lines.contains(&".method main params=0 locals=1"));
    assert!(lines.contains(&"  L2:"));
    assert!(lines.contains(&"  iffalse L11"));
    assert!(lines.contains(&"  jump L2"));
    assert!(lines.contains(&"  pushstring \"finished \\\"ok\\\"\""));
    assert!(lines.contains(&".slot \"odd name\" string \"hi there\""));
    assert!(lines.contains(&".slot ratio double 1.5"));
    assert!(lines.contains(&".function helper helper"));
    assert_eq!(lines.last(), Some(&".init main"));
}

#[test]
fn test_disassembly_reassembles_to_same_module() {
    let module = assemble(PROGRAM, "loop.abc").unwrap();
    let again = assemble(&module.disassemble(), "loop.abc").unwrap();
    assert_eq!(again.to_bytes(), module.to_bytes());
    assert_eq!(again.symbol_names(), module.symbol_names());
}

#[test]
fn test_trace_respects_writer_indentation() {
    let module = assemble(".method main\n  returnvoid\n.end\n.init main", "m.abc").unwrap();
    let (writer, buffer) = IndentingWriter::captured();
    writer.enter("Module m.abc:");
    module.trace(&writer);
    writer.leave("");
    let text = buffer.contents();
    assert!(text.contains("\n  .method main params=0 locals=0\n    returnvoid\n  .end\n"));
}

//! On-disk artifacts for a complete runtime
//!
//! A [`Home`] holds a builtin module, a shell library, and a player-global
//! catalog with one lazily resolved symbol, laid out at the default
//! locations the shell looks for them under `--home`.

use bytecode_system::assemble;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builtin module; defines `runtimeName` and `identity`
pub const BUILTIN: &str = "
.method init
  pushstring \"builtin\"
  setglobal runtimeName
  returnvoid
.end
.method identity params=1
  getlocal 0
  returnvalue
.end
.function identity identity
.init init
";

/// Shell library; appends to `runtimeName`
pub const SHELL_LIBRARY: &str = "
.method init
  getglobal runtimeName
  pushstring \"+shell\"
  add
  setglobal runtimeName
  returnvoid
.end
.init init
";

/// Catalog module defining `Stage` as 550
pub const STAGE_LIBRARY: &str = "
.method init
  pushint 550
  setglobal Stage
  returnvoid
.end
.init init
";

/// Bytes of `source` assembled under `label`
pub fn module_bytes(source: &str, label: &str) -> Vec<u8> {
    match assemble(source, label) {
        Ok(abc) => abc.to_bytes(),
        Err(e) => panic!("fixture {} does not assemble: {}", label, e),
    }
}

/// Bytecode that traces `message` when initialized
pub fn tracing(message: &str) -> String {
    format!(
        ".method main\n  getglobal trace\n  pushstring \"{}\"\n  call 1\n  pop\n  returnvoid\n.end\n.init main",
        message
    )
}

/// A temporary home directory with every runtime artifact in place
pub struct Home {
    dir: TempDir,
}

impl Home {
    /// Create the directory and write the artifacts
    pub fn new() -> Self {
        let dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => panic!("cannot create temporary home: {}", e),
        };
        let home = Self { dir };
        home.write(
            "src/avm2/generated/builtin/builtin.abc",
            module_bytes(BUILTIN, "builtin.abc"),
        );
        home.write(
            "src/avm2/generated/shell/shell.abc",
            module_bytes(SHELL_LIBRARY, "shell.abc"),
        );
        let stage = module_bytes(STAGE_LIBRARY, "stage.abc");
        home.write(
            "build/playerglobal/playerglobal.json",
            format!(
                r#"[{{"name": "stage.abc", "offset": 0, "length": {}, "defs": ["Stage"]}}]"#,
                stage.len()
            ),
        );
        home.write("build/playerglobal/playerglobal.abcs", stage);
        home
    }

    /// Root of the home directory
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative`
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `bytes` at `relative`, creating parent directories
    pub fn write(&self, relative: &str, bytes: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                panic!("cannot create {}: {}", parent.display(), e);
            }
        }
        if let Err(e) = fs::write(&path, bytes) {
            panic!("cannot write {}: {}", path.display(), e);
        }
        path
    }

    /// Assemble `source` and write it at `relative`
    pub fn module(&self, relative: &str, source: &str) -> PathBuf {
        self.write(relative, module_bytes(source, relative))
    }
}

impl Default for Home {
    fn default() -> Self {
        Self::new()
    }
}

//! Command line options
//!
//! Positional arguments are input files; each must end in `.abc`, `.swf` or
//! `.js`. Artifact locations default to paths under `--home`.

use clap::Parser;
use core_types::IndentingWriter;
use interpreter::CatalogPaths;
use std::path::{Path, PathBuf};

use crate::error::{ShellError, ShellResult};

/// Default builtin module, relative to the home directory
pub const BUILTIN_ABC: &str = "src/avm2/generated/builtin/builtin.abc";
/// Default shell library module
pub const SHELL_ABC: &str = "src/avm2/generated/shell/shell.abc";
/// Default player-global module buffer
pub const PLAYER_GLOBAL_ABCS: &str = "build/playerglobal/playerglobal.abcs";
/// Default player-global catalog index
pub const PLAYER_GLOBAL_CATALOG: &str = "build/playerglobal/playerglobal.json";

/// Kind of input file, by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Bytecode module
    Abc,
    /// Container file
    Swf,
    /// Unit-test script
    Script,
}

impl InputKind {
    /// Classify `path` by its extension
    pub fn of(path: &Path) -> Option<Self> {
        let name = path.to_str()?;
        if name.ends_with(".abc") {
            Some(InputKind::Abc)
        } else if name.ends_with(".swf") {
            Some(InputKind::Swf)
        } else if name.ends_with(".js") {
            Some(InputKind::Script)
        } else {
            None
        }
    }
}

/// AVM shell command line
#[derive(Parser, Debug, Clone)]
#[command(name = "avm-shell")]
#[command(about = "Parse, disassemble, compile or execute bytecode and container files")]
pub struct Cli {
    /// Input files (.abc, .swf or .js)
    pub files: Vec<String>,

    /// Parse file(s)
    #[arg(short = 'p', long)]
    pub parse: bool,

    /// Print a JSON record per parsed container
    #[arg(long = "parseForDatabase", visible_alias = "po")]
    pub parse_for_database: bool,

    /// Disassemble file(s)
    #[arg(short = 'd', long)]
    pub disassemble: bool,

    /// Compile file(s)
    #[arg(short = 'c', long)]
    pub compile: bool,

    /// Verbose
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Profile
    #[arg(short = 'o', long)]
    pub profile: bool,

    /// Release mode, skips the verifier
    #[arg(short = 'r', long)]
    pub release: bool,

    /// Execute file(s)
    #[arg(short = 'x', long)]
    pub execute: bool,

    /// Interpreter only
    #[arg(short = 'i', long = "interpreterOnly")]
    pub interpreter_only: bool,

    /// Symbol filter, comma separated tag names
    #[arg(short = 'f', long, default_value = "")]
    pub filter: String,

    /// Micro task duration in milliseconds
    #[arg(long, visible_alias = "md", default_value_t = 0)]
    pub duration: u64,

    /// Micro task count
    #[arg(long, visible_alias = "mc", default_value_t = 0)]
    pub count: usize,

    /// Repeat count
    #[arg(long, visible_alias = "rp", default_value_t = 1)]
    pub repeat: u32,

    /// Load player global
    #[arg(short = 'g', long = "playerGlobal")]
    pub player_global: bool,

    /// Load shell global
    #[arg(short = 's', long)]
    pub shell: bool,

    /// Keep outputs free from debug messages
    #[arg(long)]
    pub porcelain: bool,

    /// Use the bundled player source
    #[arg(long)]
    pub bundle: bool,

    /// Use the bundled and closure compiled player source
    #[arg(short = 'b', long = "closure-bundle")]
    pub closure_bundle: bool,

    /// Generate a random container file at this path
    #[arg(long)]
    pub fuzz: Option<PathBuf>,

    /// Writers filter [r: runtime, i: interpreter]
    #[arg(short = 'w', long, default_value = "")]
    pub writers: String,

    /// Directory artifact defaults are relative to
    #[arg(long, default_value = ".")]
    pub home: PathBuf,

    /// Builtin module
    #[arg(long = "builtin-abc")]
    pub builtin_abc: Option<PathBuf>,

    /// Shell library module
    #[arg(long = "shell-abc")]
    pub shell_abc: Option<PathBuf>,

    /// Player-global module buffer
    #[arg(long = "player-global-abcs")]
    pub player_global_abcs: Option<PathBuf>,

    /// Player-global catalog index
    #[arg(long = "player-global-catalog")]
    pub player_global_catalog: Option<PathBuf>,
}

impl Cli {
    /// Input files, in command line order
    ///
    /// # Errors
    ///
    /// [`ShellError::Argument`] for the first positional that is not an
    /// input file.
    pub fn input_files(&self) -> ShellResult<Vec<PathBuf>> {
        self.files
            .iter()
            .map(|file| {
                let path = PathBuf::from(file);
                match InputKind::of(&path) {
                    Some(_) => Ok(path),
                    None => Err(ShellError::Argument(file.clone())),
                }
            })
            .collect()
    }

    /// Tag names from `--filter`; empty when no filter is set
    pub fn symbol_filters(&self) -> Vec<String> {
        self.filter
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Whether `--writers` selects runtime tracing
    pub fn trace_runtime(&self) -> bool {
        self.writers.contains('r')
    }

    /// Whether `--writers` selects interpreter tracing
    pub fn trace_interpreter(&self) -> bool {
        self.writers.contains('i')
    }

    fn artifact(&self, explicit: &Option<PathBuf>, default: &str) -> PathBuf {
        explicit.clone().unwrap_or_else(|| self.home.join(default))
    }

    /// Resolved builtin module path
    pub fn builtin_path(&self) -> PathBuf {
        self.artifact(&self.builtin_abc, BUILTIN_ABC)
    }

    /// Shell library path, when `--shell` is set
    pub fn shell_path(&self) -> Option<PathBuf> {
        self.shell.then(|| self.artifact(&self.shell_abc, SHELL_ABC))
    }

    /// Player-global catalog locations
    pub fn catalog_paths(&self) -> CatalogPaths {
        CatalogPaths::new(
            self.artifact(&self.player_global_abcs, PLAYER_GLOBAL_ABCS),
            self.artifact(&self.player_global_catalog, PLAYER_GLOBAL_CATALOG),
        )
    }

    /// Write every option and its value
    pub fn trace(&self, writer: &IndentingWriter) {
        writer.enter("Shell Options:");
        let flags = [
            ("parse", self.parse),
            ("parseForDatabase", self.parse_for_database),
            ("disassemble", self.disassemble),
            ("compile", self.compile),
            ("verbose", self.verbose),
            ("profile", self.profile),
            ("release", self.release),
            ("execute", self.execute),
            ("interpreterOnly", self.interpreter_only),
            ("playerGlobal", self.player_global),
            ("shell", self.shell),
            ("porcelain", self.porcelain),
            ("bundle", self.bundle),
            ("closure-bundle", self.closure_bundle),
        ];
        for (name, value) in flags {
            writer.write_ln(&format!("{}: {}", name, value));
        }
        writer.write_ln(&format!("filter: {:?}", self.filter));
        writer.write_ln(&format!("duration: {}", self.duration));
        writer.write_ln(&format!("count: {}", self.count));
        writer.write_ln(&format!("repeat: {}", self.repeat));
        writer.write_ln(&format!("writers: {:?}", self.writers));
        writer.write_ln(&format!("builtin: {}", self.builtin_path().display()));
        writer.leave("");
    }
}

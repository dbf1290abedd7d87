//! AVM shell
//!
//! Parses the command line and hands the run to [`shell::Shell`]. Exits
//! with status 1 when a unit test failed or a fatal error ended the run.

use clap::Parser;
use core_types::IndentingWriter;
use shell::{Cli, Shell};
use std::io::IsTerminal;
use std::process;

fn main() {
    let cli = Cli::parse();
    let writer = IndentingWriter::stdout();
    writer.set_colors(std::io::stdout().is_terminal());

    let code = match Shell::new(cli, writer.clone()).and_then(|mut shell| shell.run()) {
        Ok(outcome) => outcome.exit_code(),
        Err(error) => {
            writer.red_ln(&format!("Error: {}", error));
            1
        }
    };
    process::exit(code);
}

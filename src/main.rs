//! langpack - Command-line tool for building and releasing language-pack bundles

use std::process::ExitCode;

use langpack::cli;

fn main() -> ExitCode {
    cli::run()
}

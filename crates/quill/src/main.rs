//! Command-line host for the quill directive pipeline.
//!
//! Reads model output on stdin and prints the JSON report on stdout. See
//! [`quill::cli::run`].

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    quill::cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}

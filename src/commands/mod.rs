//! `bfvm` subcommands. Each returns the process exit code.

use std::fs;
use std::io::{self, Write};

pub mod check;
pub mod debug;
pub mod run;

/// Where the program text comes from: `--file PATH` or the positional parts.
///
/// Returns `Err(exit_code)` after reporting the problem; usage errors go
/// through `usage` and never return.
pub(crate) fn read_code(
    program: &str,
    file: Option<String>,
    code: Vec<String>,
    usage: fn(&str, i32) -> !,
) -> Result<String, i32> {
    if file.is_none() && code.is_empty() {
        usage(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage(program, 2);
    }

    match file {
        Some(path) => fs::read_to_string(&path).map_err(|e| {
            eprintln!("{program}: failed to read code file as UTF-8: {e}");
            let _ = io::stderr().flush();
            1
        }),
        None => Ok(code.join("")),
    }
}

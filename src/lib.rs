//! A small Brainfuck virtual machine.
//!
//! Programs go through two stages:
//! - the [loader](loader) scans the source once, drops comments, validates and
//!   pairs brackets, and gathers [`CodeStats`];
//! - the [engine](engine) runs the resulting [`Program`] over a fresh tape of
//!   byte cells, jumping through the precomputed [`BracketTable`].
//!
//! Features and behaviors:
//! - Memory tape of 30,000 cells by default, initialized to 0, wrapping byte arithmetic.
//! - Pointer moves past either end follow a [`BoundsPolicy`]: fail (default), wrap or clamp.
//! - Input `,` reads a single byte; on end of input the current cell is set to 0.
//! - Output `.` sends the current byte to the output sink and records it in the output cache.
//! - The run's return value is the cell under the data pointer when the program ends.
//! - Any non-instruction character is a comment.
//!
//! Quick start:
//!
//! ```
//! // Add 2 and 5: the result is left in the current cell.
//! let exit = bfvm::run_source("++>+++++[<+>-]<", b"").expect("program should run");
//! assert_eq!(exit.value, 7);
//!
//! // Echo input back.
//! let exit = bfvm::run_source(",[.,]", b"hi").unwrap();
//! assert_eq!(exit.output, b"hi");
//! ```

use std::collections::VecDeque;

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod debugger;
pub mod engine;
pub mod error;
pub mod instruction;
pub mod io;
pub mod loader;
pub mod tape;
pub mod theme;
pub mod trace;

pub use engine::{Engine, Exit, Snapshot, StepControl};
pub use error::{BracketKind, ConfigError, EngineError, Error, LoadError};
pub use instruction::Instruction;
pub use loader::{load, BracketTable, CodeStats, LoadOptions, Program};
pub use tape::{BoundsPolicy, Tape, TapeWindow};

/// Load and run `source` on a default tape, feeding it `input` and collecting its output.
pub fn run_source(source: &str, input: &[u8]) -> Result<Exit, Error> {
    let program = Program::load(source)?;
    let mut engine = Engine::new(&program);
    engine.set_input_source(input.iter().copied().collect::<VecDeque<u8>>());
    engine.set_output_sink(io::Discard);
    Ok(engine.run()?)
}

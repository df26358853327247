use std::io::{self, IsTerminal, Write};

use crate::error::{EngineError, LoadError};
use crate::loader::Program;
use crate::theme;

/// Headline for a load error, prefixed with `program: ` when given.
pub fn describe_load_error(program: Option<&str>, err: &LoadError) -> String {
    let msg = match err {
        LoadError::UnbalancedBracket { kind, line, column, .. } => {
            format!("Parse error: unmatched bracket {kind} at line {line}, column {column}")
        }
    };
    prefix_program(program, &msg)
}

/// Headline for a runtime error, prefixed with `program: ` when given.
pub fn describe_engine_error(program: Option<&str>, err: &EngineError) -> String {
    let msg = match err {
        EngineError::OutOfBounds { ip, dp, op } => {
            format!("Runtime error: pointer out of bounds (dp={dp}, op={op}) at instruction {ip}")
        }
        EngineError::Io { ip, source } => format!("I/O error: {source} at instruction {ip}"),
        other => other.to_string(),
    };
    prefix_program(program, &msg)
}

/// Pretty-print a load error with a caret under the offending bracket.
pub fn print_load_error(program: Option<&str>, code: &str, err: &LoadError) {
    print_error_with_context(&describe_load_error(program, err), code, Some(err.offset()));
}

/// Pretty-print a runtime error, pointing into the original source where possible.
pub fn print_engine_error(program: Option<&str>, loaded: &Program, err: &EngineError) {
    let offset = match err {
        EngineError::OutOfBounds { ip, .. } | EngineError::Io { ip, .. } => loaded.source_offset(*ip),
        EngineError::StepLimitExceeded { .. } | EngineError::Canceled => None,
    };
    print_error_with_context(&describe_engine_error(program, err), loaded.source(), offset);
}

/// Print a concise error headline and, when `pos` is known, a caret context window.
pub fn print_error_with_context(headline: &str, code: &str, pos: Option<usize>) {
    let mut stderr = io::stderr().lock();
    let headline = if io::stderr().is_terminal() {
        theme::error_style().paint(headline).to_string()
    } else {
        headline.to_string()
    };
    let _ = writeln!(stderr, "{headline}");
    if let Some(pos) = pos {
        let _ = write!(stderr, "{}", render_context(code, pos));
    }
    let _ = stderr.flush();
}

/// A short window of `code` around character `pos` (on its line) with a caret underneath,
/// working with UTF-8 by slicing using char indices.
pub fn render_context(code: &str, pos: usize) -> String {
    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let chars: Vec<char> = code.chars().collect();
    let pos = pos.min(chars.len());

    // Keep the window on the line that contains pos.
    let line_start = chars[..pos].iter().rposition(|c| *c == '\n').map_or(0, |i| i + 1);
    let line_end = chars[pos..]
        .iter()
        .position(|c| *c == '\n')
        .map_or(chars.len(), |i| pos + i);

    let start_char = pos.saturating_sub(WINDOW_CHARS).max(line_start);
    let end_char = (pos + WINDOW_CHARS + 1).min(line_end);

    let start_byte = char_to_byte_index(code, start_char);
    let end_byte = char_to_byte_index(code, end_char);
    let slice = &code[start_byte..end_byte];

    // Caret under the exact position
    let underline = format!("{}^", " ".repeat(pos - start_char));
    format!("  {slice}\n  {underline}\n")
}

fn prefix_program(program: Option<&str>, msg: &str) -> String {
    match program {
        Some(p) => format!("{p}: {msg}"),
        None => msg.to_string(),
    }
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(byte_idx, _)| byte_idx)
}

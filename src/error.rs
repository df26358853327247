//! Error taxonomy for loading and running programs.

use std::fmt;

use crate::instruction::Instruction;

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Open,
    Close,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Open => write!(f, "'['"),
            BracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Errors raised by the loader. No partial program is returned alongside them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// A `]` with no open loop, or a `[` still open at the end of the source.
    #[error("Unmatched bracket {kind} at line {line}, column {column}")]
    UnbalancedBracket {
        kind: BracketKind,
        /// Character offset into the source text.
        offset: usize,
        line: usize,
        column: usize,
    },
}

impl LoadError {
    /// Character offset of the offending source character.
    pub fn offset(&self) -> usize {
        match self {
            LoadError::UnbalancedBracket { offset, .. } => *offset,
        }
    }
}

/// Errors that abort a run. The engine keeps the state of the failing step.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The data pointer would leave the tape under the `fail` bounds policy.
    #[error("Pointer out of bounds at instruction {ip} (dp={dp}, op='{op}')")]
    OutOfBounds { ip: usize, dp: usize, op: Instruction },

    /// The input source or output sink failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: std::io::Error,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: u64 },

    /// Execution aborted due to cooperative cancellation (e.g., timeout or Ctrl+C).
    #[error("Execution aborted: cancelled")]
    Canceled,
}

/// Configuration problems, reported with the offending key.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: &'static str,
    },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Any error the crate can produce.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

//! The eight instructions of the language.

use std::fmt;

/// One significant source character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `>`
    IncPtr,
    /// `<`
    DecPtr,
    /// `+`
    IncByte,
    /// `-`
    DecByte,
    /// `.`
    Output,
    /// `,`
    Input,
    /// `[`
    LoopOpen,
    /// `]`
    LoopClose,
}

impl Instruction {
    /// All instructions, in the order the statistics report them.
    pub const ALL: [Instruction; 8] = [
        Instruction::IncPtr,
        Instruction::DecPtr,
        Instruction::IncByte,
        Instruction::DecByte,
        Instruction::Output,
        Instruction::Input,
        Instruction::LoopOpen,
        Instruction::LoopClose,
    ];

    /// Decode a source character. Anything that is not an instruction is a comment.
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '>' => Some(Instruction::IncPtr),
            '<' => Some(Instruction::DecPtr),
            '+' => Some(Instruction::IncByte),
            '-' => Some(Instruction::DecByte),
            '.' => Some(Instruction::Output),
            ',' => Some(Instruction::Input),
            '[' => Some(Instruction::LoopOpen),
            ']' => Some(Instruction::LoopClose),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Instruction::IncPtr => '>',
            Instruction::DecPtr => '<',
            Instruction::IncByte => '+',
            Instruction::DecByte => '-',
            Instruction::Output => '.',
            Instruction::Input => ',',
            Instruction::LoopOpen => '[',
            Instruction::LoopClose => ']',
        }
    }

    /// Position of this instruction in [`Instruction::ALL`].
    pub(crate) fn index(self) -> usize {
        match self {
            Instruction::IncPtr => 0,
            Instruction::DecPtr => 1,
            Instruction::IncByte => 2,
            Instruction::DecByte => 3,
            Instruction::Output => 4,
            Instruction::Input => 5,
            Instruction::LoopOpen => 6,
            Instruction::LoopClose => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Instruction::IncPtr => "inc_dpointer",
            Instruction::DecPtr => "dec_dpointer",
            Instruction::IncByte => "inc_dbyte",
            Instruction::DecByte => "dec_dbyte",
            Instruction::Output => "out_dbyte",
            Instruction::Input => "in_dbyte",
            Instruction::LoopOpen => "jzf_block",
            Instruction::LoopClose => "jzb_block",
        }
    }

    /// One-line description shown by `bfvm check`.
    pub fn help(self) -> &'static str {
        match self {
            Instruction::IncPtr => "Move the data pointer one cell to the right.",
            Instruction::DecPtr => "Move the data pointer one cell to the left.",
            Instruction::IncByte => "Increment the byte at the data pointer (255 wraps to 0).",
            Instruction::DecByte => "Decrement the byte at the data pointer (0 wraps to 255).",
            Instruction::Output => "Output the byte at the data pointer.",
            Instruction::Input => "Read one byte of input into the current cell (0 at end of input).",
            Instruction::LoopOpen => "If the current cell is zero, jump past the matching ']'.",
            Instruction::LoopClose => "If the current cell is nonzero, jump back past the matching '['.",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Render a clean instruction sequence back to its characters.
pub fn to_source(code: &[Instruction]) -> String {
    code.iter().map(|i| i.as_char()).collect()
}

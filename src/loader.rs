//! Loader/validator: turns source text into a [`Program`].
//!
//! A single left-to-right scan drops comment characters, collects the clean
//! instruction sequence, counts every character class, tracks the maximum
//! loop nesting depth and pairs brackets. An unmatched `]` fails the scan
//! immediately; unmatched `[` are reported once the scan is complete.
//!
//! The resulting [`BracketTable`] gives the engine constant-time jumps, so
//! the engine never looks at source text again.

use crate::error::{BracketKind, LoadError};
use crate::instruction::{self, Instruction};

/// Knobs for the loader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Comment character that marks a trace point (conventionally `#`).
    pub trace_marker: Option<char>,
}

impl LoadOptions {
    pub fn with_trace_marker(marker: char) -> Self {
        Self { trace_marker: Some(marker) }
    }
}

/// Per-character statistics gathered during the scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeStats {
    counts: [usize; 8],
    /// Number of non-instruction characters, trace markers included.
    pub comments: usize,
    /// Number of instruction characters.
    pub code: usize,
    /// Deepest simultaneous loop nesting.
    pub max_depth: usize,
}

impl CodeStats {
    pub fn count(&self, instr: Instruction) -> usize {
        self.counts[instr.index()]
    }

    fn record(&mut self, instr: Instruction) {
        self.counts[instr.index()] += 1;
        self.code += 1;
    }
}

/// Matching partner for every bracket in the clean instruction sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BracketTable {
    // partners[i] holds the matching index for '[' or ']' at i; None elsewhere.
    partners: Vec<Option<usize>>,
    pairs: usize,
}

impl BracketTable {
    fn with_len(len: usize) -> Self {
        Self { partners: vec![None; len], pairs: 0 }
    }

    fn link(&mut self, open: usize, close: usize) {
        self.partners[open] = Some(close);
        self.partners[close] = Some(open);
        self.pairs += 1;
    }

    /// The structural partner of the bracket at `pos`.
    #[inline]
    pub fn partner(&self, pos: usize) -> Option<usize> {
        self.partners.get(pos).copied().flatten()
    }

    /// Number of matched loops, i.e. the count of `[` in the program.
    pub fn len(&self) -> usize {
        self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs == 0
    }

    /// `(open, close)` pairs in ascending order of the open position.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.partners
            .iter()
            .enumerate()
            .filter_map(|(pos, partner)| match partner {
                Some(close) if *close > pos => Some((pos, *close)),
                _ => None,
            })
    }
}

/// A validated program: immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    source: String,
    code: Vec<Instruction>,
    brackets: BracketTable,
    stats: CodeStats,
    markers: Vec<usize>,
    offsets: Vec<usize>,
}

struct OpenBracket {
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
}

impl Program {
    /// Load `source` with default options (no trace marker).
    pub fn load(source: impl Into<String>) -> Result<Self, LoadError> {
        load(source, LoadOptions::default())
    }

    /// The text the program was loaded from, comments included.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The clean instruction sequence.
    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn brackets(&self) -> &BracketTable {
        &self.brackets
    }

    pub fn stats(&self) -> &CodeStats {
        &self.stats
    }

    /// Instruction indices preceded by a trace marker, ascending.
    /// An index equal to [`Program::len`] marks the end of the program.
    pub fn markers(&self) -> &[usize] {
        &self.markers
    }

    pub fn is_marker(&self, ip: usize) -> bool {
        self.markers.binary_search(&ip).is_ok()
    }

    /// Character offset in [`Program::source`] of the instruction at `ip`.
    pub fn source_offset(&self, ip: usize) -> Option<usize> {
        self.offsets.get(ip).copied()
    }

    /// The clean instruction sequence as text.
    pub fn clean_source(&self) -> String {
        instruction::to_source(&self.code)
    }
}

/// Scan `source` once and produce a validated [`Program`].
pub fn load(source: impl Into<String>, options: LoadOptions) -> Result<Program, LoadError> {
    let source = source.into();

    let mut code = Vec::new();
    let mut offsets = Vec::new();
    let mut stats = CodeStats::default();
    let mut markers: Vec<usize> = Vec::new();
    let mut open: Vec<OpenBracket> = Vec::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    let (mut line, mut column) = (1usize, 1usize);

    for (offset, ch) in source.chars().enumerate() {
        match Instruction::from_char(ch) {
            Some(instr) => {
                let pos = code.len();
                stats.record(instr);
                code.push(instr);
                offsets.push(offset);

                match instr {
                    Instruction::LoopOpen => {
                        open.push(OpenBracket { pos, offset, line, column });
                        stats.max_depth = stats.max_depth.max(open.len());
                    }
                    Instruction::LoopClose => {
                        let Some(opener) = open.pop() else {
                            return Err(LoadError::UnbalancedBracket {
                                kind: BracketKind::Close,
                                offset,
                                line,
                                column,
                            });
                        };
                        pairs.push((opener.pos, pos));
                    }
                    _ => {}
                }
            }
            None => {
                stats.comments += 1;
                if options.trace_marker == Some(ch) && markers.last() != Some(&code.len()) {
                    markers.push(code.len());
                }
            }
        }

        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    // Report the innermost unclosed loop, it is the one nearest the end of the source.
    if let Some(opener) = open.pop() {
        return Err(LoadError::UnbalancedBracket {
            kind: BracketKind::Open,
            offset: opener.offset,
            line: opener.line,
            column: opener.column,
        });
    }

    let mut brackets = BracketTable::with_len(code.len());
    for (open_pos, close_pos) in pairs {
        brackets.link(open_pos, close_pos);
    }

    tracing::debug!(
        code = stats.code,
        comments = stats.comments,
        loops = brackets.len(),
        max_depth = stats.max_depth,
        markers = markers.len(),
        "program loaded"
    );

    Ok(Program { source, code, brackets, stats, markers, offsets })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_valid() {
        let program = Program::load("").expect("empty program loads");
        assert!(program.is_empty());
        assert!(program.brackets().is_empty());
        assert_eq!(program.stats(), &CodeStats::default());
    }

    #[test]
    fn comments_are_dropped_and_counted() {
        let program = Program::load("a+b\n-c").unwrap();
        assert_eq!(program.code(), &[Instruction::IncByte, Instruction::DecByte]);
        assert_eq!(program.stats().comments, 4);
        assert_eq!(program.stats().code, 2);
        assert_eq!(program.source(), "a+b\n-c");
    }

    #[test]
    fn only_comments_yield_zero_counts() {
        let program = Program::load("hello world\n").unwrap();
        assert!(program.is_empty());
        for instr in Instruction::ALL {
            assert_eq!(program.stats().count(instr), 0);
        }
        assert_eq!(program.stats().comments, 12);
    }

    #[test]
    fn counts_every_instruction() {
        let program = Program::load("><+-.,[]+++").unwrap();
        let stats = program.stats();
        assert_eq!(stats.count(Instruction::IncByte), 4);
        assert_eq!(stats.count(Instruction::IncPtr), 1);
        assert_eq!(stats.count(Instruction::LoopClose), 1);
        assert_eq!(stats.code, 11);
        assert_eq!(stats.comments, 0);
    }

    #[test]
    fn max_depth_tracks_deepest_nesting() {
        let program = Program::load("[[[]]][[]]").unwrap();
        assert_eq!(program.stats().max_depth, 3);
    }

    #[test]
    fn brackets_pair_structurally() {
        let program = Program::load("+[>[-]<]-[]").unwrap();
        let table = program.brackets();
        assert_eq!(table.len(), 3);
        assert_eq!(table.partner(1), Some(7));
        assert_eq!(table.partner(7), Some(1));
        assert_eq!(table.partner(3), Some(5));
        assert_eq!(table.partner(5), Some(3));
        assert_eq!(table.partner(9), Some(10));
        assert_eq!(table.partner(0), None);
        assert_eq!(table.pairs().collect::<Vec<_>>(), vec![(1, 7), (3, 5), (9, 10)]);
    }

    #[test]
    fn every_open_matches_a_later_close() {
        let program = Program::load("[[]][[[][]]]+[-[+]]").unwrap();
        let opens = program.stats().count(Instruction::LoopOpen);
        assert_eq!(program.brackets().len(), opens);
        for (open, close) in program.brackets().pairs() {
            assert!(close > open);
            assert_eq!(program.code()[open], Instruction::LoopOpen);
            assert_eq!(program.code()[close], Instruction::LoopClose);
        }
    }

    #[test]
    fn stray_close_fails_immediately() {
        let err = Program::load("+]\n[").unwrap_err();
        assert_eq!(
            err,
            LoadError::UnbalancedBracket { kind: BracketKind::Close, offset: 1, line: 1, column: 2 }
        );
    }

    #[test]
    fn unclosed_open_is_reported_with_position() {
        let err = Program::load("[]\n  [+").unwrap_err();
        assert_eq!(
            err,
            LoadError::UnbalancedBracket { kind: BracketKind::Open, offset: 5, line: 2, column: 3 }
        );
    }

    #[test]
    fn more_closes_than_opens_in_a_prefix_fails_even_if_totals_balance() {
        assert!(matches!(
            Program::load("][").unwrap_err(),
            LoadError::UnbalancedBracket { kind: BracketKind::Close, .. }
        ));
    }

    #[test]
    fn loading_is_deterministic() {
        let src = "++[>+<-]# comment\n>.";
        let opts = LoadOptions::with_trace_marker('#');
        let a = load(src, opts).unwrap();
        let b = load(src, opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn trace_markers_point_at_next_instruction() {
        let program = load("#+#-##.#", LoadOptions::with_trace_marker('#')).unwrap();
        assert_eq!(program.markers(), &[0, 1, 2, 3]);
        assert!(program.is_marker(3));
        // markers are still comments
        assert_eq!(program.stats().comments, 5);
    }

    #[test]
    fn markers_are_ignored_without_option() {
        let program = Program::load("#+#").unwrap();
        assert!(program.markers().is_empty());
        assert!(!program.is_marker(0));
    }

    #[test]
    fn source_offsets_map_back_to_original_text() {
        let program = Program::load("ab+ c-").unwrap();
        assert_eq!(program.source_offset(0), Some(2));
        assert_eq!(program.source_offset(1), Some(5));
        assert_eq!(program.source_offset(2), None);
        assert_eq!(program.clean_source(), "+-");
    }
}

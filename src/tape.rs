//! Fixed-length byte tape and the policy for pointer moves past its ends.

use std::fmt;
use std::str::FromStr;

/// Conventional tape length.
pub const DEFAULT_TAPE_LEN: usize = 30_000;

/// What happens when the data pointer would leave the tape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BoundsPolicy {
    /// Abort the run with an out-of-bounds error.
    #[default]
    Fail,
    /// Wrap around to the other end of the tape.
    Wrap,
    /// Stay on the first/last cell.
    Clamp,
}

impl FromStr for BoundsPolicy {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(BoundsPolicy::Fail),
            "wrap" => Ok(BoundsPolicy::Wrap),
            "clamp" => Ok(BoundsPolicy::Clamp),
            _ => Err("expected one of fail, wrap, clamp"),
        }
    }
}

impl fmt::Display for BoundsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundsPolicy::Fail => "fail",
            BoundsPolicy::Wrap => "wrap",
            BoundsPolicy::Clamp => "clamp",
        };
        f.write_str(name)
    }
}

/// Zero-initialized cells with wrapping byte arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
    policy: BoundsPolicy,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(DEFAULT_TAPE_LEN)
    }
}

impl Tape {
    /// A tape of `len` cells (at least one) using [`BoundsPolicy::Fail`].
    pub fn new(len: usize) -> Self {
        Self::with_policy(len, BoundsPolicy::Fail)
    }

    pub fn with_policy(len: usize, policy: BoundsPolicy) -> Self {
        Self {
            cells: vec![0; len.max(1)],
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: a tape has at least one cell.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Zero every cell, keeping length and policy.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn policy(&self) -> BoundsPolicy {
        self.policy
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, at: usize) -> u8 {
        self.cells[at]
    }

    #[inline]
    pub fn set(&mut self, at: usize, value: u8) {
        self.cells[at] = value;
    }

    #[inline]
    pub fn increment(&mut self, at: usize) -> u8 {
        let after = self.cells[at].wrapping_add(1);
        self.cells[at] = after;
        after
    }

    #[inline]
    pub fn decrement(&mut self, at: usize) -> u8 {
        let after = self.cells[at].wrapping_sub(1);
        self.cells[at] = after;
        after
    }

    /// Where `dp` lands after moving one cell right, or `None` if the policy forbids it.
    pub fn right_of(&self, dp: usize) -> Option<usize> {
        let last = self.cells.len() - 1;
        if dp < last {
            return Some(dp + 1);
        }
        match self.policy {
            BoundsPolicy::Fail => None,
            BoundsPolicy::Wrap => Some(0),
            BoundsPolicy::Clamp => Some(last),
        }
    }

    /// Where `dp` lands after moving one cell left, or `None` if the policy forbids it.
    pub fn left_of(&self, dp: usize) -> Option<usize> {
        if dp > 0 {
            return Some(dp - 1);
        }
        match self.policy {
            BoundsPolicy::Fail => None,
            BoundsPolicy::Wrap => Some(self.cells.len() - 1),
            BoundsPolicy::Clamp => Some(0),
        }
    }

    /// A page-aligned view of `size` cells containing `dp`.
    pub fn window(&self, dp: usize, size: usize) -> TapeWindow {
        let size = size.max(1);
        let base = dp - dp % size;
        let end = (base + size).min(self.cells.len());
        TapeWindow {
            base,
            dp,
            cells: self.cells[base..end].to_vec(),
        }
    }
}

/// A copy of part of the tape, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeWindow {
    /// Absolute index of `cells[0]`.
    pub base: usize,
    /// Absolute data pointer.
    pub dp: usize,
    pub cells: Vec<u8>,
}

impl TapeWindow {
    /// Offset of the data pointer inside `cells`, if it is visible.
    pub fn pointer_offset(&self) -> Option<usize> {
        self.dp
            .checked_sub(self.base)
            .filter(|offset| *offset < self.cells.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_start_at_zero() {
        let tape = Tape::new(8);
        assert_eq!(tape.cells(), &[0; 8]);
        assert_eq!(Tape::default().len(), DEFAULT_TAPE_LEN);
    }

    #[test]
    fn zero_length_is_raised_to_one_cell() {
        assert_eq!(Tape::new(0).len(), 1);
    }

    #[test]
    fn byte_arithmetic_wraps() {
        let mut tape = Tape::new(1);
        assert_eq!(tape.decrement(0), 255);
        assert_eq!(tape.increment(0), 0);
        tape.set(0, 255);
        assert_eq!(tape.increment(0), 0);
    }

    #[test]
    fn fail_policy_refuses_to_leave_the_tape() {
        let tape = Tape::new(3);
        assert_eq!(tape.left_of(0), None);
        assert_eq!(tape.right_of(2), None);
        assert_eq!(tape.right_of(1), Some(2));
    }

    #[test]
    fn wrap_policy_jumps_to_the_other_end() {
        let tape = Tape::with_policy(3, BoundsPolicy::Wrap);
        assert_eq!(tape.left_of(0), Some(2));
        assert_eq!(tape.right_of(2), Some(0));
    }

    #[test]
    fn clamp_policy_stays_put() {
        let tape = Tape::with_policy(3, BoundsPolicy::Clamp);
        assert_eq!(tape.left_of(0), Some(0));
        assert_eq!(tape.right_of(2), Some(2));
    }

    #[test]
    fn window_is_page_aligned_and_truncated_at_the_end() {
        let mut tape = Tape::new(10);
        tape.set(8, 42);
        let window = tape.window(8, 4);
        assert_eq!(window.base, 8);
        assert_eq!(window.cells, vec![42, 0]);
        assert_eq!(window.pointer_offset(), Some(0));

        let window = tape.window(5, 4);
        assert_eq!(window.base, 4);
        assert_eq!(window.pointer_offset(), Some(1));
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Wrap".parse::<BoundsPolicy>(), Ok(BoundsPolicy::Wrap));
        assert_eq!(" clamp ".parse::<BoundsPolicy>(), Ok(BoundsPolicy::Clamp));
        assert!("bounce".parse::<BoundsPolicy>().is_err());
        assert_eq!(BoundsPolicy::default().to_string(), "fail");
    }

    #[test]
    fn clear_zeroes_cells_only() {
        let mut tape = Tape::with_policy(3, BoundsPolicy::Clamp);
        tape.set(2, 9);
        tape.clear();
        assert_eq!(tape.cells(), &[0, 0, 0]);
        assert_eq!(tape.policy(), BoundsPolicy::Clamp);
        assert!(!Tape::new(0).is_empty());
    }
}

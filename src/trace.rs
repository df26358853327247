//! Step-trace hook and plain-text state views.
//!
//! Observers only look at the engine; they cannot change what it does.

use std::io::Write;

use crate::engine::Engine;
use crate::instruction::Instruction;

/// One executed instruction, with the state on either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// 1-based count of executed instructions.
    pub step: u64,
    pub ip: usize,
    pub instruction: Instruction,
    pub dp_before: usize,
    pub cell_before: u8,
    pub dp_after: usize,
    pub cell_after: u8,
    pub next_ip: usize,
}

impl StepEvent {
    /// Human-readable effect of the step.
    pub fn describe(&self) -> String {
        match self.instruction {
            Instruction::IncPtr | Instruction::DecPtr => {
                format!("Moved pointer head to index {}", self.dp_after)
            }
            Instruction::IncByte => format!(
                "Increment cell[{}] from {} to {}",
                self.dp_before, self.cell_before, self.cell_after
            ),
            Instruction::DecByte => format!(
                "Decrement cell[{}] from {} to {}",
                self.dp_before, self.cell_before, self.cell_after
            ),
            Instruction::Output => format!("Output byte {}", self.cell_before),
            Instruction::Input => format!("Read byte into cell[{}] -> {}", self.dp_after, self.cell_after),
            Instruction::LoopOpen if self.next_ip != self.ip + 1 => {
                format!("Cell is 0; jump forward past matching ']' to IP {}", self.next_ip)
            }
            Instruction::LoopOpen => "Enter loop (cell != 0)".to_string(),
            Instruction::LoopClose if self.next_ip != self.ip + 1 => {
                format!("Cell != 0; jump back past matching '[' to IP {}", self.next_ip)
            }
            Instruction::LoopClose => "Exit loop (cell is 0)".to_string(),
        }
    }
}

/// Receives engine events during [`Engine::run_observed`].
pub trait TraceObserver {
    /// Called after each executed instruction.
    fn on_step(&mut self, _engine: &Engine<'_>, _event: &StepEvent) {}

    /// Called when the instruction pointer arrives at a trace marker.
    fn on_marker(&mut self, _engine: &Engine<'_>) {}
}

/// No tracing.
impl TraceObserver for () {}

/// Writes a `STEP | IP | DP | CELL | INSTR | ACTION` table row per step.
pub struct TraceTable<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> TraceTable<W> {
    pub fn new(out: W) -> Self {
        Self { out, header_written: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "STEP | IP  | DP  | CELL | INSTR | ACTION")?;
        writeln!(
            self.out,
            "-----+-----+-----+------+-------+------------------------------------------------"
        )
    }

    fn write_row(&mut self, event: &StepEvent) -> std::io::Result<()> {
        if !self.header_written {
            self.write_header()?;
            self.header_written = true;
        }
        writeln!(
            self.out,
            "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
            event.step,
            event.ip,
            event.dp_before,
            event.cell_before,
            event.instruction,
            event.describe()
        )
    }
}

impl<W: Write> TraceObserver for TraceTable<W> {
    fn on_step(&mut self, _engine: &Engine<'_>, event: &StepEvent) {
        // A broken trace stream must not change how the program runs.
        if let Err(e) = self.write_row(event) {
            tracing::warn!(error = %e, "failed to write trace row");
        }
    }
}

/// Prints [`render_state`] to a writer at every trace marker.
pub struct MarkerDump<W: Write> {
    out: W,
}

impl<W: Write> MarkerDump<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> TraceObserver for MarkerDump<W> {
    fn on_marker(&mut self, engine: &Engine<'_>) {
        let dump = render_state(engine);
        if let Err(e) = self.out.write_all(dump.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write marker dump");
        }
    }
}

impl<T: TraceObserver> TraceObserver for Option<T> {
    fn on_step(&mut self, engine: &Engine<'_>, event: &StepEvent) {
        if let Some(inner) = self {
            inner.on_step(engine, event);
        }
    }

    fn on_marker(&mut self, engine: &Engine<'_>) {
        if let Some(inner) = self {
            inner.on_marker(engine);
        }
    }
}

/// Forwards every event to two observers.
pub struct Both<A, B>(pub A, pub B);

impl<A: TraceObserver, B: TraceObserver> TraceObserver for Both<A, B> {
    fn on_step(&mut self, engine: &Engine<'_>, event: &StepEvent) {
        self.0.on_step(engine, event);
        self.1.on_step(engine, event);
    }

    fn on_marker(&mut self, engine: &Engine<'_>) {
        self.0.on_marker(engine);
        self.1.on_marker(engine);
    }
}

/// Output cache as text, non-printable bytes escaped.
pub fn escape_output(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\n' => s.push_str("\\n"),
            b'\r' => s.push_str("\\r"),
            b'\t' => s.push_str("\\t"),
            0x20..=0x7e => s.push(b as char),
            _ => s.push_str(&format!("\\x{b:02X}")),
        }
    }
    s
}

/// Plain-text dump of output cache, pointers, code and the tape window.
///
/// ```text
/// Output (2 bytes): Hi
/// Instruction Pointer: 4, Data Pointer: 1
///
/// Code: ++>+.
/// IP:   ----|
///
/// Data:   2|  1|  0
/// DP:   --- |||  ---
/// ```
pub fn render_state(engine: &Engine<'_>) -> String {
    let output = engine.output();
    let code = engine.program().clean_source();
    let ip = engine.ip();
    let window = engine.window();

    let mut s = String::new();
    s.push_str(&format!("Output ({} bytes): {}\n", output.len(), escape_output(output)));
    s.push_str(&format!(
        "Instruction Pointer: {}, Data Pointer: {}\n\n",
        ip,
        engine.dp()
    ));
    s.push_str(&format!("Code: {code}\n"));
    s.push_str(&format!("IP:   {}|\n\n", "-".repeat(ip)));

    let cells: Vec<String> = window.cells.iter().map(|c| format!("{c:>3}")).collect();
    s.push_str(&format!("Data: {}\n", cells.join("|")));
    let marks: Vec<&str> = (0..window.cells.len())
        .map(|i| if Some(i) == window.pointer_offset() { "|||" } else { "---" })
        .collect();
    s.push_str(&format!("DP:   {}\n", marks.join(" ")));
    if window.base > 0 {
        s.push_str(&format!("      (cells from index {})\n", window.base));
    }
    s
}

//! Execution engine: an instruction-pointer/data-pointer state machine over a [`Tape`].
//!
//! An [`Engine`] is built fresh for every run and owns all mutable state of
//! that run (tape, pointers, output cache). It only ever reads the validated
//! [`Program`], so loops jump through the precomputed bracket table.
//!
//! Two ways to drive it:
//! - [`Engine::run`] / [`Engine::run_observed`] execute until the instruction
//!   pointer leaves the program.
//! - [`Engine::step`] executes one instruction and returns a [`Snapshot`];
//!   a caller may stop stepping at any time and inspect the engine.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::error::EngineError;
use crate::instruction::Instruction;
use crate::io::{self, ByteSink, ByteSource};
use crate::loader::Program;
use crate::tape::{Tape, TapeWindow};
use crate::trace::{StepEvent, TraceObserver};

/// Cells shown in a [`Snapshot`] unless configured otherwise.
pub const DEFAULT_WINDOW: usize = 30;

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone, Debug, Default)]
pub struct StepControl {
    pub max_steps: Option<u64>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<u64>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// State after a single step, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// The instruction that was executed, `None` if the engine had already halted.
    pub executed: Option<Instruction>,
    pub ip: usize,
    pub dp: usize,
    pub halted: bool,
    pub window: TapeWindow,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit {
    /// The cell under the data pointer when the program ended.
    pub value: u8,
    /// Every byte emitted by `.`, in order.
    pub output: Vec<u8>,
    pub steps: u64,
}

/// Runs one [`Program`] once.
pub struct Engine<'p> {
    program: &'p Program,
    tape: Tape,
    ip: usize,
    dp: usize,
    output: Vec<u8>,
    steps: u64,
    input: Box<dyn ByteSource + 'p>,
    sink: Box<dyn ByteSink + 'p>,
    control: Option<StepControl>,
    window_size: usize,
}

impl<'p> Engine<'p> {
    /// An engine with a default 30,000-cell tape that reads stdin and writes stdout.
    pub fn new(program: &'p Program) -> Self {
        Self::with_tape(program, Tape::default())
    }

    /// An engine using `tape`'s length and bounds policy. Its cells are zeroed,
    /// so every run starts on a fresh tape.
    pub fn with_tape(program: &'p Program, mut tape: Tape) -> Self {
        tape.clear();
        Self {
            program,
            tape,
            ip: 0,
            dp: 0,
            output: Vec::new(),
            steps: 0,
            input: Box::new(io::stdin()),
            sink: Box::new(io::stdout()),
            control: None,
            window_size: DEFAULT_WINDOW,
        }
    }

    /// Provide the source `,` reads from. End of input stores 0.
    pub fn set_input_source<S>(&mut self, source: S)
    where
        S: ByteSource + 'p,
    {
        self.input = Box::new(source);
    }

    /// Provide the sink `.` writes to, one byte per call.
    pub fn set_output_sink<S>(&mut self, sink: S)
    where
        S: ByteSink + 'p,
    {
        self.sink = Box::new(sink);
    }

    pub fn set_step_control(&mut self, control: StepControl) {
        self.control = Some(control);
    }

    /// Number of tape cells included in snapshots.
    pub fn set_window_size(&mut self, size: usize) {
        self.window_size = size.max(1);
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn dp(&self) -> usize {
        self.dp
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// The output cache.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn current_cell(&self) -> u8 {
        self.tape.get(self.dp)
    }

    pub fn is_halted(&self) -> bool {
        self.ip >= self.program.len()
    }

    /// True when the instruction pointer sits on a trace marker.
    pub fn at_marker(&self) -> bool {
        self.program.is_marker(self.ip)
    }

    /// The tape cells around the data pointer.
    pub fn window(&self) -> TapeWindow {
        self.tape.window(self.dp, self.window_size)
    }

    pub fn snapshot(&self, executed: Option<Instruction>) -> Snapshot {
        Snapshot {
            executed,
            ip: self.ip,
            dp: self.dp,
            halted: self.is_halted(),
            window: self.window(),
        }
    }

    /// Execute exactly one instruction. Stepping a halted engine is a no-op.
    pub fn step(&mut self) -> Result<Snapshot, EngineError> {
        if self.is_halted() {
            return Ok(self.snapshot(None));
        }
        self.check_control()?;
        let event = self.execute()?;
        if event.instruction == Instruction::Output || self.is_halted() {
            self.flush_sink()?;
        }
        Ok(self.snapshot(Some(event.instruction)))
    }

    /// Execute until the instruction pointer leaves the program.
    pub fn run(&mut self) -> Result<Exit, EngineError> {
        self.run_observed(&mut ())
    }

    /// Like [`Engine::run`], reporting every step and trace marker to `observer`.
    pub fn run_observed(&mut self, observer: &mut dyn TraceObserver) -> Result<Exit, EngineError> {
        let result = self.drive(observer);
        let flushed = self.flush_sink();
        result?;
        flushed?;

        tracing::debug!(steps = self.steps, output = self.output.len(), "run finished");
        Ok(Exit {
            value: self.current_cell(),
            output: self.output.clone(),
            steps: self.steps,
        })
    }

    fn drive(&mut self, observer: &mut dyn TraceObserver) -> Result<(), EngineError> {
        loop {
            if self.at_marker() {
                tracing::trace!(ip = self.ip, dp = self.dp, "trace marker reached");
                observer.on_marker(self);
            }
            if self.is_halted() {
                return Ok(());
            }
            self.check_control()?;
            let event = self.execute()?;
            observer.on_step(self, &event);
        }
    }

    fn check_control(&self) -> Result<(), EngineError> {
        let Some(ctrl) = self.control.as_ref() else {
            return Ok(());
        };
        // Cooperative cancellation check
        if ctrl.cancel_flag.load(Ordering::Relaxed) {
            return Err(EngineError::Canceled);
        }
        if let Some(limit) = ctrl.max_steps {
            if self.steps >= limit {
                return Err(EngineError::StepLimitExceeded { limit });
            }
        }
        Ok(())
    }

    fn flush_sink(&mut self) -> Result<(), EngineError> {
        self.sink
            .flush()
            .map_err(|source| EngineError::Io { ip: self.ip, source })
    }

    /// Apply the instruction at `ip`. On error nothing has changed.
    fn execute(&mut self) -> Result<StepEvent, EngineError> {
        let ip = self.ip;
        let instruction = self.program.code()[ip];
        let (dp_before, cell_before) = (self.dp, self.tape.get(self.dp));
        let mut next_ip = ip + 1;

        match instruction {
            Instruction::IncPtr | Instruction::DecPtr => {
                let moved = if instruction == Instruction::IncPtr {
                    self.tape.right_of(self.dp)
                } else {
                    self.tape.left_of(self.dp)
                };
                let Some(dp) = moved else {
                    return Err(EngineError::OutOfBounds { ip, dp: self.dp, op: instruction });
                };
                if dp.abs_diff(self.dp) != 1 {
                    tracing::trace!(ip, from = self.dp, to = dp, policy = %self.tape.policy(), "pointer kept on tape");
                }
                self.dp = dp;
            }
            Instruction::IncByte => {
                self.tape.increment(self.dp);
            }
            Instruction::DecByte => {
                self.tape.decrement(self.dp);
            }
            Instruction::Output => {
                let byte = self.tape.get(self.dp);
                self.sink
                    .write_byte(byte)
                    .map_err(|source| EngineError::Io { ip, source })?;
                self.output.push(byte);
            }
            Instruction::Input => {
                // Prompts written so far must be visible before we block.
                self.flush_sink()?;
                let byte = self
                    .input
                    .read_byte()
                    .map_err(|source| EngineError::Io { ip, source })?;
                self.tape.set(self.dp, byte.unwrap_or(0));
            }
            Instruction::LoopOpen => {
                if self.tape.get(self.dp) == 0 {
                    let close = self.program.brackets().partner(ip).expect("validated bracket");
                    next_ip = close + 1;
                }
            }
            Instruction::LoopClose => {
                if self.tape.get(self.dp) != 0 {
                    let open = self.program.brackets().partner(ip).expect("validated bracket");
                    next_ip = open + 1;
                }
            }
        }

        self.ip = next_ip;
        self.steps += 1;

        Ok(StepEvent {
            step: self.steps,
            ip,
            instruction,
            dp_before,
            cell_before,
            dp_after: self.dp,
            cell_after: self.tape.get(self.dp),
            next_ip,
        })
    }
}

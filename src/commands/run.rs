use clap::Args;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::cli_util::{print_engine_error, print_load_error};
use crate::config::Settings;
use crate::engine::{Engine, Exit, StepControl};
use crate::error::EngineError;
use crate::loader::{load, LoadOptions};
use crate::tape::{BoundsPolicy, Tape};
use crate::trace::{Both, MarkerDump, TraceTable};

/// How long a cancelled worker gets to flush its output before the process exits.
const CANCEL_GRACE: Duration = Duration::from_millis(500);

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Print a step-by-step table of operations to stderr while running
    #[arg(short = 't', long = "trace")]
    pub trace: bool,

    /// Treat the trace marker character as a breakpoint and dump state there
    #[arg(short = 'm', long = "markers")]
    pub markers: bool,

    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Wall-clock timeout in milliseconds, 0 to wait forever (fallback BFVM_TIMEOUT_MS; default 2_000)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback BFVM_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// Number of tape cells (fallback BFVM_TAPE_LEN; default 30_000)
    #[arg(long = "tape-len", value_name = "N")]
    pub tape_len: Option<usize>,

    /// What a pointer move past either end of the tape does
    #[arg(long = "bounds", value_enum, value_name = "POLICY")]
    pub bounds: Option<BoundsPolicy>,

    /// Exit with the final cell value instead of 0
    #[arg(long = "exit-with-value")]
    pub exit_with_value: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        trace,
        markers,
        file,
        code,
        timeout_ms,
        max_steps,
        tape_len,
        bounds,
        exit_with_value,
        ..
    } = args;

    let code_str = match super::read_code(program, file, code, usage_and_exit) {
        Ok(s) => s,
        Err(exit) => return exit,
    };

    // Resolve settings: flags -> env -> config file -> defaults
    let mut settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };
    if let Some(ms) = timeout_ms {
        settings.timeout_ms = ms;
    }
    if max_steps.is_some() {
        settings.max_steps = max_steps;
    }
    if let Some(len) = tape_len {
        if len == 0 {
            eprintln!("{program}: --tape-len must be at least 1");
            usage_and_exit(program, 2);
        }
        settings.tape_len = len;
    }
    if let Some(policy) = bounds {
        settings.bounds = policy;
    }

    let options = LoadOptions {
        trace_marker: markers.then_some(settings.trace_marker),
    };
    let loaded = match load(code_str.as_str(), options) {
        Ok(p) => Arc::new(p),
        Err(err) => {
            print_load_error(Some(program), &code_str, &err);
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // Execute on a worker thread with cooperative cancellation
    let cancel = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        let interrupted = interrupted.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::Relaxed);
            cancel.store(true, Ordering::Relaxed);
        }) {
            tracing::warn!(error = %e, "failed to set ctrl+c handler");
        }
    }

    let (tx, rx) = mpsc::channel::<Result<Exit, EngineError>>();
    let worker_program = loaded.clone();
    let ctrl = StepControl::new(settings.max_steps, cancel.clone());
    let tape = Tape::with_policy(settings.tape_len, settings.bounds);
    let window = settings.tape_window;

    thread::spawn(move || {
        let mut engine = Engine::with_tape(&worker_program, tape);
        engine.set_step_control(ctrl);
        engine.set_window_size(window);
        let mut observer = Both(
            trace.then(|| TraceTable::new(io::stderr())),
            markers.then(|| MarkerDump::new(io::stderr())),
        );
        let res = engine.run_observed(&mut observer);
        let _ = tx.send(res);
    });

    let timeout_ms = settings.timeout_ms;
    let received = if timeout_ms == 0 {
        rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected)
    } else {
        rx.recv_timeout(Duration::from_millis(timeout_ms))
    };

    let exit_code = match received {
        Ok(Ok(exit)) => {
            tracing::info!(value = exit.value, steps = exit.steps, "program finished");
            if exit_with_value { i32::from(exit.value) } else { 0 }
        }
        Ok(Err(EngineError::Canceled)) if interrupted.load(Ordering::Relaxed) => {
            eprintln!("Execution aborted: interrupted");
            let _ = io::stderr().flush();
            1
        }
        Ok(Err(EngineError::Canceled)) => {
            eprintln!("Execution aborted: wall-clock timeout exceeded ({timeout_ms} ms)");
            let _ = io::stderr().flush();
            1
        }
        Ok(Err(err @ EngineError::StepLimitExceeded { .. })) => {
            eprintln!("{err}");
            let _ = io::stderr().flush();
            1
        }
        Ok(Err(other)) => {
            print_engine_error(Some(program), &loaded, &other);
            let _ = io::stderr().flush();
            1
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            // The worker flushes its buffered stdout once it observes the flag.
            // It may instead be blocked reading stdin, so do not wait forever.
            let _ = rx.recv_timeout(CANCEL_GRACE);
            eprintln!("Execution aborted: wall-clock timeout exceeded ({timeout_ms} ms)");
            let _ = io::stderr().flush();
            1
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => 1,
    };

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [options] "<code>"
  {0} run [options] --file <PATH>

Options:
  --file,    -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --trace,   -t         Print a step-by-step table of operations to stderr
  --markers, -m         Dump the machine state to stderr at each trace marker ('#' by default)
  --timeout <MS>        Wall-clock timeout in milliseconds, 0 for none (default 2000)
  --max-steps <N>       Abort after N executed instructions
  --tape-len <N>        Number of tape cells (default 30000)
  --bounds <POLICY>     Pointer moves off the tape: fail (default), wrap or clamp
  --exit-with-value     Exit with the final cell value
  --help,    -h         Show this help

Notes:
- Input (`,`) reads a single byte from stdin; on EOF the current cell is set to 0.
- Any characters outside of Brainfuck's ><+-.,[] are comments.
- Environment: BFVM_TIMEOUT_MS, BFVM_MAX_STEPS, BFVM_TAPE_LEN, BFVM_BOUNDS, BFVM_CONFIG.

Examples:
- Load Brainfuck code from a file:
    {0} run --file ./program.bf
- Read bytes from a file as stdin (`,` will consume file input):
    {0} run ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

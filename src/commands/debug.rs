use clap::Args;
use std::fs;
use std::io::{self, IsTerminal, Write};

use crate::cli_util::print_load_error;
use crate::config::Settings;
use crate::debugger;
use crate::loader::{load, LoadOptions};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct DebugArgs {
    /// Bytes fed to `,` (end of input once exhausted)
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: Option<String>,

    /// Stop continuing at trace markers
    #[arg(short = 'm', long = "markers")]
    pub markers: bool,

    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: DebugArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let DebugArgs { input, markers, file, code, .. } = args;

    let code_str = match super::read_code(program, file, code, usage_and_exit) {
        Ok(s) => s,
        Err(exit) => return exit,
    };

    let input = match input {
        Some(path) => match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("{program}: failed to read input file: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        },
        None => Vec::new(),
    };

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let options = LoadOptions {
        trace_marker: markers.then_some(settings.trace_marker),
    };
    let loaded = match load(code_str.as_str(), options) {
        Ok(p) => p,
        Err(err) => {
            print_load_error(Some(program), &code_str, &err);
            let _ = io::stderr().flush();
            return 1;
        }
    };

    if !io::stdout().is_terminal() {
        eprintln!("{program}: the debugger needs an interactive terminal");
        let _ = io::stderr().flush();
        return 1;
    }

    match debugger::run(&loaded, settings, input) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{program}: terminal error: {e}");
            let _ = io::stderr().flush();
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} debug [--input <PATH>] [--markers|-m] "<code>"
  {0} debug [--input <PATH>] [--markers|-m] --file <PATH>

Options:
  --file,    -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --input,   -i <PATH>  Bytes fed to `,`; without it every read is end of input
  --markers, -m         Stop continuing at trace markers ('#' by default)
  --help,    -h         Show this help

Keys:
  Enter / Space / s   Execute one instruction
  c                   Continue until halt, error or marker (press again to pause)
  r                   Restart with a fresh tape
  q / Esc             Quit
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

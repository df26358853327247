use clap::Args;
use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use crate::cli_util::print_load_error;
use crate::config::Settings;
use crate::instruction::Instruction;
use crate::loader::{load, LoadOptions, Program};
use crate::theme;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct CheckArgs {
    /// Also list every matching bracket pair
    #[arg(short = 'b', long = "brackets")]
    pub brackets: bool,

    /// Also list trace marker positions
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

pub fn run(program: &str, args: CheckArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let CheckArgs { brackets, markers, file, code, .. } = args;

    let code_str = match super::read_code(program, file, code, usage_and_exit) {
        Ok(s) => s,
        Err(exit) => return exit,
    };

    let mut options = LoadOptions::default();
    if markers {
        match Settings::load() {
            Ok(settings) => options.trace_marker = Some(settings.trace_marker),
            Err(e) => {
                eprintln!("{program}: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
    }

    let loaded = match load(code_str.as_str(), options) {
        Ok(p) => p,
        Err(err) => {
            print_load_error(Some(program), &code_str, &err);
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let styled = io::stdout().is_terminal();
    let report = render_report(&loaded, brackets, markers, styled);
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(report.as_bytes());
    let _ = stdout.flush();
    0
}

/// Statistics listing for a loaded program.
pub fn render_report(loaded: &Program, brackets: bool, markers: bool, styled: bool) -> String {
    let heading = |s: &str| {
        if styled {
            theme::heading_style().paint(s).to_string()
        } else {
            s.to_string()
        }
    };
    let label = |s: &str| {
        if styled {
            theme::label_style().paint(s).to_string()
        } else {
            s.to_string()
        }
    };
    let stats = loaded.stats();
    let mut out = String::new();

    let _ = writeln!(out, "{}", heading("Program OK"));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", heading("Instructions:"));
    for instr in Instruction::ALL {
        let ch = if styled {
            theme::instruction_style(instr).paint(instr.as_char().to_string()).to_string()
        } else {
            instr.as_char().to_string()
        };
        let help = if styled {
            theme::dim_style().paint(instr.help()).to_string()
        } else {
            instr.help().to_string()
        };
        let _ = writeln!(out, "  {ch}  {:<13}{:>8}  {help}", instr.name(), stats.count(instr));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  {} {}", label("code:             "), stats.code);
    let _ = writeln!(out, "  {} {}", label("comments:         "), stats.comments);
    let _ = writeln!(out, "  {} {}", label("max bracket depth:"), stats.max_depth);

    if brackets {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", heading(&format!("Bracket pairs ({}):", loaded.brackets().len())));
        for (open, close) in loaded.brackets().pairs() {
            let _ = writeln!(out, "  {open:>6} [ .. ] {close}");
        }
    }

    if markers {
        let list: Vec<String> = loaded.markers().iter().map(|m| m.to_string()).collect();
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", heading(&format!("Trace markers ({}):", list.len())));
        if !list.is_empty() {
            let _ = writeln!(out, "  before instructions {}", list.join(", "));
        }
    }
    out
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} check [--brackets|-b] [--markers|-m] "<code>"
  {0} check [--brackets|-b] [--markers|-m] --file <PATH>

Options:
  --file,     -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --brackets, -b         Also list every matching bracket pair
  --markers,  -m         Also list trace marker positions
  --help,     -h         Show this help

Description:
  Validates the program without running it and prints code statistics:
  per-instruction counts, code and comment characters, and loop depth.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_counts_and_depth() {
        let program = Program::load("++[>[-]<] hi").unwrap();
        let report = render_report(&program, false, false, false);
        assert!(report.contains("inc_dbyte"));
        assert!(report.contains("  code:              9\n"));
        assert!(report.contains("  comments:          3\n"));
        assert!(report.contains("  max bracket depth: 2\n"));
        assert!(!report.contains("Bracket pairs"));
    }

    #[test]
    fn report_lists_bracket_pairs_and_markers() {
        let program = load("+#[>[-]<]", LoadOptions::with_trace_marker('#')).unwrap();
        let report = render_report(&program, true, true, false);
        assert!(report.contains("Bracket pairs (2):"), "{report}");
        assert!(report.contains("     1 [ .. ] 7\n"), "{report}");
        assert!(report.contains("     3 [ .. ] 5\n"), "{report}");
        assert!(report.contains("before instructions 1"), "{report}");
    }
}

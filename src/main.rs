use bfvm::commands::{check, debug, run};
use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run   [options] "<code>"       # Run Brainfuck code (args are concatenated)
  {0} run   [options] --file <PATH>  # Run Brainfuck code loaded from file
  {0} check [--brackets] "<code>"    # Validate code and print statistics
  {0} debug [--input <PATH>] "<code>"  # Step through code in an interactive debugger

Run "{0} <subcommand> --help" for more info.

Logging goes to stderr and is controlled by BFVM_LOG (default "warn").
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bfvm", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(run::RunArgs),
    Check(check::CheckArgs),
    Debug(debug::DebugArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("BFVM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_logging();

    let program = env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| String::from("bfvm"));

    // clap exits with status 2 on malformed arguments
    let cli = Cli::parse();

    let Some(command) = cli.command.filter(|_| !cli.help) else {
        print_top_usage_and_exit(&program, if cli.help { 0 } else { 2 });
    };

    let code = match command {
        Command::Run(args) => run::run(&program, args),
        Command::Check(args) => check::run(&program, args),
        Command::Debug(args) => debug::run(&program, args),
    };

    std::process::exit(code);
}

//! Command-line driver for the IPPcode22 interpreter (spec §6).
//!
//! Argument parsing is hand-rolled rather than built on a parser
//! crate: the contract here is narrower and shape-sensitive in a way
//! that doesn't map cleanly onto a declarative flag parser (exactly
//! one or exactly two positional-looking `--flag=value` arguments,
//! with `--help`/`--h` only legal alone) — see `original_source`'s
//! `handle_args`, which this mirrors. Everything downstream of
//! argument parsing (loading, executing, mapping errors to exit
//! codes) is a thin wire-up of the `ippcode22`/`ippcode22-xml` crates.

use std::io::Read as _;

use ippcode22::io::InputSource;
use ippcode22::{error, Interpreter, Result};

enum Action {
    Help,
    Run {
        source: Option<String>,
        input: Option<String>,
    },
}

fn parse_args(args: &[String]) -> Result<Action> {
    match args.len() {
        1 => {
            let arg = &args[0];
            if arg == "--help" || arg == "--h" {
                return Ok(Action::Help);
            }
            if let Some(path) = arg.strip_prefix("--source=") {
                return Ok(Action::Run {
                    source: Some(path.to_string()),
                    input: None,
                });
            }
            if let Some(path) = arg.strip_prefix("--input=") {
                return Ok(Action::Run {
                    source: None,
                    input: Some(path.to_string()),
                });
            }
            Err(error::params(format!("unrecognised argument '{arg}'")))
        }
        2 => {
            let mut source = None;
            let mut input = None;
            for arg in args {
                if let Some(path) = arg.strip_prefix("--source=") {
                    source = Some(path.to_string());
                } else if let Some(path) = arg.strip_prefix("--input=") {
                    input = Some(path.to_string());
                }
            }
            match (source, input) {
                (Some(source), Some(input)) => Ok(Action::Run {
                    source: Some(source),
                    input: Some(input),
                }),
                _ => Err(error::params(
                    "two arguments must be --source=PATH and --input=PATH",
                )),
            }
        }
        n => Err(error::params(format!(
            "expected --help, or --source=PATH and/or --input=PATH, got {n} arguments"
        ))),
    }
}

fn print_help() {
    println!("interpret --source=FILE | --input=FILE [--source=FILE | --input=FILE]");
    println!();
    println!("Executes an IPPcode22 program delivered as XML.");
    println!();
    println!("  --source=FILE   the XML program to execute (default: standard input)");
    println!("  --input=FILE    the input stream for READ (default: standard input)");
    println!("  --help, --h     print this message and exit");
    println!();
    println!("At least one of --source/--input must be given; if both are omitted");
    println!("the missing one defaults to standard input, but at least one flag is");
    println!("required on the command line.");
}

fn read_source(path: &Option<String>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| error::file_open(format!("cannot open source '{path}': {e}"))),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| error::file_open(format!("cannot read source from stdin: {e}")))?;
            Ok(buf)
        }
    }
}

fn open_input(path: &Option<String>) -> Result<Box<dyn InputSource>> {
    match path {
        Some(path) => ippcode22::io::file_source(path)
            .map(|src| Box::new(src) as Box<dyn InputSource>)
            .map_err(|e| error::file_open(format!("cannot open input '{path}': {e}"))),
        None => Ok(Box::new(ippcode22::io::stdin_source())),
    }
}

fn run(args: &[String]) -> Result<i32> {
    let action = parse_args(args)?;
    let (source, input) = match action {
        Action::Help => {
            print_help();
            return Ok(0);
        }
        Action::Run { source, input } => (source, input),
    };

    let xml_text = read_source(&source)?;
    let program = ippcode22_xml::load(&xml_text)?;
    let input_source = open_input(&input)?;

    log::debug!("loaded {} instructions", program.len());
    let mut interpreter = Interpreter::new(program, input_source)?;
    interpreter.run()
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let exit_code = match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}

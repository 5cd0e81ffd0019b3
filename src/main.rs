use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plc::environment::{PlcObject, Value};

/// Runs or translates a program written in the PLC language.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What to do with the parsed program.
    #[arg(short, long, value_enum, default_value_t = Backend::Interpreter)]
    backend: Backend,

    /// Evaluate without running the type checker first.
    #[arg(long)]
    skip_analysis: bool,

    /// Print the token list and stop.
    #[arg(long, conflicts_with = "ast")]
    tokens: bool,

    /// Print the syntax tree and stop.
    #[arg(long)]
    ast: bool,

    /// Program to read. Standard input is used when omitted.
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Interpreter,
    Generator,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let input = match &args.file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Reading stdin")?;
            buffer
        }
    };

    if args.tokens {
        for token in plc::tokenize(&input)? {
            println!("{token:?}");
        }
        return Ok(0);
    }

    let source = plc::parse(&input)?;
    if args.ast {
        println!("{source:#?}");
        return Ok(0);
    }

    match args.backend {
        Backend::Generator => {
            print!("{}", plc::generate(&source)?);
            Ok(0)
        }
        Backend::Interpreter => {
            if !args.skip_analysis {
                plc::analyze(&source)?;
            }
            let result = plc::interpret(&source, io::stdout().lock())?;
            info!(result = %result, "program finished");
            exit_code(&result)
        }
    }
}

/// Low 32 bits of the integer returned by `main`, or 0 for NIL.
fn exit_code(result: &PlcObject) -> Result<i32> {
    match &result.value {
        Value::Integer(value) => {
            let low = (value & &BigInt::from(u32::MAX)).to_u32().unwrap_or_default();
            Ok(low as i32)
        }
        Value::Nil => Ok(0),
        other => bail!("main returned {} instead of an Integer", other.kind_name()),
    }
}

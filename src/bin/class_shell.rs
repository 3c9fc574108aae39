//! Demo shell over a counter host
//!
//! # Usage
//!
//! ```bash
//! # Interactive shell
//! class_shell
//!
//! # One-shot command, result printed as JSON
//! class_shell --json tick 3
//!
//! # Replay a script without printing
//! class_shell --silent .read script.txt
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;

use class_shell::{
    init_tracing, Annotation, Param, Program, SessionRef, ShellConfig, Signature, Value,
};

#[derive(Parser)]
#[command(name = "class_shell")]
#[command(version)]
#[command(about = "Counter shell built with class-shell")]
struct Args {
    /// Shell config file (YAML)
    #[arg(long, short, env = "CLASS_SHELL_CONFIG")]
    config: Option<PathBuf>,

    /// Suppress all output of the shell
    #[arg(long, short)]
    silent: bool,

    /// Print the result of a one-shot command as JSON
    #[arg(long)]
    json: bool,

    /// Command to run once; starts the interactive shell when empty
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[derive(Debug, Default)]
struct Counter {
    count: i64,
}

fn counter_program(config: ShellConfig, silent: bool) -> Result<Rc<Program<Counter>>> {
    let factor = Signature::new()
        .with(Param::new("value").annotated(Annotation::int()).doc("added per tick"))
        .with(
            Param::new("allow_negative")
                .annotated(Annotation::choices([true]))
                .default(false),
        );

    let mut builder = Program::<Counter>::builder("counter")
        .version(env!("CARGO_PKG_VERSION"))
        .description("Counts ticks scaled by a factor")
        .config(config)
        .silent(silent);

    builder
        .setting("factor", factor.clone(), 1, true, |_, args| {
            Ok(Value::Int(args.int("value").unwrap_or(1)))
        })?
        .validate("factor", factor, |_, args| {
            let value = args.int("value").unwrap_or(0);
            if value < 0 && !args.bool("allow_negative").unwrap_or(false) {
                bail!("factor {} is negative, set allow_negative to true", value);
            }
            Ok(())
        })?
        .operation(
            "tick",
            Signature::new().with(Param::new("times").annotated(Annotation::int()).default(1)),
            |cli, args| {
                let factor = cli.setting("factor").and_then(Value::as_int).unwrap_or(1);
                let times = args.int("times").unwrap_or(1);
                cli.host_mut().count += factor * times;
                Ok(Value::Int(cli.host().count))
            },
        )?
        .operation("count", Signature::new(), |cli, _| {
            Ok(Value::Int(cli.host().count))
        })?
        .operation("reset", Signature::new(), |cli, _| {
            cli.host_mut().count = 0;
            Ok(Value::None)
        })?
        .operation(
            "label",
            Signature::new().varargs("words"),
            |cli, args| {
                let words: Vec<String> = args.extra().iter().map(ToString::to_string).collect();
                Ok(Value::from(format!("{}: {}", cli.host().count, words.join(" "))))
            },
        )?
        .delegate("child", true, |cli| {
            let child = cli.program().instantiate(Counter::default())?;
            Ok(SessionRef::new(child))
        })?;

    Ok(builder.build())
}

fn run(args: Args, config: ShellConfig) -> Result<()> {
    let program = counter_program(config, args.silent)?;
    let mut cli = program.instantiate(Counter::default())?;
    let result = cli.run(&args.command)?;
    if args.json {
        if let Some(value) = result {
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ShellConfig::load(path),
        None => ShellConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_tracing(&config) {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        return ExitCode::FAILURE;
    }

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

//! Quack compiler driver
//!
//! Reads a parsed program (JSON syntax tree), compiles it and writes one
//! `<Class>.asm` unit per class. Nothing is written unless the whole
//! compilation succeeds.

mod output;

use anyhow::Context;
use clap::{ArgAction, Parser};
use output::{resolve_color_choice, StyledOutput};
use quack_compiler::{CompileError, CompileOptions, Compiler};
use quack_syntax::{desugar, Program, DEFAULT_ENTRY_CLASS};
use quack_types::BuiltinTable;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "quackc")]
#[command(about = "Quack compiler: syntax tree to stack machine assembly", long_about = None)]
#[command(version)]
struct Cli {
    /// Syntax tree of the program, as JSON
    tree: PathBuf,
    /// Directory the .asm units are written to
    #[arg(default_value = ".")]
    out_dir: PathBuf,
    /// Name of the class wrapping the top-level statements
    #[arg(short, long, default_value = DEFAULT_ENTRY_CLASS)]
    name: String,
    /// Builtin descriptor table (JSON) replacing the embedded one
    #[arg(long)]
    builtins: Option<PathBuf>,
    /// Print the tree and stop: -t as read, -tt after desugaring
    #[arg(short = 't', long = "dump-tree", action = ArgAction::Count)]
    dump_tree: u8,
    /// Debug logging and full error detail
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut out = StyledOutput::new(resolve_color_choice());
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            out.error(&describe(&err));
            if cli.verbose {
                eprintln!("{:?}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let source = fs::read_to_string(&cli.tree)
        .with_context(|| format!("cannot read {}", cli.tree.display()))?;
    let program: Program = serde_json::from_str(&source)
        .with_context(|| format!("malformed syntax tree in {}", cli.tree.display()))?;

    match cli.dump_tree {
        0 => {}
        1 => return dump(&program),
        _ => return dump(&desugar(program, &cli.name)),
    }

    let builtins = load_builtins(cli.builtins.as_deref())?;
    let options = CompileOptions {
        entry_class: cli.name.clone(),
    };
    let classes = Compiler::new(&builtins, options).compile(program)?;

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("cannot create {}", cli.out_dir.display()))?;
    for class in &classes {
        let path = cli.out_dir.join(class.file_name());
        fs::write(&path, class.to_asm()).with_context(|| format!("cannot write {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn dump(program: &Program) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(program)?);
    Ok(())
}

fn load_builtins(path: Option<&Path>) -> anyhow::Result<BuiltinTable> {
    let table = match path {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            BuiltinTable::from_json(&source)?
        }
        None => BuiltinTable::standard()?,
    };
    Ok(table)
}

/// One-line message; compile errors get their source position in front.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<CompileError>() {
        Some(compile) => match compile.span() {
            Some(span) if span.line > 0 => format!("{}: {}", span, compile),
            _ => compile.to_string(),
        },
        None => format!("{:#}", err),
    }
}

use notescript::json::{self, JsonStyle};
use notescript::{CodegenOptions, CompileError, Compiler};

use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nsc")]
#[command(about = "Compile Notescript markup to HTML", long_about = None)]
#[command(version)]
struct Cli {
    /// Source file; reads stdin when omitted
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// What to print
    #[arg(long, value_enum, default_value_t = Emit::Html)]
    emit: Emit,

    /// Generation target
    #[arg(long, default_value = "html")]
    target: String,

    /// Prefix of generated class names
    #[arg(long, default_value = "ns-")]
    class_prefix: String,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Skip the bracket-balance check
    #[arg(long)]
    no_check: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    json_errors: bool,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Html,
    Ast,
    Tokens,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let input = match read_input(cli.input.as_ref()) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("nsc: {}", err);
            std::process::exit(2);
        }
    };

    match run(&cli, &input) {
        Ok(output) => println!("{}", output),
        Err(err) => {
            if cli.json_errors {
                eprintln!("{}", json::error_to_json(&err));
            } else {
                report(&input, &err);
            }
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn run(cli: &Cli, input: &str) -> Result<String, CompileError> {
    let mut compiler = Compiler::with_options(CodegenOptions {
        class_prefix: cli.class_prefix.clone(),
    });
    compiler.compile(input)?;
    if !cli.no_check {
        compiler.check()?;
    }

    let style = if cli.pretty {
        JsonStyle::Pretty
    } else {
        JsonStyle::Compact
    };

    match cli.emit {
        Emit::Html => compiler.generate(&cli.target),
        Emit::Ast => {
            let ast = compiler
                .ast()
                .ok_or_else(|| CompileError::codegen("no AST produced"))?;
            Ok(match style {
                JsonStyle::Pretty => json::root_to_json_pretty(ast),
                JsonStyle::Compact => json::root_to_json(ast),
            })
        }
        Emit::Tokens => Ok(json::tokens_to_json(
            compiler.tokens().unwrap_or_default(),
            style,
        )),
    }
}

/// Print the error with the offending source line and a caret under it.
/// Positions refer to the trimmed source, so lines are taken from it.
fn report(input: &str, err: &CompileError) {
    let position = match err.position() {
        Some(position) => position,
        None => {
            eprintln!("ERROR: {}", err);
            return;
        }
    };

    let source = input.trim().replace('\r', "");
    let lines: Vec<&str> = source.lines().collect();
    let line_text = lines.get(position.line.saturating_sub(1)).unwrap_or(&"");

    eprintln!("ERROR AT LINE {}:", position.line);
    eprintln!("{}", line_text);

    eprintln!("{}", caret_line(line_text, position.column));
    eprintln!("{}", err.message());
    eprintln!();
}

/// Blank out `line_text` up to `column`, keeping tabs so the caret lines up.
fn caret_line(line_text: &str, column: usize) -> String {
    let mut underline: String = line_text
        .chars()
        .take(column.saturating_sub(1))
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    while underline.chars().count() + 1 < column {
        underline.push(' ');
    }
    underline.push('^');
    underline
}

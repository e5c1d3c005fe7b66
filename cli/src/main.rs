use std::{
    error::Error,
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::exit,
};

use clap::Parser;
use console::style;
use lox_syntax::{diagnostics::Diagnostic, printers::AstPrinter, process, scan};

// Exit codes from sysexits.h
const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_IOERR: i32 = 74;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Scans and parses Lox expressions, printing the resulting syntax tree.
#[derive(Parser, Debug)]
#[command(name = "lox", version)]
struct Cli {
    /// Script to run. Starts an interactive prompt when omitted.
    script: Option<PathBuf>,

    /// Print the scanned tokens instead of the syntax tree.
    #[arg(long)]
    tokens: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            exit(EX_USAGE);
        }
        Err(err) => err.exit(),
    };

    match &cli.script {
        Some(path) => match run_file(path, cli.tokens) {
            Ok(true) => {}
            Ok(false) => exit(EX_DATAERR),
            Err(err) => {
                eprintln!(
                    "{}",
                    style(format!("{}: {}", path.display(), err))
                        .red()
                        .for_stderr()
                );
                exit(EX_IOERR);
            }
        },
        None => {
            if let Err(err) = run_prompt(cli.tokens) {
                eprintln!("{}", err);
                exit(EX_IOERR);
            }
        }
    }
}

/// Returns whether the script went through without diagnostics.
fn run_file(path: &Path, dump_tokens: bool) -> CliResult<bool> {
    let source = fs::read_to_string(path)?;
    Ok(run(&source, dump_tokens))
}

fn run_prompt(dump_tokens: bool) -> CliResult<()> {
    print!("> ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line {
            // Each line is a fresh run, so an error on one line does not
            // leak into the next
            Ok(line) => {
                run(&line, dump_tokens);
            }
            Err(_) => break,
        };

        print!("> ");
        io::stdout().flush()?;
    }

    Ok(())
}

fn run(source: &str, dump_tokens: bool) -> bool {
    if dump_tokens {
        let (tokens, diagnostics) = scan(source);
        for token in &tokens {
            println!("{}", token);
        }
        report(diagnostics.iter());
        return diagnostics.is_empty();
    }

    let processed = process(source);
    report(processed.diagnostics.iter());

    if let Some(expression) = &processed.expression {
        println!("{}", AstPrinter.print(expression));
    }

    !processed.had_error()
}

fn report<'a>(diagnostics: impl Iterator<Item = &'a Diagnostic>) {
    for diagnostic in diagnostics {
        eprintln!("{}", style(diagnostic).red().for_stderr());
    }
}

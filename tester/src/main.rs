use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead},
    path::{Path, PathBuf},
    process::{exit, Command},
};

use clap::Parser;
use console::{style, Term};
use glob::glob;
use regex::Regex;

/// Runs every sample script through the `lox` binary and checks its output
/// against the expectations written in the script's comments.
#[derive(Parser, Debug)]
#[command(name = "lox-tester")]
struct Args {
    /// Only run samples whose path, relative to the samples directory,
    /// starts with this prefix.
    #[arg(short, long)]
    filter: Option<String>,

    /// Directory holding the `.lox` samples.
    #[arg(long, default_value = "samples")]
    samples: PathBuf,

    /// Binary under test.
    #[arg(long, default_value = "./target/release/lox")]
    interpreter: PathBuf,
}

struct ExpectedOutput {
    line: usize,
    output: String,
}

impl ExpectedOutput {
    pub fn new(line: usize, output: String) -> Self {
        ExpectedOutput { line, output }
    }
}

struct Patterns {
    expected_output: Regex,
    expected_error_at_line: Regex,
    expected_error: Regex,
    syntax_error: Regex,
    non_test: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Patterns {
            expected_output: Regex::new(r"// expect: ?(.*)")?,
            expected_error_at_line: Regex::new(r"// (\[line \d+\] Error.*)")?,
            expected_error: Regex::new(r"// (Error.*)")?,
            syntax_error: Regex::new(r"^\[line \d+\] Error.*")?,
            non_test: Regex::new(r"// nontest")?,
        })
    }
}

struct Test {
    path: String,
    expected_output: Vec<ExpectedOutput>,
    expected_errors: HashSet<String>,
    expected_exit_code: i32,
    expectations: u32,
}

impl Test {
    fn new(path: String) -> Self {
        Test {
            path,
            expected_output: Vec::new(),
            expected_errors: HashSet::new(),
            expected_exit_code: 0,
            expectations: 0,
        }
    }

    /// Reads the expectations out of the sample. Returns false for files
    /// that are not tests at all.
    fn parse(&mut self, patterns: &Patterns) -> io::Result<bool> {
        for (line_num, line) in read_lines(&self.path)?.enumerate() {
            let line = line?;

            if patterns.non_test.is_match(&line) {
                return Ok(false);
            }

            if let Some(output) = capture(&patterns.expected_output, &line) {
                self.expected_output
                    .push(ExpectedOutput::new(line_num + 1, output));
                self.expectations += 1;
                continue;
            }

            if let Some(error) = capture(&patterns.expected_error_at_line, &line) {
                self.expect_error(error);
                continue;
            }

            if let Some(error) = capture(&patterns.expected_error, &line) {
                self.expect_error(format!("[line {}] {}", line_num + 1, error));
                continue;
            }
        }

        Ok(true)
    }

    fn expect_error(&mut self, error: String) {
        self.expected_errors.insert(error);
        self.expected_exit_code = 65;
        self.expectations += 1;
    }

    fn run(&self, interpreter: &Path, patterns: &Patterns) -> io::Result<Vec<String>> {
        let mut failures = Vec::new();

        let result = Command::new(interpreter).arg(&self.path).output()?;

        // Validate errors
        let mut found_errors = HashSet::new();
        let mut unexpected_count = 0;
        for line in result.stderr.lines() {
            let line = line?;
            if patterns.syntax_error.is_match(&line) && self.expected_errors.contains(&line) {
                found_errors.insert(line);
            } else if !line.is_empty() {
                if unexpected_count < 10 {
                    failures.push(format!("Unexpected output on stderr: {}", line));
                }
                unexpected_count += 1;
            }
        }
        if unexpected_count > 10 {
            failures.push(format!("(truncated {} more...)", unexpected_count - 10));
        }

        let mut missing: Vec<&String> = self.expected_errors.difference(&found_errors).collect();
        missing.sort();
        for error in missing {
            failures.push(format!("Missing expected error: {}", error));
        }

        // Validate exit code
        match result.status.code() {
            Some(code) if code == self.expected_exit_code => {}
            code => failures.push(format!(
                "Expected return code {} and got {:?}.",
                self.expected_exit_code, code
            )),
        }

        // Validate output
        let output_lines = result.stdout.lines().collect::<io::Result<Vec<_>>>()?;
        for (index, line) in output_lines.iter().enumerate() {
            match self.expected_output.get(index) {
                None => failures.push(format!("Got output '{}' when none was expected.", line)),
                Some(expected) if &expected.output != line => failures.push(format!(
                    "Expected output '{}' on line {} and got '{}'.",
                    expected.output, expected.line, line
                )),
                Some(_) => {}
            }
        }
        for expected in self.expected_output.iter().skip(output_lines.len()) {
            failures.push(format!(
                "Missing expected output '{}' on line {}.",
                expected.output, expected.line
            ));
        }

        Ok(failures)
    }
}

struct Tester {
    args: Args,
    patterns: Patterns,
    passed: u32,
    failed: u32,
    skipped: u32,
    expectations: u32,
}

impl Tester {
    fn new(args: Args, patterns: Patterns) -> Self {
        Tester {
            args,
            patterns,
            passed: 0,
            failed: 0,
            skipped: 0,
            expectations: 0,
        }
    }

    fn run_suite(&mut self) -> io::Result<bool> {
        let term = Term::stdout();
        let pattern = self.args.samples.join("**").join("*.lox");

        let paths = glob(&pattern.to_string_lossy())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        for path in paths {
            let path = path.map_err(|err| err.into_error())?;
            self.run_test(&term, &path)?;
        }

        if self.failed == 0 {
            println!(
                "All {} tests passed ({} expectations).",
                style(self.passed).green(),
                self.expectations
            );
        } else {
            println!(
                "{} tests passed. {} tests failed.",
                style(self.passed).green(),
                style(self.failed).red()
            );
        }

        Ok(self.failed == 0)
    }

    fn run_test(&mut self, term: &Term, path: &Path) -> io::Result<()> {
        // Check if we are just running a subset of the tests.
        if let Some(filter) = &self.args.filter {
            let relative = pathdiff::diff_paths(path, &self.args.samples)
                .unwrap_or_else(|| path.to_path_buf());
            if !relative.to_string_lossy().starts_with(filter.as_str()) {
                return Ok(());
            }
        }

        let display = path.display().to_string();
        term.write_line(&format!(
            "Passed: {} Failed: {} Skipped: {} ({})",
            style(self.passed).green(),
            style(self.failed).red(),
            style(self.skipped).yellow(),
            style(&display)
        ))?;

        let mut test = Test::new(display.clone());
        let is_test = test.parse(&self.patterns)?;
        let failures = if is_test {
            test.run(&self.args.interpreter, &self.patterns)?
        } else {
            Vec::new()
        };
        term.clear_last_lines(1)?;

        if !is_test {
            self.skipped += 1;
            return Ok(());
        }
        self.expectations += test.expectations;

        if failures.is_empty() {
            self.passed += 1;
        } else {
            self.failed += 1;
            println!("{}: {}", style("FAIL").red(), display);
            println!();
            for failure in &failures {
                println!("\t{}", style(failure).blue());
            }
            println!();
        }

        Ok(())
    }
}

fn main() {
    let args = Args::parse();

    let patterns = match Patterns::new() {
        Ok(patterns) => patterns,
        Err(err) => {
            eprintln!("{}: {}", style("TEST ERROR").magenta(), err);
            exit(2);
        }
    };

    let mut tester = Tester::new(args, patterns);
    match tester.run_suite() {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(err) => {
            eprintln!("{}: {}", style("TEST ERROR").magenta(), err);
            exit(2);
        }
    }
}

fn capture(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|matched| matched.as_str().to_string())
}

// Returns an Iterator to the Reader of the lines of the file.
fn read_lines<P>(filename: P) -> io::Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}

//! `grade`: run a comparative grading suite and print the report.

mod demo;
mod exit_codes;
mod logging;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use grade_tester::{GradeConfig, Report, Tester};

#[derive(Parser)]
#[command(name = "grade", version, about = "Comparative grading against a reference implementation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grade a bundled submission of the `foo` assignment.
    Demo {
        /// Which submission to grade.
        #[arg(long, value_enum, default_value_t = StudentChoice::Buggy)]
        student: StudentChoice,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// TOML file with `[report]` and `[ecf]` settings.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StudentChoice {
    Buggy,
    Correct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(exit_codes::SUITE_ERROR);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Demo {
            student,
            format,
            config,
        } => cmd_demo(student, format, config),
    }
}

fn cmd_demo(student: StudentChoice, format: Format, config: Option<PathBuf>) -> Result<i32> {
    let config = match config {
        Some(path) => GradeConfig::load(&path).with_context(|| format!("load config {}", path.display()))?,
        None => GradeConfig::default(),
    };
    let student = match student {
        StudentChoice::Buggy => demo::buggy_student(),
        StudentChoice::Correct => demo::correct_student(),
    };

    let tester = Tester::new(demo::master(), student).with_config(config);
    let report = tester.run(&demo::suite()).context("suite aborted")?;

    print_report(&report, format, tester.config())?;
    Ok(if report.all_passed() {
        exit_codes::PASSED
    } else {
        exit_codes::FAILED
    })
}

fn print_report(report: &Report, format: Format, config: &GradeConfig) -> Result<()> {
    match format {
        Format::Text => print!("{}", report.render(&config.report)),
        Format::Json => {
            let json = serde_json::to_string_pretty(report).context("serialize report")?;
            println!("{json}");
        }
    }
    Ok(())
}

//! sheetgrep CLI - search Excel files for a pattern

mod report;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Command, CommandFactory, FromArgMatches, Parser};
use log::debug;
use sheetgrep::{SearchConfig, SheetGrep, SPREADSHEET_EXTENSIONS};

use report::MemoryUsage;

#[derive(Parser, Debug)]
#[command(name = "sheetgrep", disable_version_flag = true)]
struct Cli {
    /// Match formula cells against their calculated result instead of the formula
    #[arg(short = 'f', long)]
    formula_result: bool,

    /// Ignore case distinctions in PATTERN
    #[arg(short, long)]
    ignore_case: bool,

    /// Treat PATTERN as literal text instead of a regular expression
    #[arg(short, long)]
    literal: bool,

    /// Search files in parallel
    #[arg(short, long)]
    parallel: bool,

    /// Search directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Print a result summary after the matches
    #[arg(short, long)]
    summary: bool,

    /// Print version information and exit
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    version: bool,

    /// Regular expression to search for
    #[arg(value_name = "PATTERN", required_unless_present = "version")]
    pattern: Option<String>,

    /// Excel files or directories to search
    #[arg(
        value_name = "FILE",
        required_unless_present = "version",
        value_parser = existing_path
    )]
    paths: Vec<PathBuf>,
}

impl Cli {
    fn config(&self) -> SearchConfig {
        SearchConfig {
            ignore_case: self.ignore_case,
            literal: self.literal,
            match_formula_result: self.formula_result,
            recursive: self.recursive,
            parallel: self.parallel,
        }
    }
}

fn existing_path(arg: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(arg);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("No such file or directory \"{}\"", arg))
    }
}

fn about_text() -> String {
    let extensions: Vec<String> = SPREADSHEET_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect();
    format!(
        "Search for PATTERN in each Excel FILE. ({})",
        extensions.join(", ")
    )
}

fn command() -> Command {
    Cli::command().about(about_text())
}

/// Parse arguments, or report why not. `Err` carries the exit code.
fn parse_args<I, T>(args: I) -> std::result::Result<Cli, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let mut cmd = command();
    let parsed = cmd
        .try_get_matches_from_mut(args)
        .and_then(|matches| Cli::from_arg_matches(&matches));

    match parsed {
        Ok(cli) => Ok(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp) => {
            let _ = err.print();
            Err(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", err);
            let _ = cmd.write_long_help(&mut io::stderr());
            Err(ExitCode::from(1))
        }
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return Ok(code),
    };
    debug!("arguments: {:?}", cli);

    if cli.version {
        println!("sheetgrep version {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    run(&cli)?;
    Ok(ExitCode::SUCCESS)
}

fn run(cli: &Cli) -> Result<()> {
    let pattern = cli.pattern.as_deref().unwrap_or_default();

    let start = Instant::now();
    let summary = SheetGrep::new(cli.config())
        .search(pattern, &cli.paths)
        .with_context(|| format!("Search for '{}' failed", pattern))?;
    let running_time = start.elapsed();
    let memory = MemoryUsage::current();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.summary {
        writeln!(out, "{}", report::RESULT_HEADER)?;
    }
    report::write_matches(&mut out, &summary)?;
    if cli.summary {
        report::write_summary(&mut out, &summary, running_time, memory)?;
    }

    out.flush().context("Failed to write results")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_about_lists_extensions() {
        assert_eq!(
            about_text(),
            "Search for PATTERN in each Excel FILE. (.xls, .xlsx, .xlsm, .xlt, .xltx)"
        );
    }

    #[test]
    fn test_flags_map_to_config() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap();

        let cli = parse_args(["sheetgrep", "-i", "-l", "-f", "-r", "-p", "-s", "a.b", dir]).unwrap();
        assert_eq!(
            cli.config(),
            SearchConfig {
                ignore_case: true,
                literal: true,
                match_formula_result: true,
                recursive: true,
                parallel: true,
            }
        );
        assert!(cli.summary);
        assert_eq!(cli.pattern.as_deref(), Some("a.b"));
        assert_eq!(cli.paths, vec![PathBuf::from(dir)]);

        let cli = parse_args(["sheetgrep", "--ignore-case", "--formula-result", "x", dir]).unwrap();
        assert!(cli.ignore_case && cli.formula_result && !cli.summary);
    }

    #[test]
    fn test_multiple_paths() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap();
        let cli = parse_args(["sheetgrep", "x", dir, dir]).unwrap();
        assert_eq!(cli.paths.len(), 2);
    }

    #[test]
    fn test_version_needs_no_arguments() {
        let cli = parse_args(["sheetgrep", "-v"]).unwrap();
        assert!(cli.version);
        assert!(cli.pattern.is_none());
    }

    #[test]
    fn test_missing_path_is_rejected() {
        assert!(parse_args(["sheetgrep", "x", "/definitely/not/here.xlsx"]).is_err());
        assert!(existing_path("/definitely/not/here.xlsx")
            .unwrap_err()
            .contains("No such file or directory \"/definitely/not/here.xlsx\""));
    }

    #[test]
    fn test_pattern_and_file_are_required() {
        assert!(parse_args(["sheetgrep"]).is_err());
        assert!(parse_args(["sheetgrep", "pattern"]).is_err());
    }
}

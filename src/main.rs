// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for cc2html.
//!
//! This binary provides the `cc2html` command for converting Claude Code
//! session logs from JSONL to standalone HTML pages.

use cc2html::{document, parser, renderer};
use lexopt::prelude::*;
use snafu::{OptionExt, ensure, prelude::*};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where to write the rendered output.
#[derive(Clone)]
enum OutputTarget {
    /// Next to each input file.
    Beside,
    /// Write each file to the specified directory.
    Directory(PathBuf),
    /// Write to stdout.
    Stdout,
}

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    input: Vec<PathBuf>,
    output: OutputTarget,
    show_thinking: bool,
    show_timing: bool,
    collapse_lines: usize,
    diff_collapse_lines: usize,
    quiet: bool,
    dry_run: bool,
    force: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("at least one input file or directory is required"))]
    NoInputFiles,

    #[snafu(display("no .jsonl files found in the given inputs"))]
    NoSessionFiles,

    #[snafu(display("cannot output multiple files to stdout"))]
    MultipleFilesToStdout,

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("invalid input filename: no file stem"))]
    InvalidFilename,

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert Claude Code session logs to standalone HTML

Usage: {name} [OPTIONS] <INPUT>...

Arguments:
  <INPUT>...  Input JSONL files or directories containing session logs

Options:
  -o, --output <OUTPUT>          Output directory, or - for stdout
                                 (default: next to each input)
      --collapse-lines <N>       Collapse tool output longer than N lines (default: 20)
      --diff-collapse-lines <N>  Collapse edit diffs longer than N lines (default: 10)

Content display (use --show-* or --hide-*):
      --show-thinking            Include thinking blocks, collapsed (default: off)
      --hide-thinking            Hide thinking blocks
      --show-timing              Include session timing in the header (default: on)
      --hide-timing              Hide session timing

Other options:
  -q, --quiet                    Suppress progress messages
  -n, --dry-run                  Show what would be processed without writing
  -f, --force                    Overwrite existing output files
  -h, --help                     Print help
  -V, --version                  Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_line_count(parser: &mut lexopt::Parser, option: &str) -> Result<usize, lexopt::Error> {
    let val = parser.value()?;
    val.parse()
        .map_err(|_| format!("{option} must be a non-negative number").into())
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let defaults = renderer::RenderOptions::default();
    let mut input = Vec::new();
    let mut output = OutputTarget::Beside;
    let mut show_thinking = !defaults.hide_thinking;
    let mut show_timing = defaults.show_timing;
    let mut collapse_lines = defaults.collapse_threshold_lines;
    let mut diff_collapse_lines = defaults.diff_collapse_threshold_lines;
    let mut quiet = false;
    let mut dry_run = false;
    let mut force = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => {
                let val: PathBuf = parser.value()?.parse()?;
                output = if val == Path::new("-") {
                    OutputTarget::Stdout
                } else {
                    OutputTarget::Directory(val)
                };
            }
            Long("collapse-lines") => {
                collapse_lines = parse_line_count(&mut parser, "collapse-lines")?;
            }
            Long("diff-collapse-lines") => {
                diff_collapse_lines = parse_line_count(&mut parser, "diff-collapse-lines")?;
            }
            // Show/hide flags - last one wins
            Long("show-thinking") => show_thinking = true,
            Long("hide-thinking") => show_thinking = false,
            Long("show-timing") => show_timing = true,
            Long("hide-timing") => show_timing = false,
            Short('q') | Long("quiet") => quiet = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output,
        show_thinking,
        show_timing,
        collapse_lines,
        diff_collapse_lines,
        quiet,
        dry_run,
        force,
    })
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;

    ensure!(!cli.input.is_empty(), NoInputFilesSnafu);

    // Collect all input files first
    let files = collect_input_files(&cli.input);
    ensure!(!files.is_empty(), NoSessionFilesSnafu);

    match &cli.output {
        OutputTarget::Stdout => {
            ensure!(files.len() == 1, MultipleFilesToStdoutSnafu);
            process_to_stdout(&files[0], &cli)?;
        }
        OutputTarget::Directory(dir) => {
            if !cli.dry_run {
                std::fs::create_dir_all(dir).context(CreateOutputDirSnafu)?;
            }
            for file in &files {
                let out_name = file.file_stem().context(InvalidFilenameSnafu)?;
                let out_path = dir.join(format!("{}.html", out_name.to_string_lossy()));
                process_file(file, &out_path, &cli)?;
            }
        }
        OutputTarget::Beside => {
            for file in &files {
                process_file(file, &file.with_extension("html"), &cli)?;
            }
        }
    }

    Ok(())
}

/// Collects all JSONL files from the given inputs (files and directories).
fn collect_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "jsonl"))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// Creates render options from CLI arguments.
#[allow(clippy::missing_const_for_fn)]
fn make_render_options(cli: &Cli) -> renderer::RenderOptions {
    renderer::RenderOptions {
        hide_thinking: !cli.show_thinking,
        collapse_threshold_lines: cli.collapse_lines,
        diff_collapse_threshold_lines: cli.diff_collapse_lines,
        show_timing: cli.show_timing,
    }
}

/// Reads, parses and renders one session log.
fn convert(input: &Path, cli: &Cli) -> Result<String, Error> {
    let session_id = input.file_stem().context(InvalidFilenameSnafu)?;
    let jsonl = std::fs::read_to_string(input).context(ReadFileSnafu { path: input })?;
    let session = parser::parse_session(&jsonl).context(ParseFileSnafu { path: input })?;

    Ok(document::render_session(
        &session_id.to_string_lossy(),
        &session,
        &make_render_options(cli),
        &document::Assets::bundled(),
    ))
}

/// Processes a single file and outputs to stdout.
fn process_to_stdout(input: &Path, cli: &Cli) -> Result<(), Error> {
    if cli.dry_run {
        eprintln!("Would output {}", input.display());
        return Ok(());
    }

    print!("{}", convert(input, cli)?);
    Ok(())
}

/// Processes a single file and writes the page to `out_path`.
fn process_file(input: &Path, out_path: &Path, cli: &Cli) -> Result<(), Error> {
    // Handle dry-run mode
    if cli.dry_run {
        eprintln!("Would write {}", out_path.display());
        return Ok(());
    }

    // Check if output exists and handle overwrite
    if out_path.exists() && !cli.force {
        eprintln!(
            "Skipping {} (already exists, use --force to overwrite)",
            out_path.display()
        );
        return Ok(());
    }

    let html = convert(input, cli)?;
    std::fs::write(out_path, &html).context(WriteFileSnafu { path: out_path })?;

    if !cli.quiet {
        eprintln!("Wrote {}", out_path.display());
    }
    Ok(())
}

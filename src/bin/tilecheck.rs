//! tilecheck command line
//!
//! `compare` diffs two assets, `validate` checks one. Either accepts directories, in which case every
//! content file beneath them is processed. Exit status is 0 when the files match or the assets pass,
//! 1 when they differ or validation fails, 2 when an input cannot be loaded.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::Serialize;

use tilecheck::config::{CheckConfig, DEFAULT_MODE};
use tilecheck::diff::{compare_dirs, compare_files, DiffReport, DirDiffReport, FileOutcome};
use tilecheck::validate::{
    validate_dir, validate_file, DirValidationReport, ValidationKind, ValidationOutcome, ValidationReport,
};

#[derive(Parser, Debug)]
#[command(name = "tilecheck")]
#[command(version, about = "Structural diff and validation for 3D Tiles and glTF assets", long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two files, or two directories file by file, and report structural differences
    Compare {
        file1: PathBuf,
        file2: PathBuf,

        /// Named comparison mode (strict, default, relaxed, or one from --config)
        #[arg(long, default_value = DEFAULT_MODE)]
        mode: String,

        /// JSON configuration defining extra modes
        #[arg(long)]
        config: Option<PathBuf>,

        /// Absolute float tolerance, overrides the mode
        #[arg(long)]
        tolerance: Option<f64>,

        /// Object keys to skip, added to the mode's list
        #[arg(long = "ignore", num_args = 1..)]
        ignore: Vec<String>,

        /// Report int/float mismatches as differences
        #[arg(long)]
        strict_types: bool,

        /// Also list floats that matched only within tolerance
        #[arg(long)]
        show_tolerance: bool,

        /// Write the JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a glTF, tileset or tile content file, or every such file in a directory
    Validate {
        file: PathBuf,

        /// Rule set; inferred from the file when omitted (always inferred for directories)
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Do not look for referenced content files on disk
        #[arg(long)]
        no_content_check: bool,

        /// JSON configuration providing the supported extension list
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Gltf,
    Tileset,
    Tile,
}

impl From<KindArg> for ValidationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Gltf => ValidationKind::GltfDocument,
            KindArg::Tileset => ValidationKind::TilesetDocument,
            KindArg::Tile => ValidationKind::TileContent,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args.command) {
        Ok(Status::Passed) => ExitCode::SUCCESS,
        Ok(Status::Failed) => ExitCode::from(1),
        Ok(Status::LoadFailed) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// Files matched or assets passed
    Passed,
    Failed,
    /// At least one file in a directory run could not be loaded
    LoadFailed,
}

impl Status {
    fn from_outcome(ok: bool, load_failures: usize) -> Self {
        match (ok, load_failures) {
            (_, n) if n > 0 => Status::LoadFailed,
            (true, _) => Status::Passed,
            (false, _) => Status::Failed,
        }
    }
}

fn run(command: Command) -> anyhow::Result<Status> {
    match command {
        Command::Compare {
            file1,
            file2,
            mode,
            config,
            tolerance,
            ignore,
            strict_types,
            show_tolerance,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let mut policy = config.policy(&mode)?;
            if let Some(tolerance) = tolerance {
                policy = policy.with_tolerance(tolerance)?;
            }
            policy = policy.ignore_fields(ignore)?.record_tolerance_diffs(show_tolerance);
            if strict_types {
                policy = policy.strict_types(true);
            }

            let ignored: Vec<&str> = policy.ignored_field_names().iter().map(String::as_str).collect();
            if !ignored.is_empty() {
                info!("ignoring fields: {}", ignored.join(", "));
            }

            if file1.is_dir() && file2.is_dir() {
                let report = compare_dirs(&file1, &file2, &policy)?;
                print_dir_diff(&report, show_tolerance);
                if let Some(path) = output {
                    write_report(&path, &report)?;
                }
                return Ok(Status::from_outcome(report.identical, report.failed()));
            }

            let report = compare_files(&file1, &file2, &policy)?;
            print_diff(&report, show_tolerance);
            if let Some(path) = output {
                write_report(&path, &report)?;
            }
            Ok(Status::from_outcome(report.identical, 0))
        }
        Command::Validate {
            file,
            kind,
            no_content_check,
            config,
            output,
        } => {
            let mut options = load_config(config.as_deref())?.validation_options();
            options.check_content_files = !no_content_check;

            if file.is_dir() {
                if kind.is_some() {
                    warn!("--kind is ignored for directories");
                }
                let report = validate_dir(&file, &options)?;
                print_dir_validation(&report);
                if let Some(path) = output {
                    write_report(&path, &report)?;
                }
                return Ok(Status::from_outcome(report.passed, report.failed()));
            }

            let report = validate_file(&file, kind.map(ValidationKind::from), &options)?;
            print_validation(&file.display().to_string(), &report);
            if let Some(path) = output {
                write_report(&path, &report)?;
            }
            Ok(Status::from_outcome(report.passed, 0))
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CheckConfig> {
    match path {
        Some(path) => CheckConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(CheckConfig::default()),
    }
}

fn write_report<T: Serialize>(path: &Path, report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))
}

fn print_diff(report: &DiffReport, show_tolerance: bool) {
    println!("{} vs {} ({}): {}", report.file1, report.file2, report.container_kind, report.summary());
    for item in &report.differences {
        match &item.message {
            Some(message) => println!("  {}: {}", item.full_path(), message),
            None => println!("  {}: {} != {}", item.full_path(), item.value1, item.value2),
        }
    }
    if show_tolerance {
        for item in &report.tolerance_diffs {
            println!("  ~ {}: {} ~ {}", item.full_path(), item.value1, item.value2);
        }
    }
}

fn print_dir_diff(report: &DirDiffReport, show_tolerance: bool) {
    println!("{} vs {}: {}", report.dir1, report.dir2, report.summary());
    for item in &report.unmatched {
        println!("  {}: {}", item.full_path(), item.message.as_deref().unwrap_or_default());
    }
    for file in &report.files {
        match &file.outcome {
            FileOutcome::Compared(diff) if diff.identical => {}
            FileOutcome::Compared(diff) => print_diff(diff, show_tolerance),
            FileOutcome::Failed(message) => println!("  {}: {}", file.path, message),
        }
    }
}

fn print_dir_validation(report: &DirValidationReport) {
    for file in &report.files {
        match &file.outcome {
            ValidationOutcome::Validated(validation) => print_validation(&file.path, validation),
            ValidationOutcome::Failed(message) => println!("{}: not loaded: {}", file.path, message),
        }
    }
    let status = if report.passed { "passed" } else { "FAILED" };
    println!(
        "{}: {} ({} file(s), {} error(s), {} warning(s), {} not loaded)",
        report.directory,
        status,
        report.files.len(),
        report.errors,
        report.warnings,
        report.failed()
    );
}

fn print_validation(file: &str, report: &ValidationReport) {
    let status = if report.passed { "passed" } else { "FAILED" };
    println!(
        "{}: {} ({} error(s), {} warning(s))",
        file,
        status,
        report.errors,
        report.warnings
    );
    for issue in &report.issues {
        println!("  {}", issue);
        if let Some(fix) = &issue.fix {
            println!("      fix: {}", fix);
        }
    }
}

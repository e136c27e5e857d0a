// Copyright (C) Brian G. Milnes 2025

//! Migrate a plugin tree from one framework API version to the next
//!
//! Order of work: discover, transform, back up, commit, report. Nothing is
//! written until the backup of the untouched tree has completed.
//!
//! Binary: apishift-migrate

use anyhow::{Context, Result};
use apishift::{Echo, MigrationSession, Report, RuleCatalog, SessionOptions, ToolConfig, run_tool};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "apishift-migrate")]
#[command(about = "Migrate a plugin tree to a new framework API version", long_about = None)]
struct Args {
    /// Plugin directory to migrate
    dir: Option<PathBuf>,

    /// Report what would change without taking a backup or writing files
    #[arg(long)]
    dry_run: bool,

    /// Write changes without taking a backup first
    #[arg(long)]
    no_backup: bool,

    /// Rule catalog JSON to use instead of the built-in one
    #[arg(short, long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Print the report as JSON on stdout (progress goes to stderr)
    #[arg(long)]
    json: bool,

    /// Also write the run log under logs/apishift-migrate/
    #[arg(long)]
    log: bool,

    /// Worker threads for the transform phase
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn load_catalog(rules: Option<&PathBuf>) -> Result<RuleCatalog> {
    match rules {
        Some(path) => RuleCatalog::from_file(path)
            .with_context(|| format!("Failed to load rule catalog {}", path.display())),
        None => RuleCatalog::builtin().context("Built-in rule catalog is invalid"),
    }
}

fn migrate(args: &Args, dir: &Path) -> Result<Report> {
    let catalog = load_catalog(args.rules.as_ref())?;
    let options = SessionOptions {
        dry_run: args.dry_run,
        backup: !args.no_backup,
        jobs: args.jobs,
        ..SessionOptions::default()
    };
    let session = MigrationSession::new(dir, catalog, options)?;

    let echo = if args.json { Echo::Stderr } else { Echo::Stdout };
    let config = ToolConfig::new("apishift-migrate", session.root().to_path_buf())
        .with_logging(args.log)
        .with_echo(echo);

    let json = args.json;
    let report = run_tool(config, |logger| {
        let report = session.run(logger)?;
        if !json {
            logger.log("");
            logger.log(&report.to_text());
        }
        Ok(report)
    })?;

    if args.json {
        println!("{}", report.to_json()?);
    }
    Ok(report)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let Some(dir) = args.dir.clone() else {
        eprintln!("Usage: apishift-migrate <plugin_directory> [--dry-run] [--no-backup] [--rules FILE] [--json] [--log] [-j N]");
        return ExitCode::from(1);
    };

    match migrate(&args, &dir) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            eprintln!("Error: {} file(s) could not be written", report.write_failures.len());
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

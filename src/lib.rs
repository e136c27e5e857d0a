// Copyright (C) Brian G. Milnes 2025

//! Apishift - rule-driven migration of plugin trees between framework API versions
//!
//! A session walks a plugin directory, rewrites its config file, source files
//! and dependency manifest with a catalog of literal and regex rules, records
//! every change in memory, snapshots the untouched tree and only then writes.
//! All rewriting is text substitution; nothing here parses the source language.

pub mod error;
pub mod rules;
pub mod warnings;
pub mod config_doc;
pub mod transformer;
pub mod change_set;
pub mod backup;
pub mod walker;
pub mod session;
pub mod report;
pub mod logging;
pub mod tool_runner;

// Re-export commonly used items
pub use error::error::{MigrationError, Result};
pub use rules::rules::{Rule, RuleCatalog, RuleKind, DetectorKind, DetectorRule};
pub use warnings::warnings::{Warning, WarningDetector, WarningSource};
pub use config_doc::config_doc::PluginDescription;
pub use transformer::transformer::{FileTransformer, Transformed};
pub use change_set::change_set::{Change, ChangeSet, CommitOutcome, FileKind, FileWriter, FsWriter, WriteFailure};
pub use backup::backup::{BackupManager, Snapshot, backup_path_for};
pub use walker::walker::{find_files_with_extensions, walk_files, FileScan, WalkFailure};
pub use session::session::{MigrationSession, Phase, SessionOptions};
pub use report::report::{BackupSkip, Report};
pub use logging::logging::{Echo, ToolLogger};
pub use tool_runner::tool_runner::{RunSummary, ToolConfig, run_tool};

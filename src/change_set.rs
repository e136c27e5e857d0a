// Copyright (C) Brian G. Milnes 2025

//! Change set: every pending rewrite, held in memory until commit
//!
//! Nothing in a session writes a migrated file except `ChangeSet::commit`.
//! Commit is best-effort per file: a failed write is recorded and the batch
//! carries on. There is no rollback of files already written.

pub mod change_set {
    use std::fmt;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    use serde::Serialize;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum FileKind {
        Config,
        Source,
        DependencyManifest,
    }

    impl fmt::Display for FileKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let name = match self {
                FileKind::Config => "config",
                FileKind::Source => "source",
                FileKind::DependencyManifest => "dependency-manifest",
            };
            write!(f, "{name}")
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Change {
        pub path: PathBuf,
        pub original: String,
        pub modified: String,
        pub kind: FileKind,
    }

    /// Write primitive used by commit
    pub trait FileWriter {
        fn write(&self, path: &Path, content: &str) -> io::Result<()>;
    }

    /// Writes straight to the filesystem, creating parent directories
    #[derive(Debug, Default, Clone, Copy)]
    pub struct FsWriter;

    impl FileWriter for FsWriter {
        fn write(&self, path: &Path, content: &str) -> io::Result<()> {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, content)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct WriteFailure {
        pub path: PathBuf,
        pub error: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct CommitOutcome {
        pub written: Vec<PathBuf>,
        pub failures: Vec<WriteFailure>,
    }

    impl CommitOutcome {
        pub fn is_complete(&self) -> bool {
            self.failures.is_empty()
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct ChangeSet {
        changes: Vec<Change>,
    }

    impl ChangeSet {
        pub fn new() -> Self {
            ChangeSet::default()
        }

        /// Store a change; identical content is not a change. Returns whether
        /// anything was recorded.
        pub fn record(&mut self, path: &Path, original: String, modified: String, kind: FileKind) -> bool {
            if original == modified {
                return false;
            }
            self.changes.push(Change {
                path: path.to_path_buf(),
                original,
                modified,
                kind,
            });
            true
        }

        /// Changes in the order they were recorded
        pub fn all(&self) -> &[Change] {
            &self.changes
        }

        pub fn len(&self) -> usize {
            self.changes.len()
        }

        pub fn is_empty(&self) -> bool {
            self.changes.is_empty()
        }

        /// Write every change. Failures are collected, never short-circuit,
        /// and do not remove the change from the set.
        pub fn commit<W: FileWriter + ?Sized>(&self, writer: &W) -> CommitOutcome {
            let mut outcome = CommitOutcome::default();
            for change in &self.changes {
                match writer.write(&change.path, &change.modified) {
                    Ok(()) => outcome.written.push(change.path.clone()),
                    Err(e) => outcome.failures.push(WriteFailure {
                        path: change.path.clone(),
                        error: e.to_string(),
                    }),
                }
            }
            outcome
        }
    }
}

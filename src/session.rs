// Copyright (C) Brian G. Milnes 2025

//! Migration session: one run over one plugin tree
//!
//! Phases run once each, in order:
//! Created -> Discovered -> Transformed -> BackedUp -> Committed -> Reported.
//! No file is written before BackedUp completes. `run` consumes the session,
//! so a session cannot be reused.

pub mod session {
    use std::fs;
    use std::path::{Path, PathBuf};

    use rayon::prelude::*;
    use serde::Serialize;

    use crate::backup::backup::BackupManager;
    use crate::change_set::change_set::{ChangeSet, CommitOutcome, FileKind, FileWriter, FsWriter};
    use crate::config_doc::config_doc::PluginDescription;
    use crate::error::error::{MigrationError, Result};
    use crate::logging::logging::ToolLogger;
    use crate::report::report::{BackupSkip, ChangeSummary, Report};
    use crate::rules::rules::RuleCatalog;
    use crate::transformer::transformer::FileTransformer;
    use crate::walker::walker::{find_files_with_extensions, DEFAULT_EXCLUDED_DIRS};
    use crate::warnings::warnings::Warning;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
    pub enum Phase {
        Created,
        Discovered,
        Transformed,
        BackedUp,
        Committed,
        Reported,
    }

    #[derive(Debug, Clone)]
    pub struct SessionOptions {
        /// Discover and transform, then report without backup or commit
        pub dry_run: bool,
        /// Take the pre-commit backup
        pub backup: bool,
        /// Worker threads for the transform phase; `None` uses rayon's default
        pub jobs: Option<usize>,
        /// Directory names the walker never enters
        pub excluded_dirs: Vec<String>,
    }

    impl Default for SessionOptions {
        fn default() -> Self {
            SessionOptions {
                dry_run: false,
                backup: true,
                jobs: None,
                excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    /// Files found by the discover phase
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Discovery {
        pub config: Option<PathBuf>,
        pub sources: Vec<PathBuf>,
        pub manifest: Option<PathBuf>,
    }

    impl Discovery {
        /// Config first, then sources, then the manifest
        pub fn files(&self) -> Vec<(FileKind, PathBuf)> {
            let mut files = Vec::with_capacity(self.sources.len() + 2);
            if let Some(config) = &self.config {
                files.push((FileKind::Config, config.clone()));
            }
            files.extend(self.sources.iter().map(|p| (FileKind::Source, p.clone())));
            if let Some(manifest) = &self.manifest {
                files.push((FileKind::DependencyManifest, manifest.clone()));
            }
            files
        }
    }

    /// What one worker hands back for one file
    #[derive(Debug)]
    struct FileOutcome {
        path: PathBuf,
        kind: FileKind,
        contents: Option<(String, String)>,
        warnings: Vec<Warning>,
    }

    fn process_file(transformer: &FileTransformer<'_>, kind: FileKind, path: &Path) -> FileOutcome {
        match fs::read_to_string(path) {
            Ok(original) => {
                let transformed = transformer.transform_file(kind, path, &original);
                FileOutcome {
                    path: path.to_path_buf(),
                    kind,
                    contents: Some((original, transformed.content)),
                    warnings: transformed.warnings,
                }
            }
            Err(e) => FileOutcome {
                path: path.to_path_buf(),
                kind,
                contents: None,
                warnings: vec![Warning::skipped(path, &format!("read failed ({e})"))],
            },
        }
    }

    pub struct MigrationSession {
        root: PathBuf,
        catalog: RuleCatalog,
        options: SessionOptions,
        phase: Phase,
        changes: ChangeSet,
        warnings: Vec<Warning>,
        plugin: Option<PluginDescription>,
        files_scanned: usize,
    }

    impl MigrationSession {
        /// Fails with `InvalidRoot` unless `root` is an existing directory
        pub fn new(root: impl AsRef<Path>, catalog: RuleCatalog, options: SessionOptions) -> Result<Self> {
            let given = root.as_ref();
            let invalid = || MigrationError::InvalidRoot {
                path: given.to_path_buf(),
            };
            let root = fs::canonicalize(given).map_err(|_| invalid())?;
            if !root.is_dir() {
                return Err(invalid());
            }

            Ok(MigrationSession {
                root,
                catalog,
                options,
                phase: Phase::Created,
                changes: ChangeSet::new(),
                warnings: Vec::new(),
                plugin: None,
                files_scanned: 0,
            })
        }

        pub fn root(&self) -> &Path {
            &self.root
        }

        pub fn phase(&self) -> Phase {
            self.phase
        }

        pub fn catalog(&self) -> &RuleCatalog {
            &self.catalog
        }

        /// Run every phase, writing through the filesystem
        pub fn run(self, logger: &mut ToolLogger) -> Result<Report> {
            self.run_with_writer(&FsWriter, logger)
        }

        /// Run every phase, committing through `writer`
        pub fn run_with_writer<W: FileWriter + ?Sized>(mut self, writer: &W, logger: &mut ToolLogger) -> Result<Report> {
            logger.log(&format!(
                "Starting migration with catalog '{}'{}",
                self.catalog.name(),
                if self.options.dry_run { " (dry run)" } else { "" }
            ));
            logger.log(&format!("Processing directory: {}", self.root.display()));
            logger.log("");

            let discovery = self.discover(logger);
            self.transform(&discovery, logger);
            let backup = self.backup(logger)?;
            let outcome = self.commit(writer, logger);
            Ok(self.report(backup, outcome))
        }

        fn advance(&mut self, next: Phase) {
            debug_assert!(next > self.phase, "phase {next:?} after {:?}", self.phase);
            self.phase = next;
        }

        /// Discover phase: the config file, every source file, the manifest
        fn discover(&mut self, logger: &mut ToolLogger) -> Discovery {
            let config_path = self.root.join(self.catalog.config_file());
            let config = if config_path.is_file() {
                Some(config_path)
            } else {
                let message = format!("{} not found", self.catalog.config_file());
                logger.log(&format!("Warning: {message}"));
                self.warnings.push(Warning::document(&config_path, message));
                None
            };

            let scan = find_files_with_extensions(
                &self.root,
                self.catalog.source_extensions(),
                &self.options.excluded_dirs,
            );
            for failure in scan.failures {
                logger.log_error(&format!("Skipped unreadable entry: {}", failure.path.display()));
                self.warnings.push(Warning::skipped(
                    &failure.path,
                    &format!("walk failed ({}); nothing under it was checked", failure.reason),
                ));
            }
            let sources = scan.files;

            let manifest = self
                .catalog
                .manifest()
                .map(|rule| self.root.join(&rule.file))
                .filter(|path| path.is_file());

            let discovery = Discovery {
                config,
                sources,
                manifest,
            };
            self.files_scanned = discovery.files().len();
            logger.log(&format!("Discovered {} file(s) to check", self.files_scanned));
            self.advance(Phase::Discovered);
            discovery
        }

        /// Transform phase: workers return results, one owner merges them
        fn transform(&mut self, discovery: &Discovery, logger: &mut ToolLogger) {
            let files = discovery.files();
            let outcomes = {
                let transformer = FileTransformer::new(&self.catalog);
                let work = || -> Vec<FileOutcome> {
                    files
                        .par_iter()
                        .map(|(kind, path)| process_file(&transformer, *kind, path))
                        .collect()
                };

                match self.options.jobs {
                    Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                        Ok(pool) => pool.install(work),
                        Err(e) => {
                            logger.log_error(&format!("Warning: could not build {jobs}-thread pool ({e}); using default"));
                            work()
                        }
                    },
                    None => work(),
                }
            };

            for outcome in outcomes {
                for warning in &outcome.warnings {
                    logger.log_silent(&format!("warning: {warning}"));
                }
                self.warnings.extend(outcome.warnings);

                let Some((original, modified)) = outcome.contents else {
                    logger.log_error(&format!("Skipped unreadable file: {}", outcome.path.display()));
                    continue;
                };

                if outcome.kind == FileKind::Config {
                    match PluginDescription::parse(&original) {
                        Ok(plugin) => self.plugin = Some(plugin),
                        Err(e) => self.warnings.push(Warning::document(
                            &outcome.path,
                            format!("{} is not valid YAML: {e}", outcome.path.display()),
                        )),
                    }
                }

                if self.changes.record(&outcome.path, original, modified, outcome.kind) {
                    logger.log(&format!("Changed [{}]: {}", outcome.kind, self.relative(&outcome.path).display()));
                }
            }

            logger.log(&format!(
                "Transformed: {} change(s), {} warning(s)",
                self.changes.len(),
                self.warnings.len()
            ));
            self.advance(Phase::Transformed);
        }

        /// Backup phase. A failure here ends the run before anything is written.
        fn backup(&mut self, logger: &mut ToolLogger) -> Result<std::result::Result<PathBuf, BackupSkip>> {
            let backup = if self.options.dry_run {
                Err(BackupSkip::DryRun)
            } else if !self.options.backup {
                Err(BackupSkip::Disabled)
            } else if self.changes.is_empty() {
                Err(BackupSkip::NoChanges)
            } else {
                let snapshot = BackupManager::snapshot(&self.root)?;
                logger.log(&format!(
                    "Created backup at: {} ({} files, {} bytes)",
                    snapshot.root.display(),
                    snapshot.stats.files,
                    snapshot.stats.bytes
                ));
                Ok(snapshot.root)
            };
            if let Err(reason) = &backup {
                logger.log(&format!("Backup skipped: {reason}"));
            }
            self.advance(Phase::BackedUp);
            Ok(backup)
        }

        /// Commit phase
        fn commit<W: FileWriter + ?Sized>(&mut self, writer: &W, logger: &mut ToolLogger) -> CommitOutcome {
            let outcome = if self.options.dry_run {
                CommitOutcome::default()
            } else {
                logger.log(&format!("Applying {} changes...", self.changes.len()));
                let outcome = self.changes.commit(writer);
                for path in &outcome.written {
                    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                    logger.log(&format!("Updated: {name}"));
                }
                for failure in &outcome.failures {
                    logger.log_error(&format!("✗ Failed to write {}: {}", failure.path.display(), failure.error));
                }
                outcome
            };
            self.advance(Phase::Committed);
            outcome
        }

        fn report(mut self, backup: std::result::Result<PathBuf, BackupSkip>, outcome: CommitOutcome) -> Report {
            let changes = self
                .changes
                .all()
                .iter()
                .map(|change| ChangeSummary {
                    path: change.path.clone(),
                    kind: change.kind,
                    written: outcome.written.contains(&change.path),
                })
                .collect();
            self.advance(Phase::Reported);

            Report {
                root: self.root,
                catalog: self.catalog.name().to_string(),
                plugin: self.plugin,
                dry_run: self.options.dry_run,
                backup_skipped: backup.as_ref().err().copied(),
                backup: backup.ok(),
                files_scanned: self.files_scanned,
                changes,
                warnings: self.warnings,
                write_failures: outcome.failures,
                manual_review: self.catalog.manual_review().to_vec(),
            }
        }

        fn relative<'p>(&self, path: &'p Path) -> &'p Path {
            path.strip_prefix(&self.root).unwrap_or(path)
        }
    }
}

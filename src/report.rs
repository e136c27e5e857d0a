// Copyright (C) Brian G. Milnes 2025

//! Migration report: counts, warnings, write failures and the manual review list

pub mod report {
    use std::fmt::Write as _;
    use std::path::PathBuf;

    use serde::Serialize;

    use crate::change_set::change_set::{FileKind, WriteFailure};
    use crate::config_doc::config_doc::PluginDescription;
    use crate::tool_runner::tool_runner::RunSummary;
    use crate::warnings::warnings::Warning;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct ChangeSummary {
        pub path: PathBuf,
        pub kind: FileKind,
        pub written: bool,
    }

    /// Why the backup phase took no copy
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum BackupSkip {
        DryRun,
        Disabled,
        /// The change set was empty, so commit had nothing to overwrite
        NoChanges,
    }

    impl std::fmt::Display for BackupSkip {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            let reason = match self {
                BackupSkip::DryRun => "dry run",
                BackupSkip::Disabled => "disabled",
                BackupSkip::NoChanges => "no changes to commit",
            };
            write!(f, "{reason}")
        }
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Report {
        pub root: PathBuf,
        pub catalog: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub plugin: Option<PluginDescription>,
        pub dry_run: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub backup: Option<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub backup_skipped: Option<BackupSkip>,
        pub files_scanned: usize,
        pub changes: Vec<ChangeSummary>,
        pub warnings: Vec<Warning>,
        pub write_failures: Vec<WriteFailure>,
        pub manual_review: Vec<String>,
    }

    impl Report {
        pub fn change_count(&self) -> usize {
            self.changes.len()
        }

        pub fn warning_count(&self) -> usize {
            self.warnings.len()
        }

        /// False when any recorded change failed to be written
        pub fn is_success(&self) -> bool {
            self.write_failures.is_empty()
        }

        pub fn to_json(&self) -> serde_json::Result<String> {
            serde_json::to_string_pretty(self)
        }

        pub fn to_text(&self) -> String {
            let mut out = String::new();
            let _ = writeln!(out, "=== Migration Summary ===");
            if let Some(plugin) = &self.plugin {
                let _ = writeln!(
                    out,
                    "Plugin: {} {} (api: {})",
                    plugin.name.as_deref().unwrap_or("<unnamed>"),
                    plugin.version.as_deref().unwrap_or("?"),
                    plugin.api_versions().join(", ")
                );
            }
            if self.dry_run {
                let _ = writeln!(out, "Files that would be modified: {}", self.change_count());
            } else {
                let _ = writeln!(out, "Files modified: {}", self.change_count());
            }
            let _ = writeln!(out, "Warnings: {}", self.warning_count());
            if !self.write_failures.is_empty() {
                let _ = writeln!(out, "Write failures: {}", self.write_failures.len());
            }
            let _ = writeln!(out);

            if !self.changes.is_empty() {
                let _ = writeln!(out, "=== Changes ===");
                for change in &self.changes {
                    let _ = writeln!(out, "  [{}] {}", change.kind, change.path.display());
                }
                let _ = writeln!(out);
            }

            if !self.warnings.is_empty() {
                let _ = writeln!(out, "=== Warnings ===");
                for warning in &self.warnings {
                    let _ = writeln!(out, "⚠️  {warning}");
                }
                let _ = writeln!(out);
            }

            if !self.write_failures.is_empty() {
                let _ = writeln!(out, "=== Write Failures ===");
                for failure in &self.write_failures {
                    let _ = writeln!(out, "✗ {}: {}", failure.path.display(), failure.error);
                }
                let _ = writeln!(out);
            }

            if !self.manual_review.is_empty() {
                let _ = writeln!(out, "=== Manual Review Required ===");
                for topic in &self.manual_review {
                    let _ = writeln!(out, "• {topic}");
                }
                let _ = writeln!(out);
            }

            match (&self.backup, self.backup_skipped) {
                (_, Some(BackupSkip::DryRun)) => {
                    let _ = writeln!(out, "Dry run: no backup taken, no files written.");
                }
                (Some(backup), _) => {
                    let _ = writeln!(out, "Backup: {}", backup.display());
                }
                (None, Some(reason)) => {
                    let _ = writeln!(out, "Backup: skipped ({reason})");
                }
                (None, None) => {
                    let _ = writeln!(out, "Backup: skipped");
                }
            }

            if self.is_success() {
                let _ = write!(out, "Migration complete! Please test your plugin thoroughly.");
            } else {
                let _ = write!(
                    out,
                    "Migration finished with {} unwritten file(s); see failures above.",
                    self.write_failures.len()
                );
            }
            out
        }
    }

    impl std::fmt::Display for Report {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.to_text())
        }
    }

    impl RunSummary for Report {
        fn summary_line(&self) -> String {
            format!(
                "Summary: {} files scanned, {} files changed, {} warnings, {} write failures",
                self.files_scanned,
                self.change_count(),
                self.warning_count(),
                self.write_failures.len()
            )
        }
    }
}

// Copyright (C) Brian G. Milnes 2025

//! Backup of the source tree before commit
//!
//! The backup is a full copy at `<root>_backup_<YYYY-MM-DD_HH-MM-SS>` next to
//! the root. Only directories and regular files are copied; symlinks and
//! special files are skipped. Any failure aborts the snapshot.

pub mod backup {
    use std::ffi::OsString;
    use std::fs;
    use std::path::{Path, PathBuf};

    use chrono::{DateTime, Local};
    use walkdir::WalkDir;

    use crate::error::error::{MigrationError, Result};

    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

    /// Sibling backup location for `root` at time `at`
    pub fn backup_path_for(root: &Path, at: &DateTime<Local>) -> PathBuf {
        let mut name: OsString = root.file_name().map(OsString::from).unwrap_or_default();
        name.push(format!("_backup_{}", at.format(TIMESTAMP_FORMAT)));
        root.with_file_name(name)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BackupStats {
        pub directories: usize,
        pub files: usize,
        pub bytes: u64,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Snapshot {
        pub root: PathBuf,
        pub stats: BackupStats,
    }

    pub struct BackupManager;

    impl BackupManager {
        /// Copy the tree under `source_root` to a fresh timestamped sibling
        pub fn snapshot(source_root: &Path) -> Result<Snapshot> {
            Self::snapshot_at(source_root, &Local::now())
        }

        pub fn snapshot_at(source_root: &Path, at: &DateTime<Local>) -> Result<Snapshot> {
            let backup_root = backup_path_for(source_root, at);
            Self::copy_tree(source_root, &backup_root)
        }

        /// Copy `source_root` into `backup_root`, which must not exist yet so
        /// an earlier backup is never overwritten
        pub fn copy_tree(source_root: &Path, backup_root: &Path) -> Result<Snapshot> {
            let fail = |path: &Path, reason: String| MigrationError::Backup {
                path: path.to_path_buf(),
                reason,
            };

            if !source_root.is_dir() {
                return Err(fail(source_root, "source is not a directory".to_string()));
            }
            if backup_root.exists() {
                return Err(fail(backup_root, "backup target already exists".to_string()));
            }
            fs::create_dir_all(backup_root).map_err(|e| fail(backup_root, e.to_string()))?;

            let mut stats = BackupStats::default();
            for entry in WalkDir::new(source_root).min_depth(1).follow_links(false) {
                let entry = entry.map_err(|e| fail(source_root, e.to_string()))?;
                let relative = entry
                    .path()
                    .strip_prefix(source_root)
                    .map_err(|e| fail(entry.path(), e.to_string()))?;
                let target = backup_root.join(relative);

                let file_type = entry.file_type();
                if file_type.is_dir() {
                    fs::create_dir_all(&target).map_err(|e| fail(&target, e.to_string()))?;
                    stats.directories += 1;
                } else if file_type.is_file() {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent).map_err(|e| fail(parent, e.to_string()))?;
                    }
                    let bytes = fs::copy(entry.path(), &target)
                        .map_err(|e| fail(entry.path(), e.to_string()))?;
                    stats.files += 1;
                    stats.bytes += bytes;
                }
            }

            Ok(Snapshot {
                root: backup_root.to_path_buf(),
                stats,
            })
        }
    }

}

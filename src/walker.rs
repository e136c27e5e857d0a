// Copyright (C) Brian G. Milnes 2025

//! Filesystem walk for source discovery

pub mod walker {
    use std::path::{Path, PathBuf};
    use walkdir::{DirEntry, WalkDir};

    /// Directories never descended into unless the caller says otherwise
    pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["vendor", ".git", "node_modules"];

    /// An entry the walk could not read; its subtree was not visited
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct WalkFailure {
        pub path: PathBuf,
        pub reason: String,
    }

    /// Files found by a walk, plus the entries it had to skip
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct FileScan {
        pub files: Vec<PathBuf>,
        pub failures: Vec<WalkFailure>,
    }

    fn is_excluded(entry: &DirEntry, excluded: &[String]) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| excluded.iter().any(|e| e == name))
                .unwrap_or(false)
    }

    /// Lazily walk regular files under `root`, skipping excluded directory names.
    /// Entries that cannot be read come through as `WalkFailure`.
    pub fn walk_files<'a>(
        root: &'a Path,
        excluded: &'a [String],
    ) -> impl Iterator<Item = Result<PathBuf, WalkFailure>> + 'a {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |e| !is_excluded(e, excluded))
            .filter_map(move |entry| match entry {
                Ok(e) if e.file_type().is_file() => Some(Ok(e.into_path())),
                Ok(_) => None,
                Err(e) => Some(Err(WalkFailure {
                    path: e.path().unwrap_or(root).to_path_buf(),
                    reason: e.to_string(),
                })),
            })
    }

    /// Files under `root` with one of the given extensions, sorted
    pub fn find_files_with_extensions(root: &Path, extensions: &[String], excluded: &[String]) -> FileScan {
        let mut scan = FileScan::default();
        for entry in walk_files(root, excluded) {
            match entry {
                Ok(path) => {
                    let wanted = path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
                        .unwrap_or(false);
                    if wanted {
                        scan.files.push(path);
                    }
                }
                Err(failure) => scan.failures.push(failure),
            }
        }
        scan.files.sort();
        scan
    }
}

// Copyright (C) Brian G. Milnes 2025

//! Error kinds for a migration session
//!
//! Only `InvalidRoot`, `Catalog` and `Backup` abort a run. Read and write
//! failures on individual files are contained by the session and surface as
//! warnings or write-failure records in the report.

pub mod error {
    use std::path::PathBuf;
    use thiserror::Error;

    pub type Result<T> = std::result::Result<T, MigrationError>;

    #[derive(Error, Debug)]
    pub enum MigrationError {
        #[error("Directory does not exist: {}", path.display())]
        InvalidRoot { path: PathBuf },

        #[error("Failed to read {}: {source}", path.display())]
        Read {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },

        #[error("Failed to write {}: {source}", path.display())]
        Write {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },

        #[error("Backup failed at {}: {reason}", path.display())]
        Backup { path: PathBuf, reason: String },

        #[error("Invalid rule catalog: {0}")]
        Catalog(String),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),

        #[error("YAML error: {0}")]
        Yaml(#[from] serde_norway::Error),
    }

    impl MigrationError {
        /// True for the error kinds that abort the whole run
        pub fn is_fatal(&self) -> bool {
            matches!(
                self,
                MigrationError::InvalidRoot { .. }
                    | MigrationError::Backup { .. }
                    | MigrationError::Catalog(_)
            )
        }
    }
}

// Copyright (C) Brian G. Milnes 2025

//! Warnings and the warning detector
//!
//! The detector looks for legacy patterns that no rule can fix mechanically.
//! It only tests for substring presence and reports each detector entry at
//! most once per file.

pub mod warnings {
    use std::fmt;
    use std::path::{Path, PathBuf};

    use serde::Serialize;

    use crate::rules::rules::{DetectorKind, DetectorRule, Rule};

    /// Where a warning came from
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum WarningSource {
        DeprecatedApi,
        Detector(DetectorKind),
        /// The file could not be read and was left alone
        SkippedFile,
        /// Something about the config file or manifest itself
        Document,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct Warning {
        pub message: String,
        pub file: PathBuf,
        pub triggering_pattern: String,
        pub source: WarningSource,
    }

    impl Warning {
        /// Warning for a deprecated-API rule that fired, naming both sides
        pub fn deprecated(rule: &Rule, file: &Path) -> Self {
            Warning {
                message: format!(
                    "Replaced deprecated method {} with {} in {}",
                    rule.pattern,
                    rule.replacement,
                    file.display()
                ),
                file: file.to_path_buf(),
                triggering_pattern: rule.pattern.clone(),
                source: WarningSource::DeprecatedApi,
            }
        }

        pub fn skipped(file: &Path, reason: &str) -> Self {
            Warning {
                message: format!("Skipped {}: {reason}", file.display()),
                file: file.to_path_buf(),
                triggering_pattern: String::new(),
                source: WarningSource::SkippedFile,
            }
        }

        pub fn document(file: &Path, message: String) -> Self {
            Warning {
                message,
                file: file.to_path_buf(),
                triggering_pattern: String::new(),
                source: WarningSource::Document,
            }
        }
    }

    impl fmt::Display for Warning {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    pub struct WarningDetector<'a> {
        rules: &'a [DetectorRule],
    }

    impl<'a> WarningDetector<'a> {
        pub fn new(rules: &'a [DetectorRule]) -> Self {
            WarningDetector { rules }
        }

        /// Scan content for every detector entry; one warning per entry that
        /// matches, naming the first of its patterns found
        pub fn detect(&self, file: &Path, content: &str) -> Vec<Warning> {
            self.rules
                .iter()
                .filter_map(|rule| {
                    let hit = rule.patterns.iter().find(|p| content.contains(p.as_str()))?;
                    Some(Warning {
                        message: rule.message.replace("{file}", &file.display().to_string()),
                        file: file.to_path_buf(),
                        triggering_pattern: hit.clone(),
                        source: WarningSource::Detector(rule.kind),
                    })
                })
                .collect()
        }
    }
}

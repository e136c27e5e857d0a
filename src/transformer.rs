// Copyright (C) Brian G. Milnes 2025

//! File transformer: applies the rule catalog to one file's content
//!
//! Everything here is a pure function of (path, content). Nothing reads or
//! writes the disk, which is what lets the session fan files out to worker
//! threads.
//!
//! Source files go through the literal tables in a fixed order:
//! namespace, deprecated-api, symbol, import, signature. The warning detector
//! then runs over the ORIGINAL content so an unrelated rewrite cannot hide a
//! risky pattern.

pub mod transformer {
    use std::path::Path;

    use crate::change_set::change_set::FileKind;
    use crate::config_doc::config_doc::{find_constraints, replace_constraint, PluginDescription};
    use crate::rules::rules::{RuleCatalog, RuleKind};
    use crate::warnings::warnings::{Warning, WarningDetector, WarningSource};

    /// Result of transforming one file
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Transformed {
        pub content: String,
        pub warnings: Vec<Warning>,
    }

    impl Transformed {
        fn unchanged(content: &str) -> Self {
            Transformed {
                content: content.to_string(),
                warnings: Vec::new(),
            }
        }
    }

    pub struct FileTransformer<'a> {
        catalog: &'a RuleCatalog,
    }

    impl<'a> FileTransformer<'a> {
        pub fn new(catalog: &'a RuleCatalog) -> Self {
            FileTransformer { catalog }
        }

        /// Dispatch on file kind; config and manifest files never see source rules
        pub fn transform_file(&self, kind: FileKind, path: &Path, content: &str) -> Transformed {
            match kind {
                FileKind::Source => self.transform(path, content),
                FileKind::Config => self.transform_config(path, content),
                FileKind::DependencyManifest => self.transform_manifest(path, content),
            }
        }

        /// Transform a source file
        pub fn transform(&self, path: &Path, content: &str) -> Transformed {
            let mut text = content.to_string();
            let mut warnings = Vec::new();

            for kind in RuleKind::SOURCE_ORDER {
                for rule in self.catalog.rules(kind).iter().filter(|r| !r.is_noop()) {
                    if !text.contains(&rule.pattern) {
                        continue;
                    }
                    text = text.replace(&rule.pattern, &rule.replacement);
                    if kind == RuleKind::DeprecatedApi {
                        warnings.push(Warning::deprecated(rule, path));
                    }
                }
            }

            let detector = WarningDetector::new(self.catalog.detectors());
            for found in detector.detect(path, content) {
                let already_reported = warnings.iter().any(|w| {
                    w.source == WarningSource::DeprecatedApi
                        && w.triggering_pattern == found.triggering_pattern
                });
                if !already_reported {
                    warnings.push(found);
                }
            }

            Transformed { content: text, warnings }
        }

        /// Transform the plugin config document with the config-field rules
        pub fn transform_config(&self, path: &Path, content: &str) -> Transformed {
            let mut text = content.to_string();
            for field in self.catalog.config_fields() {
                if field.pattern.is_match(&text) {
                    text = field
                        .pattern
                        .replace_all(&text, field.replacement.as_str())
                        .into_owned();
                }
            }

            let mut warnings = Vec::new();
            if text != content
                && PluginDescription::parse(content).is_ok()
                && PluginDescription::parse(&text).is_err()
            {
                warnings.push(Warning::document(
                    path,
                    format!("{} no longer parses as YAML after rewriting - check it by hand", path.display()),
                ));
            }

            Transformed { content: text, warnings }
        }

        /// Bump the framework dependency constraint in the manifest
        pub fn transform_manifest(&self, path: &Path, content: &str) -> Transformed {
            let Some(rule) = self.catalog.manifest() else {
                return Transformed::unchanged(content);
            };

            let constraints = match find_constraints(content, &rule.package, &rule.sections) {
                Ok(found) => found,
                Err(e) => {
                    return Transformed {
                        content: content.to_string(),
                        warnings: vec![Warning::document(
                            path,
                            format!("Could not parse {}: {e}", path.display()),
                        )],
                    };
                }
            };

            let mut text = content.to_string();
            let mut warnings = Vec::new();
            let mut handled: Vec<String> = Vec::new();
            for found in constraints {
                // replace_constraint rewrites every section holding this value at once
                if handled.contains(&found.constraint) {
                    continue;
                }
                let Some(bumped) = rule.rewrite_constraint(&found.constraint) else {
                    continue;
                };
                handled.push(found.constraint.clone());
                let rewritten = replace_constraint(&text, &rule.package, &found.constraint, &bumped);
                if rewritten == text {
                    warnings.push(Warning::document(
                        path,
                        format!(
                            "Could not rewrite {} constraint \"{}\" in {} ({}) - change it to \"{bumped}\" by hand",
                            rule.package,
                            found.constraint,
                            path.display(),
                            found.section
                        ),
                    ));
                }
                text = rewritten;
            }

            Transformed { content: text, warnings }
        }
    }
}

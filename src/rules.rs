// Copyright (C) Brian G. Milnes 2025

//! Rule catalog for API migrations
//!
//! A catalog is a JSON document holding ordered rewrite tables per rule kind,
//! the config-file field rules, the dependency-manifest rule and the warning
//! detector patterns. It is validated against `schemas/rule-catalog.schema.json`
//! and compiled once; nothing mutates it afterwards.
//!
//! Literal rules whose `from` equals `to` are kept for traceability of the
//! mapping tables but never applied.

pub mod rules {
    use std::fmt;
    use std::path::Path;

    use regex::Regex;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    use crate::error::error::{MigrationError, Result};

    const BUILTIN_CATALOG: &str = include_str!("../catalogs/pocketmine-4-to-5.json");
    const CATALOG_SCHEMA: &str = include_str!("../schemas/rule-catalog.schema.json");

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum RuleKind {
        Namespace,
        Symbol,
        DeprecatedApi,
        Import,
        Signature,
        ConfigField,
    }

    impl RuleKind {
        /// Order in which literal rule tables run over a source file
        pub const SOURCE_ORDER: [RuleKind; 5] = [
            RuleKind::Namespace,
            RuleKind::DeprecatedApi,
            RuleKind::Symbol,
            RuleKind::Import,
            RuleKind::Signature,
        ];
    }

    impl fmt::Display for RuleKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let name = match self {
                RuleKind::Namespace => "namespace",
                RuleKind::Symbol => "symbol",
                RuleKind::DeprecatedApi => "deprecated-api",
                RuleKind::Import => "import",
                RuleKind::Signature => "signature",
                RuleKind::ConfigField => "config-field",
            };
            write!(f, "{name}")
        }
    }

    /// A literal substring rewrite
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Rule {
        pub kind: RuleKind,
        pub pattern: String,
        pub replacement: String,
    }

    impl Rule {
        pub fn is_noop(&self) -> bool {
            self.pattern == self.replacement
        }
    }

    impl fmt::Display for Rule {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "[{}] {} -> {}", self.kind, self.pattern, self.replacement)
        }
    }

    /// A line-oriented regex rewrite of one config-file field
    #[derive(Debug, Clone)]
    pub struct ConfigFieldRule {
        pub field: String,
        pub pattern: Regex,
        pub replacement: String,
    }

    /// Version-constraint rewrite for one dependency in the manifest
    #[derive(Debug, Clone)]
    pub struct ManifestRule {
        pub file: String,
        pub package: String,
        pub sections: Vec<String>,
        pub from_version: String,
        pub to_version: String,
        token: Regex,
    }

    impl ManifestRule {
        /// Rewrite a constraint such as `^4.0.0` if it names the source version.
        /// `14.0.0` or `4.0.01` do not count as the token.
        pub fn rewrite_constraint(&self, constraint: &str) -> Option<String> {
            if !self.token.is_match(constraint) {
                return None;
            }
            let replacement = format!("${{1}}{}${{2}}", self.to_version);
            Some(self.token.replace_all(constraint, replacement.as_str()).into_owned())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum DetectorKind {
        RemovedMethod,
        RenamedAccessor,
        RestructuredEvent,
        MetadataAccessor,
    }

    /// Substring patterns that call for manual review; `{file}` in the
    /// message is replaced by the file path
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DetectorRule {
        pub kind: DetectorKind,
        pub patterns: Vec<String>,
        pub message: String,
    }

    // On-disk shape of a catalog

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LiteralRuleDoc {
        pub from: String,
        pub to: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SourcesDoc {
        pub extensions: Vec<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ConfigFieldDoc {
        pub field: String,
        pub pattern: String,
        pub replacement: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ConfigDoc {
        pub file: String,
        pub fields: Vec<ConfigFieldDoc>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ManifestDoc {
        pub file: String,
        pub package: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub sections: Vec<String>,
        pub from_version: String,
        pub to_version: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CatalogDocument {
        pub name: String,
        pub sources: SourcesDoc,
        #[serde(default)]
        pub namespace: Vec<LiteralRuleDoc>,
        #[serde(default)]
        pub deprecated_api: Vec<LiteralRuleDoc>,
        #[serde(default)]
        pub symbol: Vec<LiteralRuleDoc>,
        #[serde(default)]
        pub import: Vec<LiteralRuleDoc>,
        #[serde(default)]
        pub signature: Vec<LiteralRuleDoc>,
        pub config: ConfigDoc,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub manifest: Option<ManifestDoc>,
        pub detectors: Vec<DetectorRule>,
        #[serde(default)]
        pub manual_review: Vec<String>,
    }

    /// Compiled, immutable rule catalog
    #[derive(Debug, Clone)]
    pub struct RuleCatalog {
        document: CatalogDocument,
        namespace: Vec<Rule>,
        deprecated_api: Vec<Rule>,
        symbol: Vec<Rule>,
        import: Vec<Rule>,
        signature: Vec<Rule>,
        config_fields: Vec<ConfigFieldRule>,
        manifest: Option<ManifestRule>,
    }

    impl RuleCatalog {
        /// The embedded PocketMine-MP 4.0.0 -> 5.0.0 catalog
        pub fn builtin() -> Result<Self> {
            Self::from_str(BUILTIN_CATALOG)
        }

        /// Load a catalog from a JSON file
        pub fn from_file(path: &Path) -> Result<Self> {
            let content = std::fs::read_to_string(path).map_err(|source| MigrationError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_str(&content)
        }

        /// Load a catalog from a JSON string
        pub fn from_str(json: &str) -> Result<Self> {
            let value: Value = serde_json::from_str(json)?;
            check_schema(&value)?;
            let document: CatalogDocument = serde_json::from_value(value)?;
            Self::compile(document)
        }

        pub fn compile(document: CatalogDocument) -> Result<Self> {
            let literal = |kind: RuleKind, docs: &[LiteralRuleDoc]| -> Vec<Rule> {
                docs.iter()
                    .map(|d| Rule {
                        kind,
                        pattern: d.from.clone(),
                        replacement: d.to.clone(),
                    })
                    .collect()
            };

            let mut config_fields = Vec::with_capacity(document.config.fields.len());
            for field in &document.config.fields {
                let pattern = Regex::new(&field.pattern).map_err(|e| {
                    MigrationError::Catalog(format!("config field '{}': {e}", field.field))
                })?;
                config_fields.push(ConfigFieldRule {
                    field: field.field.clone(),
                    pattern,
                    replacement: field.replacement.clone(),
                });
            }

            let manifest = match &document.manifest {
                Some(doc) => Some(compile_manifest(doc)?),
                None => None,
            };

            let catalog = RuleCatalog {
                namespace: literal(RuleKind::Namespace, &document.namespace),
                deprecated_api: literal(RuleKind::DeprecatedApi, &document.deprecated_api),
                symbol: literal(RuleKind::Symbol, &document.symbol),
                import: literal(RuleKind::Import, &document.import),
                signature: literal(RuleKind::Signature, &document.signature),
                config_fields,
                manifest,
                document,
            };
            catalog.check_idempotent()?;
            Ok(catalog)
        }

        pub fn name(&self) -> &str {
            &self.document.name
        }

        pub fn document(&self) -> &CatalogDocument {
            &self.document
        }

        /// Ordered literal rules of one kind. Config-field rules live in
        /// [`RuleCatalog::config_fields`], so that kind yields nothing here.
        pub fn rules(&self, kind: RuleKind) -> &[Rule] {
            match kind {
                RuleKind::Namespace => &self.namespace,
                RuleKind::DeprecatedApi => &self.deprecated_api,
                RuleKind::Symbol => &self.symbol,
                RuleKind::Import => &self.import,
                RuleKind::Signature => &self.signature,
                RuleKind::ConfigField => &[],
            }
        }

        /// Every literal rule that actually rewrites something, in source order
        pub fn active_source_rules(&self) -> impl Iterator<Item = &Rule> {
            RuleKind::SOURCE_ORDER
                .into_iter()
                .flat_map(move |kind| self.rules(kind).iter())
                .filter(|rule| !rule.is_noop())
        }

        pub fn config_file(&self) -> &str {
            &self.document.config.file
        }

        pub fn config_fields(&self) -> &[ConfigFieldRule] {
            &self.config_fields
        }

        pub fn manifest(&self) -> Option<&ManifestRule> {
            self.manifest.as_ref()
        }

        pub fn detectors(&self) -> &[DetectorRule] {
            &self.document.detectors
        }

        pub fn source_extensions(&self) -> &[String] {
            &self.document.sources.extensions
        }

        pub fn manual_review(&self) -> &[String] {
            &self.document.manual_review
        }

        pub fn to_json(&self) -> Result<String> {
            Ok(serde_json::to_string_pretty(&self.document)?)
        }

        /// A second pass over rewritten text must find nothing to rewrite.
        /// Text inserted by a rule is only seen by that rule's later
        /// matches and by the rules after it, so each pattern is checked
        /// against the replacements of its own rule and every later one.
        fn check_idempotent(&self) -> Result<()> {
            let active: Vec<&Rule> = self.active_source_rules().collect();
            for (i, rule) in active.iter().enumerate() {
                if let Some(clash) = active[i..]
                    .iter()
                    .find(|later| can_form_pattern(&rule.pattern, &later.replacement))
                {
                    return Err(MigrationError::Catalog(format!(
                        "replacement of rule {clash} reintroduces pattern '{}' of rule {rule}",
                        rule.pattern
                    )));
                }
            }
            Ok(())
        }
    }

    /// True when inserting `replacement` into some text can leave an
    /// occurrence of `pattern` behind: inside it, around it, or across
    /// either edge.
    fn can_form_pattern(pattern: &str, replacement: &str) -> bool {
        if replacement.contains(pattern) || pattern.contains(replacement) {
            return true;
        }
        (1..pattern.len())
            .filter(|&k| pattern.is_char_boundary(k))
            .any(|k| replacement.ends_with(&pattern[..k]) || replacement.starts_with(&pattern[k..]))
    }

    fn compile_manifest(doc: &ManifestDoc) -> Result<ManifestRule> {
        let pattern = format!(r"(^|[^0-9.]){}($|[^0-9])", regex::escape(&doc.from_version));
        let token = Regex::new(&pattern)
            .map_err(|e| MigrationError::Catalog(format!("manifest version token: {e}")))?;
        let sections = if doc.sections.is_empty() {
            vec!["require".to_string()]
        } else {
            doc.sections.clone()
        };
        Ok(ManifestRule {
            file: doc.file.clone(),
            package: doc.package.clone(),
            sections,
            from_version: doc.from_version.clone(),
            to_version: doc.to_version.clone(),
            token,
        })
    }

    fn check_schema(value: &Value) -> Result<()> {
        let schema: Value = serde_json::from_str(CATALOG_SCHEMA)?;
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| MigrationError::Catalog(format!("schema does not compile: {e}")))?;
        let errors: Vec<String> = validator.iter_errors(value).map(|e| e.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MigrationError::Catalog(errors.join("; ")))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_manifest_token_boundaries() {
            let doc = ManifestDoc {
                file: "composer.json".to_string(),
                package: "pocketmine/pocketmine-mp".to_string(),
                sections: Vec::new(),
                from_version: "4.0.0".to_string(),
                to_version: "5.0.0".to_string(),
            };
            let rule = compile_manifest(&doc).unwrap();

            assert_eq!(rule.sections, vec!["require".to_string()]);
            assert_eq!(rule.rewrite_constraint("^4.0.0").as_deref(), Some("^5.0.0"));
            assert_eq!(rule.rewrite_constraint("4.0.0").as_deref(), Some("5.0.0"));
            assert_eq!(
                rule.rewrite_constraint("^4.0.0 || ~4.0.0").as_deref(),
                Some("^5.0.0 || ~5.0.0")
            );
            assert_eq!(rule.rewrite_constraint("^14.0.0"), None);
            assert_eq!(rule.rewrite_constraint("^4.0.01"), None);
            assert_eq!(rule.rewrite_constraint("^5.0.0"), None);
        }

        #[test]
        fn test_can_form_pattern_edges() {
            // Replacement is a prefix of the pattern
            assert!(can_form_pattern("Server::getOfflinePlayerData", "Server::getOfflinePlayer"));
            // Replacement ends with the start of the pattern
            assert!(can_form_pattern("bc", "xb"));
            // Replacement starts with the end of the pattern
            assert!(can_form_pattern("ab", "bx"));
            // Deleting text can join its neighbours
            assert!(can_form_pattern("ab", ""));

            assert!(!can_form_pattern("Server::getOfflinePlayerData(", "Server::getOfflinePlayer("));
            assert!(!can_form_pattern("->sendPopup(", "->sendTip("));
        }

        #[test]
        fn test_builtin_has_noop_rules_for_traceability() {
            let catalog = RuleCatalog::builtin().unwrap();
            assert!(catalog.rules(RuleKind::Symbol).iter().all(Rule::is_noop));
            assert!(catalog.rules(RuleKind::DeprecatedApi).iter().all(|r| !r.is_noop()));
            assert!(catalog.active_source_rules().all(|r| r.kind == RuleKind::DeprecatedApi));
        }
    }
}

// Copyright (C) Brian G. Milnes 2025

//! Readers for the plugin config document and the dependency manifest
//!
//! Neither document is ever re-serialized. The YAML side is only parsed to
//! report the plugin identity and to check that a rewrite left it parseable;
//! the JSON side locates a dependency constraint so the rewrite can touch
//! exactly that string value.

pub mod config_doc {
    use regex::{Captures, Regex};
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    use crate::error::error::{MigrationError, Result};

    /// Identity fields of a plugin description file
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct PluginDescription {
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default, deserialize_with = "scalar_as_string")]
        pub version: Option<String>,
        #[serde(default)]
        pub api: Option<serde_norway::Value>,
    }

    impl PluginDescription {
        pub fn parse(content: &str) -> Result<Self> {
            if content.trim().is_empty() {
                return Ok(PluginDescription::default());
            }
            Ok(serde_norway::from_str(content)?)
        }

        /// Declared API versions, whether written as a scalar or a list
        pub fn api_versions(&self) -> Vec<String> {
            match &self.api {
                Some(serde_norway::Value::Sequence(items)) => {
                    items.iter().filter_map(yaml_scalar).collect()
                }
                Some(value) => yaml_scalar(value).into_iter().collect(),
                None => Vec::new(),
            }
        }
    }

    fn yaml_scalar(value: &serde_norway::Value) -> Option<String> {
        match value {
            serde_norway::Value::String(s) => Some(s.clone()),
            serde_norway::Value::Number(n) => Some(n.to_string()),
            serde_norway::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<serde_norway::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(yaml_scalar))
    }

    /// One dependency constraint found in a manifest
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DependencyConstraint {
        pub section: String,
        pub constraint: String,
    }

    /// Find the constraint strings for `package` in the given manifest sections
    pub fn find_constraints(
        manifest: &str,
        package: &str,
        sections: &[String],
    ) -> Result<Vec<DependencyConstraint>> {
        let data: Value = serde_json::from_str(manifest)?;
        if !data.is_object() {
            return Err(MigrationError::Json(serde::de::Error::custom(
                "manifest root is not a JSON object",
            )));
        }
        Ok(sections
            .iter()
            .filter_map(|section| {
                let constraint = data.get(section)?.get(package)?.as_str()?;
                Some(DependencyConstraint {
                    section: section.clone(),
                    constraint: constraint.to_string(),
                })
            })
            .collect())
    }

    /// Literal JSON string body that also matches `\/` for each `/`
    fn json_string_body(text: &str) -> String {
        text.split('/')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\\?/")
    }

    /// Replace the string value of `"package": "old"` with `new`, leaving the
    /// rest of the document byte-for-byte intact
    pub fn replace_constraint(manifest: &str, package: &str, old: &str, new: &str) -> String {
        let pattern = format!(
            r#"("{}"\s*:\s*")({})(")"#,
            json_string_body(package),
            json_string_body(old)
        );
        match Regex::new(&pattern) {
            Ok(re) => re
                .replace_all(manifest, |caps: &Captures| format!("{}{new}{}", &caps[1], &caps[3]))
                .into_owned(),
            Err(_) => manifest.to_string(),
        }
    }

}

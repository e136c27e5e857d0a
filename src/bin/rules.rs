// Copyright (C) Brian G. Milnes 2025

//! Print the built-in rule catalog, or validate a catalog file
//!
//! Usage:
//!   apishift-rules                 print the built-in catalog as JSON
//!   apishift-rules <catalog.json>  validate a catalog and summarize it

use anyhow::{Context, Result};
use apishift::{RuleCatalog, RuleKind};
use std::path::Path;

fn summarize(catalog: &RuleCatalog) {
    println!("Catalog: {}", catalog.name());
    println!("Source extensions: {}", catalog.source_extensions().join(", "));
    for kind in RuleKind::SOURCE_ORDER {
        let rules = catalog.rules(kind);
        let active = rules.iter().filter(|r| !r.is_noop()).count();
        println!("{:<16} {:>4} rules ({} active, {} no-op)", kind.to_string(), rules.len(), active, rules.len() - active);
    }
    println!("{:<16} {:>4} rules ({})", "config-field", catalog.config_fields().len(), catalog.config_file());
    match catalog.manifest() {
        Some(m) => println!("manifest         {} in {}: {} -> {}", m.package, m.file, m.from_version, m.to_version),
        None => println!("manifest         none"),
    }
    println!("detectors        {:>4}", catalog.detectors().len());
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => {
            let catalog = RuleCatalog::builtin().context("Built-in rule catalog is invalid")?;
            println!("{}", catalog.to_json()?);
        }
        Some("-h") | Some("--help") => {
            println!("Usage: apishift-rules [catalog.json]");
        }
        Some(path) => {
            let catalog = RuleCatalog::from_file(Path::new(path))
                .with_context(|| format!("Invalid rule catalog: {path}"))?;
            println!("✓ {path} is a valid rule catalog\n");
            summarize(&catalog);
        }
    }

    Ok(())
}

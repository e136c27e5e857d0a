// Copyright (C) Brian G. Milnes 2025

//! Common fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PLUGIN_YML: &str = "name: DemoPlugin\nversion: 1.0.0\nmain: demo\\Main\napi: \"4.0.0\"\nmcpe-protocol: [527]\nauthor: someone\n";

pub const COMPOSER_JSON: &str = r#"{
    "name": "demo/plugin",
    "require": {
        "php": "^8.1",
        "pocketmine/pocketmine-mp": "^4.0.0"
    }
}
"#;

pub const MAIN_PHP: &str = r#"<?php

namespace demo;

use pocketmine\event\player\PlayerJoinEvent;
use pocketmine\plugin\PluginBase;

class Main extends PluginBase {
    public function onEnable(): void {
        $this->getLogger()->info("enabled");
    }

    public function onJoin(PlayerJoinEvent $event): void {
        $player = $event->getPlayer();
        $player->sendPopup("hi");
    }
}
"#;

pub const PLAIN_PHP: &str = "<?php\n\nfunction helper(): int {\n    return 42;\n}\n";

/// A plugin directory inside a temp dir, so the sibling backup is cleaned up too
pub struct PluginTree {
    pub temp: TempDir,
    pub root: PathBuf,
}

impl PluginTree {
    pub fn empty() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("DemoPlugin");
        fs::create_dir_all(&root).unwrap();
        PluginTree { temp, root }
    }

    /// plugin.yml, composer.json, one source file with sendPopup, one plain file
    pub fn standard() -> Self {
        let tree = Self::empty();
        tree.write("plugin.yml", PLUGIN_YML);
        tree.write("composer.json", COMPOSER_JSON);
        tree.write("src/demo/Main.php", MAIN_PHP);
        tree.write("src/demo/util/Helper.php", PLAIN_PHP);
        tree.write("resources/config.yml", "greeting: hello\n");
        tree
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).unwrap()
    }

    /// Every entry next to the plugin root whose name marks it as a backup
    pub fn backups(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(self.temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("DemoPlugin_backup_"))
                    .unwrap_or(false)
            })
            .collect();
        found.sort();
        found
    }
}

/// Relative path -> content for every regular file under `root`
pub fn snapshot_files(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

/// A small catalog for exercising rule ordering and the detector
pub fn catalog_json(namespace: &str, deprecated: &str) -> String {
    format!(
        r#"{{
            "name": "test-catalog",
            "sources": {{ "extensions": ["php"] }},
            "namespace": [{namespace}],
            "deprecated_api": [{deprecated}],
            "config": {{ "file": "plugin.yml", "fields": [] }},
            "detectors": [
                {{
                    "kind": "restructured-event",
                    "patterns": ["InventoryTransactionEvent"],
                    "message": "Found InventoryTransactionEvent usage in {{file}}"
                }}
            ]
        }}"#
    )
}

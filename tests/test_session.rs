// Copyright (C) Brian G. Milnes 2025

//! End-to-end tests for a migration session

mod common;

use apishift::{
    backup_path_for, BackupSkip, FileKind, FileWriter, FsWriter, MigrationError, MigrationSession, Phase, RuleCatalog,
    SessionOptions, ToolLogger, WarningSource,
};
use chrono::{Duration, Local};
use common::{snapshot_files, PluginTree, COMPOSER_JSON, MAIN_PHP, PLAIN_PHP};
use std::fs;
use std::io;
use std::path::Path;

fn session(tree: &PluginTree, options: SessionOptions) -> MigrationSession {
    MigrationSession::new(&tree.root, RuleCatalog::builtin().unwrap(), options).unwrap()
}

fn run(tree: &PluginTree, options: SessionOptions) -> apishift::Report {
    session(tree, options).run(&mut ToolLogger::silent()).unwrap()
}

#[test]
fn test_invalid_root_rejected() {
    let tree = PluginTree::standard();

    let missing = MigrationSession::new(tree.root.join("missing"), RuleCatalog::builtin().unwrap(), SessionOptions::default());
    assert!(matches!(missing, Err(MigrationError::InvalidRoot { .. })));

    let file = MigrationSession::new(tree.root.join("plugin.yml"), RuleCatalog::builtin().unwrap(), SessionOptions::default());
    let err = file.err().unwrap();
    assert!(err.is_fatal());
    assert!(err.to_string().starts_with("Directory does not exist"));
}

#[test]
fn test_new_session_starts_created() {
    let tree = PluginTree::standard();
    let session = session(&tree, SessionOptions::default());

    assert_eq!(session.phase(), Phase::Created);
    assert_eq!(session.root(), fs::canonicalize(&tree.root).unwrap());
}

#[test]
fn test_full_migration() {
    let tree = PluginTree::standard();
    let original = snapshot_files(&tree.root);

    let report = run(&tree, SessionOptions::default());

    assert!(report.is_success());
    assert_eq!(report.files_scanned, 4);
    assert_eq!(report.change_count(), 3);
    let kinds: Vec<FileKind> = report.changes.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![FileKind::Config, FileKind::Source, FileKind::DependencyManifest]);
    assert!(report.changes.iter().all(|c| c.written));

    let plugin_yml = tree.read("plugin.yml");
    assert!(plugin_yml.contains("api: \"5.0.0\""));
    assert!(!plugin_yml.contains("mcpe-protocol"));
    assert!(tree.read("src/demo/Main.php").contains("$player->sendTip(\"hi\");"));
    assert!(tree.read("composer.json").contains("\"pocketmine/pocketmine-mp\": \"^5.0.0\""));
    assert_eq!(tree.read("src/demo/util/Helper.php"), PLAIN_PHP);
    assert_eq!(tree.read("resources/config.yml"), "greeting: hello\n");

    assert_eq!(report.warning_count(), 1);
    let warning = &report.warnings[0];
    assert!(warning.message.contains("sendPopup"));
    assert!(warning.file.ends_with("src/demo/Main.php"));

    let plugin = report.plugin.as_ref().unwrap();
    assert_eq!(plugin.name.as_deref(), Some("DemoPlugin"));
    assert_eq!(plugin.api_versions(), vec!["4.0.0".to_string()]);
    assert_eq!(report.manual_review.len(), 6);

    let backups = tree.backups();
    assert_eq!(backups.len(), 1);
    assert!(report.backup_skipped.is_none());
    assert_eq!(
        report.backup.as_ref().and_then(|b| b.file_name()),
        backups[0].file_name()
    );
    assert_eq!(snapshot_files(&backups[0]), original);
}

#[test]
fn test_second_run_finds_nothing() {
    let tree = PluginTree::standard();
    run(&tree, SessionOptions::default());
    let migrated = snapshot_files(&tree.root);

    let second = run(&tree, SessionOptions::default());

    assert_eq!(second.change_count(), 0);
    assert_eq!(second.warning_count(), 0);
    assert!(second.backup.is_none());
    assert_eq!(second.backup_skipped, Some(BackupSkip::NoChanges));
    assert!(second.to_text().contains("Backup: skipped (no changes to commit)"));
    assert_eq!(tree.backups().len(), 1);
    assert_eq!(snapshot_files(&tree.root), migrated);
}

#[test]
fn test_dry_run_writes_nothing() {
    let tree = PluginTree::standard();
    let original = snapshot_files(&tree.root);

    let report = run(&tree, SessionOptions { dry_run: true, ..SessionOptions::default() });

    assert!(report.dry_run);
    assert_eq!(report.change_count(), 3);
    assert!(report.changes.iter().all(|c| !c.written));
    assert_eq!(report.warning_count(), 1);
    assert!(report.backup.is_none());
    assert!(tree.backups().is_empty());
    assert_eq!(snapshot_files(&tree.root), original);
    assert!(report.to_text().contains("Files that would be modified: 3"));
}

#[test]
fn test_no_backup_still_commits() {
    let tree = PluginTree::standard();

    let report = run(&tree, SessionOptions { backup: false, ..SessionOptions::default() });

    assert_eq!(report.change_count(), 3);
    assert!(report.backup.is_none());
    assert_eq!(report.backup_skipped, Some(BackupSkip::Disabled));
    assert!(report.to_text().contains("Backup: skipped (disabled)"));
    assert!(tree.backups().is_empty());
    assert!(tree.read("plugin.yml").contains("api: \"5.0.0\""));
}

#[test]
fn test_parallel_transform_matches_sequential() {
    let tree_a = PluginTree::standard();
    let tree_b = PluginTree::standard();
    for i in 0..20 {
        let body = if i % 2 == 0 { MAIN_PHP } else { PLAIN_PHP };
        tree_a.write(&format!("src/gen/File{i}.php"), body);
        tree_b.write(&format!("src/gen/File{i}.php"), body);
    }

    let sequential = run(&tree_a, SessionOptions { jobs: Some(1), dry_run: true, ..SessionOptions::default() });
    let parallel = run(&tree_b, SessionOptions { jobs: Some(4), dry_run: true, ..SessionOptions::default() });

    let rel = |report: &apishift::Report, root: &Path| -> Vec<String> {
        let root = fs::canonicalize(root).unwrap();
        report
            .changes
            .iter()
            .map(|c| c.path.strip_prefix(&root).unwrap().display().to_string())
            .collect()
    };
    assert_eq!(rel(&sequential, &tree_a.root), rel(&parallel, &tree_b.root));
    assert_eq!(sequential.change_count(), 13);
    assert_eq!(sequential.warning_count(), parallel.warning_count());
}

/// Fails every write to composer.json, passes the rest to the filesystem
struct ComposerLocked;

impl FileWriter for ComposerLocked {
    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        if path.ends_with("composer.json") {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        FsWriter.write(path, content)
    }
}

#[test]
fn test_write_failure_is_reported_not_fatal() {
    let tree = PluginTree::standard();

    let report = session(&tree, SessionOptions::default())
        .run_with_writer(&ComposerLocked, &mut ToolLogger::silent())
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.write_failures.len(), 1);
    assert!(report.write_failures[0].path.ends_with("composer.json"));
    assert_eq!(report.changes.iter().filter(|c| c.written).count(), 2);
    assert_eq!(tree.read("composer.json"), COMPOSER_JSON);
    assert!(tree.read("src/demo/Main.php").contains("sendTip"));
    assert!(report.to_text().contains("=== Write Failures ==="));
}

#[test]
fn test_backup_failure_aborts_before_commit() {
    let tree = PluginTree::standard();
    let original = snapshot_files(&tree.root);
    let root = fs::canonicalize(&tree.root).unwrap();

    // Occupy every backup name the run could pick
    let now = Local::now();
    for offset in -1..30 {
        let taken = backup_path_for(&root, &(now + Duration::seconds(offset)));
        fs::write(taken, "occupied").unwrap();
    }

    let err = session(&tree, SessionOptions::default())
        .run(&mut ToolLogger::silent())
        .unwrap_err();

    assert!(matches!(err, MigrationError::Backup { .. }));
    assert_eq!(snapshot_files(&tree.root), original);
}

#[test]
fn test_unreadable_file_skipped_with_warning() {
    let tree = PluginTree::standard();
    let bad = tree.root.join("src/demo/Binary.php");
    fs::write(&bad, [0xffu8, 0xfe, 0x00, 0x80]).unwrap();

    let report = run(&tree, SessionOptions::default());

    assert_eq!(report.change_count(), 3);
    let skipped: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| w.source == WarningSource::SkippedFile)
        .collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].file.ends_with("src/demo/Binary.php"));
    assert_eq!(fs::read(&bad).unwrap(), vec![0xffu8, 0xfe, 0x00, 0x80]);
}

#[test]
fn test_vendor_directory_left_alone() {
    let tree = PluginTree::standard();
    tree.write("vendor/pocketmine/Lib.php", MAIN_PHP);

    let report = run(&tree, SessionOptions::default());

    assert_eq!(report.change_count(), 3);
    assert_eq!(tree.read("vendor/pocketmine/Lib.php"), MAIN_PHP);
}

#[test]
fn test_missing_plugin_yml_warns() {
    let tree = PluginTree::empty();
    tree.write("src/Main.php", MAIN_PHP);

    let report = run(&tree, SessionOptions::default());

    assert_eq!(report.change_count(), 1);
    assert!(report.plugin.is_none());
    assert!(report.warnings.iter().any(|w| w.message == "plugin.yml not found"));
}

#[test]
fn test_report_json_has_counts() {
    let tree = PluginTree::standard();
    let report = run(&tree, SessionOptions { dry_run: true, ..SessionOptions::default() });

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["changes"].as_array().unwrap().len(), 3);
    assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(json["warnings"][0]["source"], "deprecated-api");
    assert_eq!(json["plugin"]["name"], "DemoPlugin");
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["backup_skipped"], "dry-run");
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_becomes_skip_warning() {
    use std::os::unix::fs::PermissionsExt;

    let tree = PluginTree::standard();
    tree.write("src/locked/Hidden.php", MAIN_PHP);
    let locked = tree.root.join("src/locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users read through the mode bits; nothing to observe then
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = run(&tree, SessionOptions { dry_run: true, ..SessionOptions::default() });
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let skipped: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| w.source == WarningSource::SkippedFile)
        .collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].file.ends_with("src/locked"));
    assert_eq!(report.change_count(), 3);
}

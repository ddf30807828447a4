//! CLI integration tests for wsbundle.
//!
//! These tests run the binary against small workspaces written to disk.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the wsbundle binary command.
fn wsbundle() -> Command {
    let mut cmd = Command::cargo_bin("wsbundle").unwrap();
    cmd.env_remove("WSBUNDLE_ROOT");
    cmd
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A workspace with two members and a few installed modules:
///
/// ```text
/// @acme/api (packages/api) -> lib (packages/lib) -> chalk
///                          -> lodash
/// ```
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write(
        root,
        "package.json",
        r#"{ "name": "root", "private": true, "workspaces": ["packages/*"] }"#,
    );
    write(
        root,
        "packages/api/package.json",
        r#"{ "name": "@acme/api", "version": "1.0.0", "dependencies": { "lib": "*", "lodash": "^4.17.0" } }"#,
    );
    write(root, "packages/api/index.js", "module.exports = require('lib')");
    write(
        root,
        "packages/lib/package.json",
        r#"{ "name": "lib", "version": "1.0.0", "dependencies": { "chalk": "^4.0.0" } }"#,
    );
    write(
        root,
        "node_modules/chalk/package.json",
        r#"{ "name": "chalk", "version": "4.1.2" }"#,
    );
    write(root, "node_modules/chalk/index.js", "module.exports = {}");
    write(
        root,
        "node_modules/lodash/package.json",
        r#"{ "name": "lodash", "version": "4.17.21" }"#,
    );

    tmp
}

// ============================================================================
// wsbundle package
// ============================================================================

#[test]
fn test_package_writes_zip() {
    let tmp = workspace();

    wsbundle()
        .args(["package", "api"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{64}  ").unwrap())
        .stderr(predicate::str::contains("Finished `@acme/api`"));

    let archive = tmp.path().join("acme-api.zip");
    assert!(archive.is_file());
    assert!(!tmp.path().join("_build").exists());

    let zip = zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
    let names: Vec<&str> = zip.file_names().collect();
    assert!(names.contains(&"index.js"));
    assert!(names.contains(&"node_modules/chalk/index.js"));
    assert!(names.contains(&"node_modules/lodash/package.json"));
}

#[test]
fn test_package_by_manifest_name_from_member_dir() {
    let tmp = workspace();
    let member = tmp.path().join("packages/api");

    wsbundle()
        .args(["package", "@acme/api", "--format", "tar-gz", "-o", "out.tgz"])
        .current_dir(&member)
        .assert()
        .success();

    assert!(member.join("out.tgz").is_file());
}

#[test]
fn test_package_layered_without_archive() {
    let tmp = workspace();

    wsbundle()
        .args(["package", "api", "--layout", "layered", "--no-archive"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let bundle = tmp.path().join("_build").join("acme-api");
    assert!(bundle.join("index.js").is_file());
    assert!(bundle.join("node_modules/chalk/index.js").is_file());
    assert!(!tmp.path().join("acme-api.zip").exists());
}

#[test]
fn test_package_dry_run() {
    let tmp = workspace();

    wsbundle()
        .args(["package", "api", "--dry-run"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 module(s) to copy"))
        .stdout(predicate::str::contains("chalk -> node_modules/chalk"));

    assert!(!tmp.path().join("_build").exists());
    assert!(!tmp.path().join("acme-api.zip").exists());
}

#[test]
fn test_package_uses_project_config() {
    let tmp = workspace();
    write(
        tmp.path(),
        ".wsbundle/config.toml",
        "[package]\nformat = \"tar-gz\"\noutput_dir = \"dist\"\n",
    );

    wsbundle()
        .args(["package", "api"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(tmp.path().join("dist/acme-api.tar.gz").is_file());
}

#[test]
fn test_package_deny_warnings() {
    let tmp = workspace();
    fs::remove_dir_all(tmp.path().join("node_modules/lodash")).unwrap();

    wsbundle()
        .args(["package", "api", "--deny-warnings"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency `lodash` is not installed"))
        .stderr(predicate::str::contains("produced 1 warning(s)"));

    assert!(!tmp.path().join("acme-api.zip").exists());
}

// ============================================================================
// wsbundle list / tree / why
// ============================================================================

#[test]
fn test_list() {
    let tmp = workspace();

    wsbundle()
        .args(["list", "api"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("chalk"))
        .stdout(predicate::str::contains("node_modules/lodash"))
        .stdout(predicate::str::contains("lib").not());
}

#[test]
fn test_list_json() {
    let tmp = workspace();

    let output = wsbundle()
        .args(["list", "api", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let specifiers: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["specifier"].as_str().unwrap())
        .collect();
    assert_eq!(specifiers.len(), 2);
    assert!(specifiers.contains(&"chalk"));
    assert!(specifiers.contains(&"lodash"));
}

#[test]
fn test_list_reports_missing_dependency() {
    let tmp = workspace();
    fs::remove_dir_all(tmp.path().join("node_modules/chalk")).unwrap();

    wsbundle()
        .args(["--no-color", "list", "api"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: dependency `chalk` is not installed",
        ))
        .stderr(predicate::str::contains("required by lib"));
}

#[test]
fn test_tree() {
    let tmp = workspace();

    wsbundle()
        .args(["tree", "api"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("@acme/api\n"))
        .stdout(predicate::str::contains("├── lib (workspace)"))
        .stdout(predicate::str::contains("│   └── chalk"))
        .stdout(predicate::str::contains("└── lodash"));
}

#[test]
fn test_why() {
    let tmp = workspace();

    wsbundle()
        .args(["why", "api", "chalk"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("@acme/api -> lib -> chalk"));
}

#[test]
fn test_why_unknown_dependency() {
    let tmp = workspace();

    wsbundle()
        .args(["why", "api", "react"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("`react` is not a dependency of `@acme/api`"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_package() {
    let tmp = workspace();

    wsbundle()
        .args(["--no-color", "list", "web"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: package `web` was not found"))
        .stderr(predicate::str::contains("available packages: @acme/api (api), lib"));
}

#[test]
fn test_missing_workspaces_field() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "package.json", r#"{ "name": "root" }"#);

    wsbundle()
        .args(["--root", ".", "list", "api"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("`workspaces` field"));
}

#[test]
fn test_no_workspace_root() {
    let tmp = TempDir::new().unwrap();

    wsbundle()
        .args(["list", "api"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find a workspace root"));
}

// ============================================================================
// wsbundle completions
// ============================================================================

#[test]
fn test_completions() {
    wsbundle()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wsbundle"));
}

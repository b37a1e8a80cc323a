//! Command-line behavior of the `seqbind` binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const JAVA_MODEL: &str = include_str!("fixtures/java.json");
const OBJC_MODEL: &str = include_str!("fixtures/objc.json");

fn seqbind(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_seqbind"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_generates_java_bindings() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("classes.json"), JAVA_MODEL).unwrap();

    let output = seqbind(dir.path(), &["--out", "gen/java", "classes.json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Wrote 14 files to gen/java"));

    let out = dir.path().join("gen/java");
    assert!(out.join("classes.c").is_file());
    assert!(out.join("java_proxies.rs").is_file());
    assert!(out.join("java/java/lang/Integer.rs").is_file());
}

#[test]
fn test_generates_objc_bindings_to_default_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("foundation.json"), OBJC_MODEL).unwrap();

    let output = seqbind(dir.path(), &["foundation.json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("gen/interfaces.m").is_file());
    assert!(dir.path().join("gen/objc/mod.rs").is_file());
}

#[test]
fn test_missing_model_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = seqbind(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("No model file specified"));
    assert!(stderr(&output).contains("USAGE:"));
}

#[test]
fn test_unknown_option_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = seqbind(dir.path(), &["--frobnicate", "classes.json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Unknown option: --frobnicate"));
}

#[test]
fn test_unreadable_model_fails() {
    let dir = TempDir::new().unwrap();
    let output = seqbind(dir.path(), &["missing.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error:"));
    assert!(!dir.path().join("gen").exists());
}

#[test]
fn test_java_pkg_resolves_implementations() {
    let dir = TempDir::new().unwrap();
    let model = JAVA_MODEL.replace("\"class\": \"java.lang.Runnable\"", "\"class\": \"Runnable\"");
    fs::write(dir.path().join("classes.json"), model).unwrap();

    let failed = seqbind(dir.path(), &["classes.json"]);
    assert_eq!(failed.status.code(), Some(1));

    let output = seqbind(dir.path(), &["--java-pkg", "java.lang", "classes.json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let proxies = fs::read_to_string(dir.path().join("gen/java_proxies.rs")).unwrap();
    assert!(proxies.contains("register_task();"));
}

#[test]
fn test_config_file_clean_removes_stale_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("classes.json"), JAVA_MODEL).unwrap();
    fs::write(
        dir.path().join("seqbind.toml"),
        "[output]\ndir = \"bindings\"\nclean = true\n\n[logging]\nlevel = \"warn\"\n",
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("bindings")).unwrap();
    fs::write(dir.path().join("bindings/stale.rs"), "// old").unwrap();

    let output = seqbind(dir.path(), &["classes.json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!dir.path().join("bindings/stale.rs").exists());
    assert!(dir.path().join("bindings/classes.h").is_file());
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("classes.json"), JAVA_MODEL).unwrap();

    let output = seqbind(dir.path(), &["--config", "nope.toml", "classes.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error:"));
}

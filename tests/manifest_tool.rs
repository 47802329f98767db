use benchboard::data::default_manifest_path;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_tool(path: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dataset_manifest"))
        .arg(path)
        .env_remove("LOG_DIR")
        .output()
        .unwrap()
}

#[test]
fn writes_manifest_next_to_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scores.csv");
    fs::write(&path, "Test,m1,m2\nt1,0.2,0.4\nt2,0.8,1.4\n").unwrap();

    let out = run_tool(&path);
    assert_eq!(out.status.code(), Some(0));

    let manifest_path = default_manifest_path(&path);
    let manifest: Value = serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["row_count"], 2);
    assert_eq!(manifest["column_count"], 2);
    assert_eq!(manifest["out_of_range"], 1);
    assert!(String::from_utf8_lossy(&out.stdout).contains("wrote manifest"));
}

#[test]
fn load_failure_exits_with_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.csv");

    let out = run_tool(&path);
    assert_eq!(out.status.code(), Some(1));
    assert!(!default_manifest_path(&path).exists());
    assert!(String::from_utf8_lossy(&out.stderr).contains("load failed"));
}

#[test]
fn write_failure_exits_with_2() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scores.csv");
    fs::write(&path, "Test,m1\nt1,0.5\n").unwrap();
    // A directory where the manifest file should go makes the write fail.
    fs::create_dir(default_manifest_path(&path)).unwrap();

    let out = run_tool(&path);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to write"));
}

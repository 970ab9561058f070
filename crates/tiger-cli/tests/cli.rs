use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tiger() -> Command {
    let mut cmd = Command::cargo_bin("tiger").unwrap();
    cmd.env_remove("PGPASSWORD");
    cmd
}

fn dataset(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for ext in ["shp", "shx", "dbf", "prj"] {
        fs::write(dir.join(format!("{name}.{ext}")), b"").unwrap();
    }
}

#[test]
fn test_help_lists_commands() {
    tiger()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("groups"))
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("geographies"));
}

#[test]
fn test_geographies_lists_registry() {
    tiger()
        .arg("geographies")
        .assert()
        .success()
        .stdout(predicate::str::contains("tabblock10"))
        .stdout(predicate::str::contains("block10"))
        .stdout(predicate::str::contains("county_subdivision"));
}

#[test]
fn test_groups_reports_groups_and_skipped_directories() {
    let temp = TempDir::new().unwrap();
    dataset(temp.path(), "tl_2014_41_tract");
    dataset(temp.path(), "tl_2014_53_tract");
    dataset(temp.path(), "tl_2014_41_tabblock10");
    dataset(temp.path(), "tl_2014_41_roads");
    fs::create_dir_all(temp.path().join("notes")).unwrap();

    tiger()
        .args(["groups", "--data-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("tract_2014"))
        .stdout(predicate::str::contains("block10_2014"))
        .stdout(predicate::str::contains("tl_2014_41_tract.shp"))
        .stdout(predicate::str::contains("Unknown geography type 'roads'"))
        .stdout(predicate::str::contains("notes").not());
}

#[test]
fn test_groups_empty_directory() {
    let temp = TempDir::new().unwrap();
    tiger()
        .args(["groups", "--data-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No table groups found."));
}

#[test]
fn test_load_requires_user() {
    tiger()
        .arg("load")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_load_rejects_invalid_schema() {
    let temp = TempDir::new().unwrap();
    tiger()
        .args(["load", "-u", "loader", "-s", "drop table", "--data-dir"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid schema option"));
}

#[test]
fn test_load_reports_connection_failure() {
    let temp = TempDir::new().unwrap();
    dataset(temp.path(), "tl_2014_41_tract");
    tiger()
        .args(["load", "-u", "loader", "-H", "127.0.0.1", "--port", "1", "--data-dir"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect to loader@127.0.0.1:1/census"));
}

#[test]
fn test_fetch_rejects_early_year() {
    let temp = TempDir::new().unwrap();
    tiger()
        .args(["fetch", "-y", "2009", "--download-dir"])
        .arg(temp.path().join("downloads"))
        .arg("--extract-dir")
        .arg(temp.path().join("extracted"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Year 2009 is not available"));
    assert!(!temp.path().join("downloads").exists());
}

#[test]
fn test_fetch_rejects_unknown_state() {
    tiger()
        .args(["fetch", "-s", "ZZ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown state 'ZZ'"));
}

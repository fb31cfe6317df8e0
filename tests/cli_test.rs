mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::TEST_HASH_MEMORY_KIB;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/ops.csv")
        .arg("--hash-memory-kib")
        .arg(TEST_HASH_MEMORY_KIB);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("name,balance"))
        .stdout(predicate::str::contains("alice,880"))
        .stdout(predicate::str::contains("bob,1100"))
        .stderr(predicate::str::contains("insufficient funds"));

    Ok(())
}

#[test]
fn test_cli_json_report() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::new(cargo_bin!())
        .arg("tests/fixtures/ops.csv")
        .arg("--hash-memory-kib")
        .arg(TEST_HASH_MEMORY_KIB)
        .arg("--format")
        .arg("json")
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report[0]["name"], "alice");
    assert_eq!(report[0]["info"]["coins"], 880);
    assert_eq!(report[0]["info"]["inventory"][0]["type"], "cup");
    assert_eq!(report[0]["info"]["coinHistory"]["sent"][0]["toUser"], "bob");
    assert_eq!(report[0]["info"]["coinHistory"]["sent"][1]["toUser"], "");
    assert_eq!(report[1]["name"], "bob");
    assert_eq!(report[1]["info"]["coinHistory"]["received"][0]["fromUser"], "alice");

    Ok(())
}

#[test]
fn test_cli_custom_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let catalog = dir.path().join("catalog.json");
    std::fs::write(&catalog, r#"{"sticker": 5}"#)?;
    let ops = dir.path().join("ops.csv");
    common::write_operations(
        &ops,
        &[
            ["auth", "alice", "pw", "", ""],
            ["buy", "alice", "pw", "sticker", ""],
            ["buy", "alice", "pw", "cup", ""],
        ],
    )?;

    Command::new(cargo_bin!())
        .arg(&ops)
        .arg("--catalog")
        .arg(&catalog)
        .arg("--hash-memory-kib")
        .arg(TEST_HASH_MEMORY_KIB)
        .assert()
        .success()
        .stdout(predicate::str::contains("alice,995"))
        .stderr(predicate::str::contains("item `cup` not found"));

    Ok(())
}

#[test]
fn test_cli_missing_input_fails() {
    Command::new(cargo_bin!())
        .arg("does/not/exist.csv")
        .assert()
        .failure();
}

#[test]
fn test_cli_rejects_zero_timeout() {
    Command::new(cargo_bin!())
        .arg("tests/fixtures/ops.csv")
        .arg("--op-timeout-ms")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--op-timeout-ms"));
}

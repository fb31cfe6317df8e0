mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{TEST_HASH_MEMORY_KIB, write_operations};
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_malformed_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("malformed.csv");
    write_operations(
        &path,
        &[
            ["auth", "alice", "pw", "", ""],
            ["auth", "bob", "pw", "", ""],
            // Unknown operation type
            ["refund", "alice", "pw", "bob", "10"],
            // Text in amount field
            ["send", "alice", "pw", "bob", "lots"],
            // Missing receiver
            ["send", "alice", "pw", "", "10"],
            // Valid transfer
            ["send", "alice", "pw", "bob", "10"],
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("coinshop"));
    cmd.arg(&path).arg("--hash-memory-kib").arg(TEST_HASH_MEMORY_KIB);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading operation"))
        .stdout(predicate::str::contains("alice,990"))
        .stdout(predicate::str::contains("bob,1010"));
}

#[test]
fn test_rejected_operations_do_not_change_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rejected.csv");
    write_operations(
        &path,
        &[
            ["auth", "alice", "pw", "", ""],
            ["auth", "bob", "pw", "", ""],
            // Wrong password
            ["send", "alice", "nope", "bob", "10"],
            // Second sign in with a different password
            ["auth", "alice", "other", "", ""],
            // Non-positive amounts
            ["send", "alice", "pw", "bob", "0"],
            ["send", "alice", "pw", "bob", "-50"],
            // Self transfer
            ["send", "alice", "pw", "alice", "10"],
            // Unknown receiver and item
            ["send", "alice", "pw", "ghost", "10"],
            ["buy", "alice", "pw", "yacht", ""],
            // Never signed in
            ["buy", "mallory", "pw", "cup", ""],
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("coinshop"));
    cmd.arg(&path).arg("--hash-memory-kib").arg(TEST_HASH_MEMORY_KIB);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Operation rejected"))
        .stderr(predicate::str::contains("invalid username or password"))
        .stderr(predicate::str::contains("to itself"))
        .stdout(predicate::str::contains("alice,1000"))
        .stdout(predicate::str::contains("bob,1000"))
        .stdout(predicate::str::contains("mallory").not());
}

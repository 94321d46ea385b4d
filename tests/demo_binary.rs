use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn demo(data: &TempDir, temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("flet-storage-demo").unwrap();
    cmd.env("FLET_APP_STORAGE_DATA", data.path())
        .env("FLET_APP_STORAGE_TEMP", temp.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_demo_walkthrough() {
    let data = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();

    demo(&data, &temp)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Data Storage (2): data.json, hello.txt",
        ))
        .stdout(predicate::str::contains("Temp Storage (1): session.bin"))
        .stdout(predicate::str::contains("hello.txt: Hello, Flet FileSystem!"))
        .stdout(predicate::str::contains("session.bin: 6 bytes decrypted"))
        .stdout(predicate::str::contains("missing.txt: File Not Found"))
        .stdout(predicate::str::contains("Data Storage (1): data.json"));

    assert!(!data.path().join("hello.txt").exists());
    assert!(data.path().join("data.json").exists());
    assert!(temp.path().join(".flet_storage.key").exists());
}

#[test]
fn test_demo_is_rerunnable() {
    let data = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();

    demo(&data, &temp).assert().success();
    // Second run reuses the key and overwrites the sample files
    demo(&data, &temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("session.bin: 6 bytes decrypted"));
}

#[test]
fn test_demo_logs_to_stderr() {
    let data = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();

    demo(&data, &temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Data root").not())
        .stderr(predicate::str::contains("Data root"));
}

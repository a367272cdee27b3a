//! Smoke tests for the command line interface.

use assert_cmd::Command;
use predicates::prelude::*;

fn locsync() -> Command {
    let mut cmd = Command::cargo_bin("locsync").expect("binary builds");
    cmd.env_remove("LOCSYNC_COLLECTION");
    cmd.env_remove("LOCSYNC_EXPORT_FORMAT");
    cmd
}

#[test]
fn help_displays_usage() {
    locsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn scan_lists_the_fixture_layers() {
    locsync()
        .args(["scan", "--doc", "tests/fixtures/card.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Container: Card"))
        .stdout(predicate::str::contains("Subtitle"))
        .stdout(predicate::str::contains("3 text layer(s)"));
}

#[test]
fn scan_json_emits_the_protocol_event() {
    locsync()
        .args(["scan", "--doc", "tests/fixtures/card.json", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"text-layers\""))
        .stdout(predicate::str::contains("\"containerName\": \"Card\""));
}

#[test]
fn sync_writes_variables_back_to_the_document() {
    let temp = tempfile::tempdir().unwrap();
    let doc = temp.path().join("card.json");
    std::fs::copy("tests/fixtures/card.json", &doc).unwrap();

    locsync()
        .arg("sync")
        .arg("--doc")
        .arg(&doc)
        .arg("--all")
        .assert()
        .success()
        .stdout(predicate::str::contains("Collection \"Localized\":"))
        .stdout(predicate::str::contains("Title -> Card/Title_1"));

    let saved = std::fs::read_to_string(&doc).unwrap();
    assert!(saved.contains("Card/Title_1"));
    assert!(saved.contains("Card/Subtitle"));
}

#[test]
fn sync_rejects_conflicting_selection_flags() {
    locsync()
        .args([
            "sync",
            "--doc",
            "tests/fixtures/card.json",
            "--all",
            "--only",
            "Title",
        ])
        .assert()
        .failure();
}

#[test]
fn export_writes_csv_to_a_file() {
    let temp = tempfile::tempdir().unwrap();
    let out = temp.path().join("layers.csv");

    locsync()
        .args(["export", "--doc", "tests/fixtures/card.json", "--output"])
        .arg(&out)
        .assert()
        .success();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("name,content,visible,bound"));
    assert!(written.contains("Subtitle,Bye,true,true"));
}

#[test]
fn serve_answers_scan_requests_over_stdio() {
    locsync()
        .args(["serve", "--doc", "tests/fixtures/card.json"])
        .write_stdin("{\"kind\":\"request-scan\"}\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\":\"text-layers\""))
        .stdout(predicate::str::contains("\"containerName\":\"Card\""));
}

//! Integration tests for the `wikimark` command-line interface.

#[macro_use]
mod prelude;
use std::fs;

use prelude::*;
use tempfile::tempdir;

fn wikimark() -> Command { Command::cargo_bin("wikimark").expect("Failed to create cargo command for wikimark") }

#[test]
fn test_cli_converts_stdin() {
    wikimark()
        .args(["--from", "jira", "--to", "markdown"])
        .write_stdin("h1. Title\n*b*")
        .assert()
        .success()
        .stdout("# Title\n**b**\n");
}

#[test]
fn test_cli_resolves_users_from_arguments() {
    wikimark()
        .args(["--from", "jira", "--to", "markdown", "--user", "42=Ada Lovelace"])
        .write_stdin("cc [~accountid:42]")
        .assert()
        .success()
        .stdout("cc @Ada Lovelace\n");
}

#[test]
fn test_cli_rejects_malformed_user() {
    wikimark()
        .args(["--from", "jira", "--to", "markdown", "--user", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected ID=NAME"));
}

#[test]
fn test_cli_rejects_identical_formats() {
    wikimark()
        .args(["--from", "jira", "--to", "jira"])
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("same format"));
}

#[test]
fn test_cli_rejects_identical_formats_for_files() {
    let dir = tempdir().expect("failed to create temporary directory");
    let path = dir.path().join("page.xml");
    fs::write(&path, "<p>x</p>").expect("failed to write file");
    wikimark()
        .args(["--from", "storage", "--to", "storage", "--in-place"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("same format"));
    assert_eq!(fs::read_to_string(&path).expect("failed to read file"), "<p>x</p>");
}

#[test]
fn test_cli_in_place_requires_files() {
    wikimark()
        .args(["--from", "jira", "--to", "markdown", "--in-place"])
        .assert()
        .failure();
}

#[test]
fn test_cli_version() {
    wikimark()
        .arg("--version")
        .assert()
        .success()
        .stdout(format!("wikimark {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_prints_files_in_order() {
    let dir = tempdir().expect("failed to create temporary directory");
    let paths: Vec<_> = (1..=4)
        .map(|n| {
            let path = dir.path().join(format!("{n}.txt"));
            fs::write(&path, format!("h{n}. Part {n}")).expect("failed to write file");
            path
        })
        .collect();
    wikimark()
        .args(["--from", "jira", "--to", "markdown"])
        .args(&paths)
        .assert()
        .success()
        .stdout("# Part 1\n## Part 2\n### Part 3\n#### Part 4\n");
}

#[test]
fn test_cli_in_place_rewrites_file() {
    let dir = tempdir().expect("failed to create temporary directory");
    let path = dir.path().join("notes.md");
    fs::write(&path, "- **one**\n  - two").expect("failed to write file");
    wikimark()
        .args(["--from", "markdown", "--to", "jira", "--in-place"])
        .arg(&path)
        .assert()
        .success()
        .stdout("");
    assert_eq!(
        fs::read_to_string(&path).expect("failed to read file"),
        "* *one*\n** two\n"
    );
}

#[test]
fn test_cli_jira_to_storage_goes_through_markdown() {
    wikimark()
        .args(["--from", "jira", "--to", "storage"])
        .write_stdin("h2. Plan")
        .assert()
        .success()
        .stdout("<h2>Plan</h2>\n");
}

#[test]
fn test_cli_missing_file_fails() {
    let dir = tempdir().expect("failed to create temporary directory");
    wikimark()
        .args(["--from", "markdown", "--to", "jira"])
        .arg(dir.path().join("absent.md"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

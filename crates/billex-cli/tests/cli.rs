use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BILL: &str = "Total due 45.00 on 12/28/2023 ref AB1234";

/// `billex` with its config file isolated inside `dir`.
fn billex(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("billex").unwrap();
    cmd.env("BILLEX_CONFIG", dir.join("config.json"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn classify_file_as_json() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bill.txt");
    fs::write(&input, BILL).unwrap();

    billex(dir.path())
        .arg("classify")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""mode": "pattern""#))
        .stdout(predicate::str::contains("45.0"))
        .stdout(predicate::str::contains("12/28/2023"))
        .stdout(predicate::str::contains("AB1234"));
}

#[test]
fn classify_stdin_as_text() {
    let dir = TempDir::new().unwrap();

    billex(dir.path())
        .args(["classify", "--format", "text"])
        .write_stdin(BILL)
        .assert()
        .success()
        .stdout(predicate::str::contains("Prices: 45.00"))
        .stdout(predicate::str::contains("Dates:  12/28/2023"))
        .stdout(predicate::str::contains("Others: AB1234"));
}

#[test]
fn classify_text_without_digits_is_empty() {
    let dir = TempDir::new().unwrap();

    billex(dir.path())
        .args(["classify", "--format", "text"])
        .write_stdin("Thank you for your business")
        .assert()
        .success()
        .stdout(predicate::str::contains("Prices: \nDates:  \nOthers: \n"));
}

#[test]
fn classify_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    billex(dir.path())
        .args(["classify", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn classify_uses_configured_markers() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.json"),
        r##"{"extraction": {"currency_markers": "#"}}"##,
    )
    .unwrap();

    billex(dir.path())
        .args(["classify", "--format", "text"])
        .write_stdin("Paid #12 and $34")
        .assert()
        .success()
        .stdout(predicate::str::contains("Others: $34\n"));
}

#[test]
fn config_init_get_set() {
    let dir = TempDir::new().unwrap();

    billex(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    billex(dir.path()).args(["config", "init"]).assert().success();
    assert!(dir.path().join("config.json").exists());

    billex(dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    billex(dir.path())
        .args(["config", "get", "pdf.render_dpi"])
        .assert()
        .success()
        .stdout(predicate::str::diff("655\n"));

    billex(dir.path())
        .args(["config", "set", "extraction.min_digits", "8"])
        .assert()
        .success();

    billex(dir.path())
        .args(["config", "get", "extraction.min_digits"])
        .assert()
        .success()
        .stdout(predicate::str::diff("8\n"));
}

#[test]
fn config_set_rejects_wrong_type() {
    let dir = TempDir::new().unwrap();

    billex(dir.path())
        .args(["config", "set", "pdf.render_dpi", "high"])
        .assert()
        .failure();

    assert!(!dir.path().join("config.json").exists());
}

#[test]
fn process_missing_pdf_fails() {
    let dir = TempDir::new().unwrap();

    billex(dir.path())
        .args(["process", "missing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.pdf", dir.path().display());

    billex(dir.path())
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching PDF files"));
}

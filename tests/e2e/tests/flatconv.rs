//! E2E тесты для CLI инструмента `flatconv`.
//!
//! Тестируем преобразования между раскладками:
//! - delimited (CSV-подобный, с header-строкой)
//! - fixed (фиксированные ширины колонок)
//! и поведение режимов ошибок на битых входах.

use std::fs;

use assert_cmd::Command;
use e2e_tests::fixture;
use predicates::prelude::*;
use tempfile::tempdir;

/// Создать команду для запуска flatconv.
///
/// `cargo_bin` deprecated из-за edge case с custom build directories,
/// но это единственный способ для кросс-крейтовых бинарников.
#[expect(deprecated)]
fn flatconv() -> Command {
    Command::cargo_bin("flatconv").unwrap()
}

// ============================================================================
// Преобразования раскладок
// ============================================================================

#[test]
fn test_csv_to_fixed() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("people.dat");

    flatconv()
        .args([
            "--input",
            fixture("people.csv").to_str().unwrap(),
            "--input-layout",
            "delimited",
            "--output-layout",
            "fixed",
            "--output-widths",
            "4,8,6",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Converted 3 record(s)"));

    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(content, "1   Alice   100   \n2   Bob     250   \n3   Carol   75    \n");
}

#[test]
fn test_fixed_to_csv() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("people.csv");

    flatconv()
        .args([
            "--input",
            fixture("people.dat").to_str().unwrap(),
            "--input-layout",
            "fixed",
            "--widths",
            "4,8,6",
            "--header-lines",
            "0",
            "--output-layout",
            "delimited",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Converted 3 record(s)"));

    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(content, "1,Alice,100\n2,Bob,250\n3,Carol,75\n");
}

#[test]
fn test_csv_roundtrip_through_fixed() {
    let dir = tempdir().unwrap();
    let fixed = dir.path().join("mid.dat");
    let back = dir.path().join("back.csv");

    flatconv()
        .args([
            "-i",
            fixture("people.csv").to_str().unwrap(),
            "--input-layout",
            "delimited",
            "--output-layout",
            "fixed",
            "--output-widths",
            "4,8,6",
            "-o",
            fixed.to_str().unwrap(),
        ])
        .assert()
        .success();

    flatconv()
        .args([
            "-i",
            fixed.to_str().unwrap(),
            "--input-layout",
            "fixed",
            "--widths",
            "4,8,6",
            "--header-lines",
            "0",
            "--output-layout",
            "delimited",
            "-o",
            back.to_str().unwrap(),
        ])
        .assert()
        .success();

    let content = fs::read_to_string(&back).unwrap();
    assert_eq!(content, "1,Alice,100\n2,Bob,250\n3,Carol,75\n");
}

#[test]
fn test_stdin_to_stdout_with_new_delimiter() {
    flatconv()
        .args([
            "--input-layout",
            "delimited",
            "--output-layout",
            "delimited",
            "--output-delimiter",
            ";",
        ])
        .write_stdin("id,name\n1,Alice\n2,Bob\n")
        .assert()
        .success()
        .stdout("id;name\n1;Alice\n2;Bob\n");
}

// ============================================================================
// Режимы ошибок
// ============================================================================

#[test]
fn test_throw_mode_fails_on_bad_record() {
    flatconv()
        .args([
            "-i",
            fixture("bad.csv").to_str().unwrap(),
            "--input-layout",
            "delimited",
            "--output-layout",
            "delimited",
            "--error-mode",
            "throw",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_ignore_mode_drops_bad_record() {
    flatconv()
        .args([
            "-i",
            fixture("bad.csv").to_str().unwrap(),
            "--input-layout",
            "delimited",
            "--output-layout",
            "delimited",
            "--error-mode",
            "ignore",
        ])
        .assert()
        .success()
        .stdout("id,name,amount\n1,Alice,100\n3,Carol,75\n")
        .stderr(predicate::str::contains("Converted 2 record(s)"));
}

#[test]
fn test_save_mode_collects_error_log_as_json() {
    let dir = tempdir().unwrap();
    let errors = dir.path().join("errors.json");

    flatconv()
        .args([
            "-i",
            fixture("bad.csv").to_str().unwrap(),
            "--input-layout",
            "delimited",
            "--output-layout",
            "delimited",
            "--error-mode",
            "save",
            "--errors-json",
            errors.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 record(s) failed to decode"));

    let log = fs::read_to_string(&errors).unwrap();
    assert!(log.contains("\"line_number\": 3"));
    assert!(log.contains("2,Bob"));
}

// ============================================================================
// Ограничение числа записей
// ============================================================================

#[test]
fn test_max_records_bounds_conversion() {
    flatconv()
        .args([
            "-i",
            fixture("people.csv").to_str().unwrap(),
            "--input-layout",
            "delimited",
            "--output-layout",
            "delimited",
            "--max-records",
            "2",
        ])
        .assert()
        .success()
        .stdout("id,name,amount\n1,Alice,100\n2,Bob,250\n")
        .stderr(predicate::str::contains("Converted 2 record(s)"));
}

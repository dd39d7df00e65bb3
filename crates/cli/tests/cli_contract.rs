use assert_cmd::cargo::cargo_bin_cmd;
use doc_model::{Annotation, AnnotationKind, Color, Rect};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use storage::AnnotationsByPage;
use tempfile::TempDir;

fn annotation(page: u32, kind: AnnotationKind) -> Annotation {
    Annotation::new(page, Rect::new(0.1, 0.1, 0.2, 0.05), Color::YELLOW, 0.5, kind)
}

/// Temp dir holding `doc.pdf` and a sidecar with three annotations on pages 1 and 3.
fn fixture() -> (TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = temp.path().join("doc.pdf");
    fs::write(&pdf, b"%PDF-1.4\n%%EOF\n").expect("pdf should be written");

    let annotations = AnnotationsByPage::from([
        (
            1,
            vec![
                annotation(1, AnnotationKind::Highlight),
                annotation(1, AnnotationKind::SequenceNumber { sequence_number: 4 }),
            ],
        ),
        (3, vec![annotation(3, AnnotationKind::Comment { text: "Check totals".to_owned() })]),
    ]);
    storage::save_annotations(&pdf, &annotations).expect("sidecar should be written");
    (temp, pdf)
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should contain valid json")
}

fn sidecar(pdf: &Path) -> PathBuf {
    storage::sidecar_path(pdf).expect("sidecar path")
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("markup-cli")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn summary_emits_stable_json_contract() {
    let (_temp, pdf) = fixture();

    let output = cargo_bin_cmd!("markup-cli")
        .arg("summary")
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = stdout_json(&output);

    assert_eq!(value["version"], 1);
    assert_eq!(value["pages"], 2);
    assert_eq!(value["annotations"], 3);
    assert_eq!(value["byType"]["highlight"], 1);
    assert_eq!(value["byType"]["sequenceNumber"], 1);
    assert_eq!(value["nextSequenceNumber"], 5);
    assert!(value["sidecar"].as_str().is_some_and(|path| path.ends_with(".doc.pdf.annotations.json")));
}

#[test]
fn summary_fails_without_sidecar() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = temp.path().join("bare.pdf");
    fs::write(&pdf, b"%PDF-1.4\n").expect("pdf should be written");

    cargo_bin_cmd!("markup-cli")
        .arg("summary")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no annotations for"));
}

#[test]
fn export_filters_by_page() {
    let (_temp, pdf) = fixture();

    let output = cargo_bin_cmd!("markup-cli")
        .arg("export")
        .arg(&pdf)
        .arg("--page")
        .arg("3")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = stdout_json(&output);

    let items = value.as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "comment");
    assert_eq!(items[0]["text"], "Check totals");
}

#[test]
fn export_writes_output_file() {
    let (temp, pdf) = fixture();
    let output_path = temp.path().join("out/annotations.json");

    cargo_bin_cmd!("markup-cli").arg("export").arg(&pdf).arg("--output").arg(&output_path).assert().success();

    let written = stdout_json(&fs::read(&output_path).expect("export should exist"));
    assert_eq!(written.as_array().map(Vec::len), Some(3));
}

#[test]
fn clear_page_keeps_other_pages() {
    let (_temp, pdf) = fixture();

    cargo_bin_cmd!("markup-cli")
        .arg("clear")
        .arg(&pdf)
        .arg("--page")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 2 from page 1"));

    let remaining = storage::load_annotations(&pdf).expect("load").expect("sidecar present");
    assert_eq!(remaining.keys().copied().collect::<Vec<_>>(), vec![3]);
}

#[test]
fn clear_document_removes_sidecar() {
    let (_temp, pdf) = fixture();

    cargo_bin_cmd!("markup-cli")
        .arg("clear")
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));
    assert!(!sidecar(&pdf).exists());

    cargo_bin_cmd!("markup-cli")
        .arg("clear")
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to remove"));
}

#[test]
fn page_zero_is_rejected() {
    let (_temp, pdf) = fixture();

    cargo_bin_cmd!("markup-cli")
        .arg("export")
        .arg(&pdf)
        .arg("--page")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1-based"));
}

#[test]
fn missing_file_fails() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("markup-cli")
        .arg("summary")
        .arg(temp.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn corrupt_sidecar_reports_context() {
    let (_temp, pdf) = fixture();
    fs::write(sidecar(&pdf), "{not json").expect("overwrite sidecar");

    cargo_bin_cmd!("markup-cli")
        .arg("summary")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read annotations"));
}

#[test]
fn prefs_init_writes_defaults() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    let output = cargo_bin_cmd!("markup-cli")
        .arg("prefs")
        .arg("--root")
        .arg(temp.path())
        .arg("--init")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = stdout_json(&output);
    assert_eq!(value["inkDecimationStep"], 3);
    assert_eq!(value["granularity"], "block");
    assert!(temp.path().join("preferences.json").exists());
}

//! Annotation sidecar next to the PDF: `/dir/name.pdf` -> `/dir/.name.pdf.annotations.json`

use crate::StorageError;
use doc_model::Annotation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const SIDECAR_SCHEMA_VERSION: u32 = 1;

/// Annotations keyed by 1-indexed page.
pub type AnnotationsByPage = BTreeMap<u32, Vec<Annotation>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarFile {
    pub version: u32,
    #[serde(alias = "pdf_path")]
    pub pdf_path: String,
    #[serde(default)]
    pub annotations: AnnotationsByPage,
}

pub fn sidecar_path(pdf: &Path) -> Result<PathBuf, StorageError> {
    let name = pdf.file_name().ok_or_else(|| StorageError::InvalidPath(pdf.to_path_buf()))?;
    let mut sidecar = OsString::from(".");
    sidecar.push(name);
    sidecar.push(".annotations.json");
    Ok(pdf.with_file_name(sidecar))
}

/// Write the sidecar for `pdf`, replacing any previous one atomically.
pub fn save_annotations(
    pdf: &Path,
    annotations: &AnnotationsByPage,
) -> Result<PathBuf, StorageError> {
    let path = sidecar_path(pdf)?;
    let file = SidecarFile {
        version: SIDECAR_SCHEMA_VERSION,
        pdf_path: pdf.display().to_string(),
        annotations: annotations.clone(),
    };
    let bytes = serde_json::to_vec_pretty(&file)?;

    let temp = path.with_extension("json.tmp");
    fs::write(&temp, bytes)?;
    if let Err(error) = fs::rename(&temp, &path) {
        let _ = fs::remove_file(&temp);
        return Err(error.into());
    }

    let count: usize = annotations.values().map(Vec::len).sum();
    tracing::info!(path = %path.display(), count, "annotations saved");
    Ok(path)
}

/// Whole sidecar, or `None` when the PDF has none yet.
pub fn read_sidecar(pdf: &Path) -> Result<Option<SidecarFile>, StorageError> {
    let path = sidecar_path(pdf)?;
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(&path)?;
    let mut file: SidecarFile = serde_json::from_slice(&bytes)?;
    if file.version > SIDECAR_SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion {
            kind: "annotations",
            found: file.version,
            expected: SIDECAR_SCHEMA_VERSION,
        });
    }

    // The page key is authoritative
    for (page, annotations) in file.annotations.iter_mut() {
        for annotation in annotations.iter_mut().filter(|a| a.page != *page) {
            tracing::warn!(
                id = %annotation.id,
                stored = annotation.page,
                page,
                "annotation page mismatch, using key"
            );
            annotation.page = *page;
        }
    }

    Ok(Some(file))
}

pub fn load_annotations(pdf: &Path) -> Result<Option<AnnotationsByPage>, StorageError> {
    Ok(read_sidecar(pdf)?.map(|file| file.annotations))
}

/// Remove the sidecar. Returns whether one existed.
pub fn delete_annotations(pdf: &Path) -> Result<bool, StorageError> {
    let path = sidecar_path(pdf)?;
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path)?;
    tracing::info!(path = %path.display(), "annotations deleted");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{AnnotationKind, Color, Rect};

    fn comment(page: u32, text: &str) -> Annotation {
        Annotation::new(
            page,
            Rect::new(0.1, 0.2, 0.05, 0.05),
            Color::YELLOW,
            1.0,
            AnnotationKind::Comment { text: text.to_owned() },
        )
    }

    #[test]
    fn sidecar_is_hidden_next_to_pdf() {
        let path = sidecar_path(Path::new("/docs/report.pdf")).expect("path");
        assert_eq!(path, PathBuf::from("/docs/.report.pdf.annotations.json"));
        assert!(sidecar_path(Path::new("/")).is_err());
    }

    #[test]
    fn save_then_load_preserves_pages() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let pdf = temp.path().join("plan.pdf");
        let annotations =
            AnnotationsByPage::from([(1, vec![comment(1, "first")]), (3, vec![comment(3, "third")])]);

        let written = save_annotations(&pdf, &annotations).expect("save should succeed");
        assert!(written.exists());
        assert!(!written.with_extension("json.tmp").exists());

        let loaded = load_annotations(&pdf).expect("load should succeed").expect("sidecar present");
        assert_eq!(loaded, annotations);

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(&written).expect("read")).expect("valid json");
        assert_eq!(raw["version"], 1);
        assert!(raw["pdfPath"].as_str().is_some_and(|p| p.ends_with("plan.pdf")));
        assert_eq!(raw["annotations"]["3"][0]["type"], "comment");
    }

    #[test]
    fn missing_sidecar_loads_as_none_and_delete_is_noop() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let pdf = temp.path().join("empty.pdf");

        assert!(load_annotations(&pdf).expect("load should succeed").is_none());
        assert!(!delete_annotations(&pdf).expect("delete should succeed"));

        save_annotations(&pdf, &AnnotationsByPage::new()).expect("save should succeed");
        assert!(delete_annotations(&pdf).expect("delete should succeed"));
        assert!(load_annotations(&pdf).expect("load should succeed").is_none());
    }

    #[test]
    fn snake_case_path_key_is_accepted_and_page_key_wins() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let pdf = temp.path().join("legacy.pdf");
        let stored = comment(5, "moved");
        let body = serde_json::json!({
            "version": 1,
            "pdf_path": pdf.display().to_string(),
            "annotations": { "2": [stored] }
        });
        fs::write(sidecar_path(&pdf).expect("path"), body.to_string()).expect("write");

        let file = read_sidecar(&pdf).expect("read should succeed").expect("sidecar present");
        assert_eq!(file.annotations[&2][0].page, 2);
    }

    #[test]
    fn future_version_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let pdf = temp.path().join("future.pdf");
        fs::write(sidecar_path(&pdf).expect("path"), r#"{"version": 2, "pdfPath": "x", "annotations": {}}"#)
            .expect("write");

        assert!(matches!(load_annotations(&pdf), Err(StorageError::UnsupportedVersion { found: 2, .. })));
    }
}

use directories::ProjectDirs;
use doc_model::OverlayPreferences;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

mod sidecar;

pub use sidecar::{
    delete_annotations, load_annotations, read_sidecar, save_annotations, sidecar_path,
    AnnotationsByPage, SidecarFile, SIDECAR_SCHEMA_VERSION,
};

const PREFS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported {kind} version {found} (expected {expected})")]
    UnsupportedVersion { kind: &'static str, found: u32, expected: u32 },
    #[error("not a file path: {0}")]
    InvalidPath(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreferencesEnvelope {
    version: u32,
    preferences: OverlayPreferences,
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "PdfMarkup", "PdfMarkup")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_preferences(&self) -> Result<OverlayPreferences, StorageError> {
        let path = self.preferences_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no preferences file, using defaults");
            return Ok(OverlayPreferences::default());
        }

        let bytes = fs::read(path)?;
        let envelope: PreferencesEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version > PREFS_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                kind: "preferences",
                found: envelope.version,
                expected: PREFS_SCHEMA_VERSION,
            });
        }

        Ok(envelope.preferences)
    }

    pub fn save_preferences(&self, preferences: &OverlayPreferences) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope =
            PreferencesEnvelope { version: PREFS_SCHEMA_VERSION, preferences: preferences.clone() };

        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(self.preferences_path(), bytes)?;
        tracing::info!(root = %self.root.display(), "preferences saved");
        Ok(())
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.root.join("preferences.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Color, EditGranularity};

    #[test]
    fn preferences_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        let mut prefs = OverlayPreferences {
            min_draw_size: 0.01,
            granularity: EditGranularity::Line,
            ..Default::default()
        };
        prefs.annotation.color = Color::rgb(0, 0, 255);
        prefs.author = Some("Reviewer".to_owned());

        store.save_preferences(&prefs).expect("save should succeed");
        let loaded = store.load_preferences().expect("load should succeed");

        assert_eq!(loaded, prefs);
    }

    #[test]
    fn load_defaults_when_file_absent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        let loaded = store.load_preferences().expect("load should succeed");
        assert_eq!(loaded, OverlayPreferences::default());
    }

    #[test]
    fn newer_envelope_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());
        fs::write(store.preferences_path(), r#"{"version": 9, "preferences": {}}"#).expect("write");

        let error = store.load_preferences().expect_err("future version should fail");
        assert!(matches!(error, StorageError::UnsupportedVersion { found: 9, .. }));
    }
}

//! document::store
//!
//! Reading and writing scene documents on disk.
//!
//! Writes are atomic: the document is serialized to `<file>.tmp`, synced, and
//! renamed over the original. A crash mid-write leaves the previous document
//! intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use super::schema::{parse_document, DocumentError, SceneDocument};

/// A scene document file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Create a store for a document path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the document (used for the scene config).
    pub fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Whether the document exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and validate the document.
    pub fn load(&self) -> Result<SceneDocument, DocumentError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| DocumentError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        parse_document(&contents)
    }

    /// Validate, stamp and write the document atomically.
    pub fn save(&self, doc: &mut SceneDocument) -> Result<(), DocumentError> {
        doc.validate()?;
        doc.saved_at = Utc::now();

        if let Some(parent) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let contents = serde_json::to_string_pretty(doc)
            .map_err(|e| DocumentError::InvalidValue(e.to_string()))?;

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let mut file = fs::File::create(&temp_path).map_err(io_error(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(io_error(&temp_path))?;
        file.sync_all().map_err(io_error(&temp_path))?;
        fs::rename(&temp_path, &self.path).map_err(io_error(&self.path))?;

        debug!(path = %self.path.display(), objects = doc.objects.len(), "scene saved");
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DocumentError {
    let path = path.to_path_buf();
    move |source| DocumentError::Io { path, source }
}

//! document::lock
//!
//! One `mlk` process per scene at a time.
//!
//! Every invocation reads the scene, runs one engine operation and writes
//! the scene back. Holding a [`DocumentLock`] across that read-modify-write
//! keeps a second process from loading a scene that is about to change.
//! The lock is an exclusive `fs2` lock on `<document>.lock`, taken without
//! blocking; the document itself need not exist yet.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentLockError {
    #[error("{} is in use by another mlk process", document.display())]
    Busy { document: PathBuf },

    #[error("cannot create scene directory {}", dir.display())]
    SceneDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open lock file {}", path.display())]
    LockFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot lock {}", path.display())]
    Os {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exclusive hold on a scene document, released on drop.
#[derive(Debug)]
pub struct DocumentLock {
    document: PathBuf,
    path: PathBuf,
    file: File,
}

impl DocumentLock {
    /// `scene.mlk.json` -> `scene.mlk.json.lock`, in the same directory.
    pub fn lock_path(document: &Path) -> PathBuf {
        let mut name = document
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("scene"));
        name.push(".lock");
        document.with_file_name(name)
    }

    /// Take the lock for `document`, creating its directory if needed.
    pub fn acquire(document: &Path) -> Result<Self, DocumentLockError> {
        let path = Self::lock_path(document);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| DocumentLockError::SceneDir {
                dir: dir.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| DocumentLockError::LockFile {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                document: document.to_path_buf(),
                path,
                file,
            }),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(DocumentLockError::Busy {
                document: document.to_path_buf(),
            }),
            Err(source) => Err(DocumentLockError::Os { path, source }),
        }
    }

    /// The scene document this lock guards.
    pub fn document(&self) -> &Path {
        &self.document
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

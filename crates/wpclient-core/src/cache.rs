//! Session cache directory for converted pathways.
//!
//! Layout: `<data-dir>/<cache-subdir>/<id>.r<revision>.gpml`.
//!
//! Entries are never reused: every open writes a fresh file, replacing whatever an earlier
//! fetch of the same `(id, revision)` left behind. The whole directory is created when the
//! session starts and removed when it ends.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::defaults;
use crate::model::LocalDocumentModel;

#[derive(Debug, Clone)]
pub struct DocumentCache {
    dir: PathBuf,
}

impl DocumentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic cache path for a resolved pathway id and revision.
    ///
    /// Path separators in the id are replaced so the entry always stays inside the cache.
    pub fn entry_path(&self, id: &str, revision: u64) -> PathBuf {
        let safe: String = id
            .chars()
            .map(|c| if c == '/' || c == '\\' || c == '\0' { '_' } else { c })
            .collect();
        self.dir
            .join(format!("{safe}.r{revision}.{}", defaults::CACHE_EXT))
    }

    /// Create the cache directory (and parents).
    pub async fn create(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Write a converted document to its entry, replacing prior content.
    pub async fn write(
        &self,
        id: &str,
        revision: u64,
        model: &LocalDocumentModel,
    ) -> io::Result<PathBuf> {
        let path = self.entry_path(id, revision);
        tokio::fs::write(&path, model.to_bytes()).await?;
        debug!(path = %path.display(), bytes = model.gpml.len(), "wrote cache entry");
        Ok(path)
    }

    /// True if `path` lies inside this cache directory.
    ///
    /// Comparison is lexical after dropping `.` components, so it works for files that no
    /// longer exist.
    pub fn contains(&self, path: &Path) -> bool {
        fn norm(p: &Path) -> Vec<Component<'_>> {
            p.components().filter(|c| !matches!(c, Component::CurDir)).collect()
        }
        let dir = norm(&self.dir);
        let candidate = norm(path);
        candidate.len() > dir.len()
            && candidate.starts_with(&dir)
            && !candidate.contains(&Component::ParentDir)
    }

    /// Recursively remove the cache directory. A missing directory is not an error.
    pub async fn teardown(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

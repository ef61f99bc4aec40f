//! Recovering clip file names from open file descriptors.
//!
//! The navigation library opens `BDMV/STREAM/*.m2ts` files itself and never
//! says which. After seeking into a clip, the one of our open descriptors
//! that points at a stream file tells us the clip's name.

use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Index of an entry in a [`ClipNameTable`].
pub type ClipNameId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClipFile {
    dev: u64,
    ino: u64,
    name: String,
}

/// File identity to name map of one disc's stream directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipNameTable {
    files: Vec<ClipFile>,
}

impl ClipNameTable {
    /// Scan `<disc_root>/BDMV/STREAM`.
    ///
    /// Returns `None` if the directory cannot be read; names are a
    /// best-effort annotation.
    pub fn scan(disc_root: &Path) -> Option<Self> {
        let dir = disc_root.join("BDMV").join("STREAM");
        if !dir.is_dir() {
            tracing::warn!("No stream directory at {}; clip names disabled", dir.display());
            return None;
        }
        let mut files = Vec::new();

        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Cannot scan {} for clip names: {e}", dir.display());
                    return None;
                }
            };
            let Some((dev, ino)) = entry.metadata().ok().and_then(|m| file_id(&m)) else {
                tracing::warn!("Cannot stat {}", entry.path().display());
                return None;
            };
            files.push(ClipFile {
                dev,
                ino,
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }

        tracing::debug!(dir = %dir.display(), clips = files.len(), "Scanned clip names");
        Some(Self { files })
    }

    /// Find the first descriptor in `fd_dir` (normally `/proc/self/fd`)
    /// that refers to a file of this table.
    ///
    /// Descriptors that vanish while the directory is listed are skipped.
    pub fn resolve_open_files(&self, fd_dir: &Path) -> io::Result<Option<ClipNameId>> {
        if self.files.is_empty() {
            return Ok(None);
        }
        for entry in std::fs::read_dir(fd_dir)? {
            let entry = entry?;
            let meta = match std::fs::metadata(entry.path()) {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            let Some(id) = file_id(&meta) else {
                continue;
            };
            if let Some(pos) = self.files.iter().position(|f| (f.dev, f.ino) == id) {
                return Ok(Some(pos));
            }
        }
        Ok(None)
    }

    /// Name of entry `id`.
    pub fn name(&self, id: ClipNameId) -> Option<&str> {
        self.files.get(id).map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All names in directory order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }
}

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    None
}

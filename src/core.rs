use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::EntryType;

pub mod utils;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Node attributes reported by [`FsBackend::stat`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub entry_type: EntryType,
    /// Content length in bytes; `0` for directories.
    pub size: u64,
    pub modified: SystemTime,
    /// Permission bits (`0o7777` mask).
    pub mode: u32,
}

impl Stat {
    /// Seconds since the Unix epoch, clamped to zero for pre-epoch times.
    pub fn timestamp(&self) -> u64 {
        self.modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// The tree-engine contract shared by every storage backend.
///
/// All paths are *inner* paths: they are resolved against the backend root `/`
/// and normalized (`.`, `..` and redundant separators removed) before use, so
/// `docs/a.txt`, `/docs/a.txt` and `/docs/./a.txt` address the same node.
pub trait FsBackend {
    /// Returns the root path the backend is anchored to.
    fn root(&self) -> &Path;

    /// Returns the host path matching `inner_path`.
    fn to_host<P: AsRef<Path>>(&self, inner_path: P) -> Result<PathBuf>;

    fn exists<P: AsRef<Path>>(&self, path: P) -> bool;
    fn is_dir<P: AsRef<Path>>(&self, path: P) -> Result<bool>;
    fn is_file<P: AsRef<Path>>(&self, path: P) -> Result<bool>;

    /// Immediate children of a directory, sorted by path.
    fn ls<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>>;

    /// All descendants of a directory, sorted by path (parents before children).
    fn tree<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>>;

    /// Creates a directory and any missing parents with permission bits `mode`.
    fn mkdir<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> Result<()>;

    /// Creates a new file; missing parents are created as well.
    fn mkfile<P: AsRef<Path>>(&mut self, path: P, content: Option<&[u8]>, mode: u32)
    -> Result<()>;

    fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>>;

    /// Opens a file for streaming reads. The handle is released on drop.
    fn reader<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Read>>;

    /// Replaces the content of an existing file.
    fn write<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()>;

    /// Appends to an existing file.
    fn append<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()>;

    /// Removes a node and, for directories, everything below it.
    fn rm<P: AsRef<Path>>(&mut self, path: P) -> Result<()>;

    /// Removes a single file or link node. Directories are refused.
    fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()>;

    /// Removes an empty directory.
    fn rmdir<P: AsRef<Path>>(&mut self, path: P) -> Result<()>;

    /// Moves a node (with its subtree) to a path that does not exist yet.
    /// Either the move happens completely or nothing changes.
    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()>;

    /// Copies a file. An existing file at `to` is overwritten.
    fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()>;

    fn stat<P: AsRef<Path>>(&self, path: P) -> Result<Stat>;

    fn set_mode<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> Result<()>;

    /// Resolves `path` to its canonical inner form, following links in its
    /// parent chain. Backends without a notion of canonical paths return an error.
    fn canonicalize<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf>;

    /// Removes all artifacts but preserves the root.
    fn cleanup(&mut self) -> bool;
}

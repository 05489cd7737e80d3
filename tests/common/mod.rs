#![allow(dead_code)]

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use vfs_adapter::{AdapterSettings, FsBackend, MapFS, PosixAdapter, Result, Stat};

/// Path fragment that makes every content primitive of [`FailingFs`] fail.
pub const FAIL_MARKER: &str = "pleasefail";

/// An in-memory backend whose reads and writes fail for marked paths.
#[derive(Debug, Default)]
pub struct FailingFs {
    inner: MapFS,
}

impl FailingFs {
    fn guard(path: &Path) -> Result<()> {
        if path.to_string_lossy().contains(FAIL_MARKER) {
            return Err(anyhow!("simulated I/O failure on {}", path.display()));
        }
        Ok(())
    }
}

impl FsBackend for FailingFs {
    fn root(&self) -> &Path {
        self.inner.root()
    }

    fn to_host<P: AsRef<Path>>(&self, inner_path: P) -> Result<PathBuf> {
        self.inner.to_host(inner_path)
    }

    fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.inner.exists(path)
    }

    fn is_dir<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        self.inner.is_dir(path)
    }

    fn is_file<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        self.inner.is_file(path)
    }

    fn ls<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>> {
        self.inner.ls(path)
    }

    fn tree<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>> {
        self.inner.tree(path)
    }

    fn mkdir<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> Result<()> {
        self.inner.mkdir(path, mode)
    }

    fn mkfile<P: AsRef<Path>>(&mut self, path: P, content: Option<&[u8]>, mode: u32) -> Result<()> {
        Self::guard(path.as_ref())?;
        self.inner.mkfile(path, content, mode)
    }

    fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        Self::guard(path.as_ref())?;
        self.inner.read(path)
    }

    fn reader<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Read>> {
        Self::guard(path.as_ref())?;
        self.inner.reader(path)
    }

    fn write<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        Self::guard(path.as_ref())?;
        self.inner.write(path, content)
    }

    fn append<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        Self::guard(path.as_ref())?;
        self.inner.append(path, content)
    }

    fn rm<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.inner.rm(path)
    }

    fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.inner.remove_file(path)
    }

    fn rmdir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.inner.rmdir(path)
    }

    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        self.inner.rename(from, to)
    }

    fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        self.inner.copy(from, to)
    }

    fn stat<P: AsRef<Path>>(&self, path: P) -> Result<Stat> {
        self.inner.stat(path)
    }

    fn set_mode<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> Result<()> {
        self.inner.set_mode(path, mode)
    }

    fn canonicalize<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        self.inner.canonicalize(path)
    }

    fn cleanup(&mut self) -> bool {
        self.inner.cleanup()
    }
}

/// An adapter over [`FailingFs`] that removes nodes as addressed.
#[derive(Debug, Default)]
pub struct FailingAdapter {
    fs: FailingFs,
    settings: AdapterSettings,
}

impl PosixAdapter for FailingAdapter {
    type Backend = FailingFs;

    fn backend(&self) -> &FailingFs {
        &self.fs
    }

    fn backend_mut(&mut self) -> &mut FailingFs {
        &mut self.fs
    }

    fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    fn delete_file_node(&mut self, path: &Path) -> Result<()> {
        self.fs.remove_file(path)
    }
}

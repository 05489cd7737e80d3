use std::path::Path;

use super::{AdapterSettings, PosixAdapter};
use crate::error::AdapterResult;
use crate::vfs::DirFS;

/// A [`PosixAdapter`] over a real host directory.
///
/// Uses the default directory enforcement and deletion hooks. Written files
/// outlive the adapter; switch auto-clean on through [`fs_mut`](Self::fs_mut)
/// to have everything it created removed on drop.
pub struct LocalAdapter {
    fs: DirFS,
    settings: AdapterSettings,
}

impl LocalAdapter {
    pub fn new<P: AsRef<Path>>(root: P, settings: AdapterSettings) -> AdapterResult<Self> {
        let mut fs = DirFS::new(root)?;
        fs.set_auto_clean(false);
        Ok(Self { fs, settings })
    }

    pub fn fs(&self) -> &DirFS {
        &self.fs
    }

    pub fn fs_mut(&mut self) -> &mut DirFS {
        &mut self.fs
    }
}

impl PosixAdapter for LocalAdapter {
    type Backend = DirFS;

    fn backend(&self) -> &DirFS {
        &self.fs
    }

    fn backend_mut(&mut self) -> &mut DirFS {
        &mut self.fs
    }

    fn settings(&self) -> &AdapterSettings {
        &self.settings
    }
}

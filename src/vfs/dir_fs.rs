//! A backend over a real host directory, used by the local disk adapter.
//!
//! Inner paths are confined to the root. Nodes created through the backend are
//! tracked and, with auto-clean on, removed again on drop.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::anyhow;
use tracing::warn;

use crate::EntryType;
use crate::core::{FsBackend, Result, Stat, utils};

/// [`FsBackend`] over a host directory.
///
/// Every query goes to the host, so changes made behind its back are visible.
/// Links are never followed by `rm()`, which removes the link itself, while
/// `canonicalize()` resolves the parent chain and refuses anything that ends up
/// outside the root. Permission bits are applied on unix only.
///
/// ### Example:
/// ```
/// use vfs_adapter::{DirFS, FsBackend};
///
/// let root = std::env::temp_dir().join("vfs_adapter_doc");
///
/// let mut fs = DirFS::new(&root).unwrap();
/// fs.mkdir("/docs", 0o755).unwrap();
/// fs.mkfile("/docs/note.txt", Some(b"Hello"), 0o644).unwrap();
/// assert!(fs.exists("/docs/note.txt"));
///
/// fs.rm("/docs/note.txt").unwrap();
/// ```
pub struct DirFS {
    root: PathBuf,                      // host-related absolute normalized path
    created: BTreeSet<PathBuf>,         // inner absolute normalized paths
    created_root_parents: Vec<PathBuf>, // host-related absolute normalized paths
    is_auto_clean: bool,
}

impl DirFS {
    /// Creates a new DirFS instance with the root directory at `path`.
    /// Checks permissions to create and write into `path`.
    /// * `path` is an absolute host path. If path not exists it will be created.
    /// If `path` is not absolute or path is not a directory, error returns.
    /// By default, the `is_auto_clean` flag is set to `true`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();

        if root.as_os_str().is_empty() {
            return Err(anyhow!("invalid root path: empty"));
        }
        if root.is_relative() {
            return Err(anyhow!("the root path must be absolute"));
        }
        if root.exists() && !root.is_dir() {
            return Err(anyhow!("{:?} is not a directory", root));
        }

        let root = utils::normalize(root);

        let mut created_root_parents = Vec::new();
        if !std::fs::exists(&root)? {
            created_root_parents.extend(Self::mkdir_all(&root)?);
        }

        if !Self::check_permissions(&root) {
            return Err(anyhow!("Access denied: {:?}", root));
        }

        Ok(Self {
            root,
            created: BTreeSet::new(),
            created_root_parents,
            is_auto_clean: true,
        })
    }

    /// Changes auto-clean flag.
    /// If auto-clean flag is true all created in vfs artifacts
    /// will be removed on drop.
    pub fn set_auto_clean(&mut self, clean: bool) {
        self.is_auto_clean = clean;
    }

    fn to_inner<P: AsRef<Path>>(&self, inner_path: P) -> PathBuf {
        utils::normalize(Path::new("/").join(inner_path))
    }

    fn host_meta(&self, inner: &Path) -> Result<std::fs::Metadata> {
        let host = self.to_host(inner)?;
        std::fs::symlink_metadata(&host).map_err(|_| anyhow!("{} does not exist", inner.display()))
    }

    /// Make directories recursively.
    /// * `path` is an absolute host path.
    /// Returns vector of created directories.
    fn mkdir_all<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
        let host_path = path.as_ref().to_path_buf();

        // Looking for the first existing parent
        let mut existed_part = host_path.clone();
        while let Some(parent) = existed_part.parent() {
            existed_part = parent.to_path_buf();
            if std::fs::exists(&existed_part)? {
                break;
            }
        }

        let need_to_create: Vec<_> = host_path
            .strip_prefix(&existed_part)?
            .components()
            .collect();

        let mut created = Vec::new();
        let mut built = existed_part;
        for component in need_to_create {
            built.push(component);
            if !std::fs::exists(&built)? {
                std::fs::create_dir(&built)?;
                created.push(built.clone());
            }
        }

        Ok(created)
    }

    /// Checks writability with a freshly created file; existing names are never touched.
    fn check_permissions<P: AsRef<Path>>(path: P) -> bool {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        for attempt in 0..16u32 {
            let marker = path.as_ref().join(format!(
                ".vfs-access-{}-{nanos:x}-{attempt}",
                std::process::id()
            ));
            match OpenOptions::new().write(true).create_new(true).open(&marker) {
                Ok(_) => return std::fs::remove_file(&marker).is_ok(),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(_) => return false,
            }
        }
        false
    }

    fn forget_prefix(&mut self, inner: &Path) {
        self.created.retain(|p| !p.starts_with(inner));
    }

    fn walk(&self, inner: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        for child in self.ls(inner)? {
            let is_dir = self.host_meta(&child)?.is_dir();
            out.push(child.clone());
            if is_dir {
                self.walk(&child, out)?;
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn apply_mode(host: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(host, std::fs::Permissions::from_mode(mode & 0o7777))?;
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(host: &Path, mode: u32) -> Result<()> {
    let mut permissions = std::fs::metadata(host)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    std::fs::set_permissions(host, permissions)?;
    Ok(())
}

#[cfg(unix)]
fn mode_of(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(meta: &std::fs::Metadata) -> u32 {
    match (meta.is_dir(), meta.permissions().readonly()) {
        (true, false) => 0o755,
        (true, true) => 0o555,
        (false, false) => 0o644,
        (false, true) => 0o444,
    }
}

impl FsBackend for DirFS {
    /// Returns root path related to the host file system.
    fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Returns the path on the host system that matches the specified internal path.
    fn to_host<P: AsRef<Path>>(&self, inner_path: P) -> Result<PathBuf> {
        let inner = self.to_inner(inner_path);
        Ok(self.root.join(inner.strip_prefix("/")?))
    }

    /// Checks if a `path` exists on the host, inside the VFS root.
    /// Dangling links exist too.
    fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        let inner = self.to_inner(path);
        self.host_meta(&inner).is_ok()
    }

    fn is_dir<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let inner = self.to_inner(path);
        Ok(self.host_meta(&inner)?.is_dir())
    }

    fn is_file<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let inner = self.to_inner(path);
        Ok(self.host_meta(&inner)?.is_file())
    }

    /// Lists the immediate children of a host directory as inner paths, sorted.
    fn ls<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>> {
        let inner = self.to_inner(path);
        if !self.host_meta(&inner)?.is_dir() {
            return Err(anyhow!("{} is not a directory", inner.display()));
        }
        let mut children = Vec::new();
        for entry in std::fs::read_dir(self.to_host(&inner)?)? {
            children.push(inner.join(entry?.file_name()));
        }
        children.sort();
        Ok(children)
    }

    /// Recursive listing; links to directories are reported but not descended into.
    fn tree<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>> {
        let inner = self.to_inner(path);
        let mut out = Vec::new();
        self.walk(&inner, &mut out)?;
        Ok(out)
    }

    /// Creates directory and all it parents, if necessary.
    fn mkdir<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> Result<()> {
        if path.as_ref().as_os_str().is_empty() {
            return Err(anyhow!("invalid path: empty"));
        }
        let inner = self.to_inner(path);
        if self.exists(&inner) {
            return Err(anyhow!("path already exists: {}", inner.display()));
        }

        let host = self.to_host(&inner)?;
        for created in Self::mkdir_all(&host)? {
            apply_mode(&created, mode)?;
            let suffix = created.strip_prefix(&self.root)?;
            self.created.insert(Path::new("/").join(suffix));
        }
        Ok(())
    }

    /// Creates new file on the host. Missing parents are created with mode `0o755`.
    fn mkfile<P: AsRef<Path>>(
        &mut self,
        file_path: P,
        content: Option<&[u8]>,
        mode: u32,
    ) -> Result<()> {
        let file_path = self.to_inner(file_path);
        if self.exists(&file_path) {
            return Err(anyhow!("{} already exist", file_path.display()));
        }
        if let Some(parent) = file_path.parent() {
            if !self.exists(parent) {
                self.mkdir(parent, crate::vfs::DEFAULT_DIR_MODE)?;
            }
        }
        let host = self.to_host(&file_path)?;
        let mut fd = File::create(&host)?;
        self.created.insert(file_path);
        if let Some(content) = content {
            fd.write_all(content)?;
        }
        apply_mode(&host, mode)
    }

    fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let inner = self.to_inner(path);
        if !self.host_meta(&inner)?.is_file() {
            return Err(anyhow!("{} is not a regular file", inner.display()));
        }
        let mut content = Vec::new();
        File::open(self.to_host(&inner)?)?.read_to_end(&mut content)?;
        Ok(content)
    }

    fn reader<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Read>> {
        let inner = self.to_inner(path);
        if !self.host_meta(&inner)?.is_file() {
            return Err(anyhow!("{} is not a regular file", inner.display()));
        }
        let file = File::open(self.to_host(&inner)?)?;
        Ok(Box::new(BufReader::new(file)))
    }

    /// Writes bytes to an existing file, replacing its entire contents.
    /// The file retains its original permissions.
    fn write<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        let inner = self.to_inner(path);
        if !self.host_meta(&inner)?.is_file() {
            return Err(anyhow!("{} is not a regular file", inner.display()));
        }
        std::fs::write(self.to_host(&inner)?, content)?;
        Ok(())
    }

    fn append<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        let inner = self.to_inner(path);
        if !self.host_meta(&inner)?.is_file() {
            return Err(anyhow!("{} is not a regular file", inner.display()));
        }
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.to_host(&inner)?)?;
        file.write_all(content)?;
        Ok(())
    }

    /// Removes a file or directory at the specified path.
    /// If the path is a directory, all its contents are removed recursively.
    fn rm<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if path.as_ref().as_os_str().is_empty() {
            return Err(anyhow!("invalid path: empty"));
        }
        let inner = self.to_inner(path);
        if utils::is_virtual_root(&inner) {
            return Err(anyhow!("invalid path: the root cannot be removed"));
        }
        if !self.exists(&inner) {
            return Err(anyhow!("{} does not exist", inner.display()));
        }
        utils::rm_on_host(self.to_host(&inner)?)?;
        self.forget_prefix(&inner);
        Ok(())
    }

    fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let inner = self.to_inner(path);
        if self.host_meta(&inner)?.is_dir() {
            return Err(anyhow!("{} is a directory", inner.display()));
        }
        std::fs::remove_file(self.to_host(&inner)?)?;
        self.created.remove(&inner);
        Ok(())
    }

    fn rmdir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let inner = self.to_inner(path);
        if utils::is_virtual_root(&inner) {
            return Err(anyhow!("invalid path: the root cannot be removed"));
        }
        if !self.host_meta(&inner)?.is_dir() {
            return Err(anyhow!("{} is not a directory", inner.display()));
        }
        std::fs::remove_dir(self.to_host(&inner)?)?;
        self.created.remove(&inner);
        Ok(())
    }

    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let from = self.to_inner(from);
        let to = self.to_inner(to);
        if utils::is_virtual_root(&from) {
            return Err(anyhow!("invalid path: the root cannot be moved"));
        }
        self.host_meta(&from)?;
        if self.exists(&to) {
            return Err(anyhow!("{} already exist", to.display()));
        }
        std::fs::rename(self.to_host(&from)?, self.to_host(&to)?)?;

        let moved: Vec<PathBuf> = self
            .created
            .iter()
            .filter(|p| p.starts_with(&from))
            .cloned()
            .collect();
        for old in moved {
            self.created.remove(&old);
            self.created.insert(to.join(old.strip_prefix(&from)?));
        }
        Ok(())
    }

    fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let from = self.to_inner(from);
        let to = self.to_inner(to);
        if !self.host_meta(&from)?.is_file() {
            return Err(anyhow!("{} is not a regular file", from.display()));
        }
        let existed = self.exists(&to);
        std::fs::copy(self.to_host(&from)?, self.to_host(&to)?)?;
        if !existed {
            self.created.insert(to);
        }
        Ok(())
    }

    fn stat<P: AsRef<Path>>(&self, path: P) -> Result<Stat> {
        let inner = self.to_inner(path);
        let meta = self.host_meta(&inner)?;
        let entry_type = if meta.file_type().is_symlink() {
            EntryType::Symlink
        } else if meta.is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        };
        Ok(Stat {
            entry_type,
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            mode: mode_of(&meta),
        })
    }

    fn set_mode<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> Result<()> {
        let inner = self.to_inner(path);
        self.host_meta(&inner)?;
        apply_mode(&self.to_host(&inner)?, mode)
    }

    /// Resolves links in the parent chain of `path` on the host and maps the result back to
    /// an inner path. Paths resolving outside the root are rejected.
    fn canonicalize<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let inner = self.to_inner(path);
        let host = self.to_host(&inner)?;
        let (Some(parent), Some(name)) = (host.parent(), host.file_name()) else {
            return Ok(inner);
        };
        let root = self.root.canonicalize()?;
        let resolved = parent.canonicalize()?.join(name);
        let suffix = resolved
            .strip_prefix(&root)
            .map_err(|_| anyhow!("{} resolves outside of the vfs root", inner.display()))?;
        Ok(Path::new("/").join(suffix))
    }

    /// Removes all artifacts (dirs and files) created by the vfs, but preserve its root.
    fn cleanup(&mut self) -> bool {
        let mut is_ok = true;

        for entry in std::mem::take(&mut self.created).into_iter().rev() {
            let Ok(host) = self.to_host(&entry) else {
                continue;
            };
            if std::fs::symlink_metadata(&host).is_err() {
                continue;
            }
            if let Err(e) = utils::rm_on_host(&host) {
                is_ok = false;
                warn!(path = %host.display(), error = %e, "unable to remove vfs artifact");
                self.created.insert(entry);
            }
        }

        is_ok
    }
}

impl Drop for DirFS {
    fn drop(&mut self) {
        if !self.is_auto_clean {
            return;
        }

        self.cleanup();

        let errors: Vec<_> = self
            .created_root_parents
            .iter()
            .rev()
            .filter_map(|p| utils::rm_on_host(p).err())
            .collect();
        if !errors.is_empty() {
            warn!(?errors, "failed to remove created root parents");
        }

        self.created_root_parents.clear();
    }
}

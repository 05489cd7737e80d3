//! Lifecycle of the in-memory trees backing virtual adapters.
//!
//! A [`MountRegistry`] is the namespace in which mount labels must be unique.
//! Every [`VirtualMount`] registers its label on creation and releases it when
//! dropped, so teardown is deterministic and nothing lives in a process-wide
//! singleton.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::config::{AdapterConfig, DirStructure, PermissionMap, StructureNode};
use crate::core::FsBackend;
use crate::error::{AdapterError, AdapterResult};
use crate::vfs::MapFS;

/// Opaque identifier of a mount within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MountId(u64);

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    labels: BTreeMap<String, MountId>,
}

/// A namespace of mount labels. Cloning shares the namespace.
#[derive(Debug, Clone, Default)]
pub struct MountRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a mount with `label` is alive in this registry.
    pub fn is_mounted(&self, label: &str) -> bool {
        self.lock().labels.contains_key(label)
    }

    /// Labels of all live mounts, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.lock().labels.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // The state is a plain map; a panic elsewhere cannot leave it half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn register(&self, label: &str) -> AdapterResult<MountId> {
        if label.is_empty() || label.contains('/') {
            return Err(AdapterError::Mount(format!(
                "invalid mount label {label:?}"
            )));
        }
        let mut state = self.lock();
        if state.labels.contains_key(label) {
            return Err(AdapterError::Mount(format!(
                "mount label {label:?} is already in use"
            )));
        }
        state.next_id += 1;
        let id = MountId(state.next_id);
        state.labels.insert(label.to_string(), id);
        Ok(id)
    }

    fn release(&self, label: &str, id: MountId) {
        let mut state = self.lock();
        if state.labels.get(label) == Some(&id) {
            state.labels.remove(label);
        }
    }
}

/// Identifies one generation of a mounted tree.
///
/// Remounting keeps the id and label but bumps the generation; a handle from an
/// earlier generation no longer matches [`VirtualMount::handle`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountHandle {
    id: MountId,
    label: String,
    generation: u64,
}

impl MountHandle {
    pub fn id(&self) -> MountId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mount-point locator, e.g. `vfs://root`.
    pub fn url(&self) -> String {
        format!("vfs://{}", self.label)
    }
}

impl fmt::Display for MountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.url(), self.generation)
    }
}

/// An in-memory tree mounted under a label.
#[derive(Debug)]
pub struct VirtualMount {
    handle: MountHandle,
    registry: MountRegistry,
    root_mode: u32,
    permissions: PermissionMap,
    fs: MapFS,
}

impl VirtualMount {
    /// Creates the root named `dir_name` with `dir_permissions` and materializes
    /// `dir_structure` below it.
    pub fn mount(registry: &MountRegistry, config: &AdapterConfig) -> AdapterResult<Self> {
        let id = registry.register(&config.dir_name)?;
        let mut mount = Self {
            handle: MountHandle {
                id,
                label: config.dir_name.clone(),
                generation: 0,
            },
            registry: registry.clone(),
            root_mode: config.dir_permissions,
            permissions: config.permissions,
            fs: MapFS::new(),
        };
        mount.fs = mount.build(&config.dir_structure)?;
        info!(mount = %mount.handle, "mounted virtual filesystem");
        Ok(mount)
    }

    /// Replaces the whole tree with one built from `structure`.
    ///
    /// Paths of the previous tree are gone afterwards; nothing is carried over.
    pub fn remount(&mut self, structure: &DirStructure) -> AdapterResult<()> {
        let fs = self.build(structure)?;
        self.fs = fs;
        self.handle.generation += 1;
        info!(mount = %self.handle, "remounted virtual filesystem");
        Ok(())
    }

    /// Copies the host directory tree at `host_dir` into the mount root.
    ///
    /// Files larger than `max_file_size` bytes are created empty. On unix the
    /// host permission bits are kept; elsewhere the public modes are used.
    pub fn copy_from_host<P: AsRef<Path>>(
        &mut self,
        host_dir: P,
        max_file_size: u64,
    ) -> AdapterResult<()> {
        let host_dir = host_dir.as_ref();
        if !host_dir.is_dir() {
            return Err(AdapterError::Mount(format!(
                "{} is not a directory",
                host_dir.display()
            )));
        }
        self.copy_dir(host_dir, Path::new("/"), max_file_size)?;
        debug!(mount = %self.handle, source = %host_dir.display(), "seeded from host");
        Ok(())
    }

    pub fn handle(&self) -> &MountHandle {
        &self.handle
    }

    pub fn registry(&self) -> &MountRegistry {
        &self.registry
    }

    /// The mounted tree, for inspection and enumeration.
    pub fn fs(&self) -> &MapFS {
        &self.fs
    }

    pub fn fs_mut(&mut self) -> &mut MapFS {
        &mut self.fs
    }

    fn build(&self, structure: &DirStructure) -> AdapterResult<MapFS> {
        let mut fs = MapFS::with_root_mode(self.root_mode);
        fs.set_root(Path::new("/").join(&self.handle.label))?;
        self.materialize(&mut fs, Path::new("/"), structure)?;
        Ok(fs)
    }

    fn materialize(&self, fs: &mut MapFS, base: &Path, structure: &DirStructure) -> AdapterResult<()> {
        for (name, node) in structure {
            if name.is_empty() || name == "." || name == ".." || name.contains('/') {
                return Err(AdapterError::Mount(format!(
                    "invalid node name {name:?} below {}",
                    base.display()
                )));
            }
            let path = base.join(name);
            match node {
                StructureNode::File(content) => {
                    fs.mkfile(&path, Some(content.as_bytes()), self.permissions.file.public)?;
                }
                StructureNode::Directory(children) => {
                    fs.mkdir(&path, self.permissions.dir.public)?;
                    self.materialize(fs, &path, children)?;
                }
            }
        }
        Ok(())
    }

    fn copy_dir(&mut self, host: &Path, inner: &Path, max_file_size: u64) -> AdapterResult<()> {
        for entry in std::fs::read_dir(host)? {
            let entry = entry?;
            let host_child = entry.path();
            let inner_child = inner.join(entry.file_name());
            let meta = std::fs::symlink_metadata(&host_child)?;

            if meta.file_type().is_symlink() {
                let target = std::fs::read_link(&host_child)?;
                self.fs.symlink(&inner_child, target)?;
            } else if meta.is_dir() {
                let mode = host_mode(&meta).unwrap_or(self.permissions.dir.public);
                if !self.fs.exists(&inner_child) {
                    self.fs.mkdir(&inner_child, mode)?;
                }
                self.copy_dir(&host_child, &inner_child, max_file_size)?;
            } else {
                let mode = host_mode(&meta).unwrap_or(self.permissions.file.public);
                let content = if meta.len() <= max_file_size {
                    std::fs::read(&host_child)?
                } else {
                    Vec::new()
                };
                if self.fs.exists(&inner_child) {
                    self.fs.rm(&inner_child)?;
                }
                self.fs.mkfile(&inner_child, Some(&content), mode)?;
            }
        }
        Ok(())
    }
}

impl Drop for VirtualMount {
    fn drop(&mut self) {
        self.registry.release(&self.handle.label, self.handle.id);
        debug!(mount = %self.handle, "released mount");
    }
}

#[cfg(unix)]
fn host_mode(meta: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn host_mode(_meta: &std::fs::Metadata) -> Option<u32> {
    None
}

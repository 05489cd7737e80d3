use std::path::Path;

use serde_json::Value;

use super::{AdapterSettings, PosixAdapter, default_ensure_directory};
use crate::config::{AdapterConfig, ConfigOverrides, ConfigValue, resolve};
use crate::core::{FsBackend, Result, utils};
use crate::error::AdapterResult;
use crate::mount::{MountRegistry, VirtualMount};
use crate::vfs::MapFS;

/// A [`PosixAdapter`] serving an ephemeral in-memory tree.
///
/// The merged configuration is fixed at construction. The tree itself can be
/// rebuilt or seeded through [`mount_mut`](Self::mount_mut).
///
/// ```
/// use vfs_adapter::{PosixAdapter, VirtualFilesystemAdapter, WriteOptions};
/// use serde_json::json;
///
/// let mut adapter = VirtualFilesystemAdapter::from_value(json!({
///     "dir_structure": { "docs": { "a.txt": "hello" } }
/// }))
/// .unwrap();
///
/// assert_eq!(adapter.read("docs/a.txt").unwrap(), b"hello");
/// assert!(adapter.write("docs/b.txt", b"world", WriteOptions::default()));
/// assert_eq!(adapter.list_contents("docs", false).unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct VirtualFilesystemAdapter {
    config: AdapterConfig,
    settings: AdapterSettings,
    mount: VirtualMount,
}

impl VirtualFilesystemAdapter {
    /// Mounts a tree in a private registry.
    pub fn new(overrides: ConfigOverrides) -> AdapterResult<Self> {
        Self::with_registry(overrides, &MountRegistry::new())
    }

    /// Mounts a tree in `registry`; fails if its label is already taken there.
    pub fn with_registry(overrides: ConfigOverrides, registry: &MountRegistry) -> AdapterResult<Self> {
        let config = resolve(&Self::default_config(), overrides);
        let mount = VirtualMount::mount(registry, &config)?;
        Ok(Self {
            settings: AdapterSettings::from(&config),
            config,
            mount,
        })
    }

    /// Builds an adapter from a raw configuration mapping, as handed over by a
    /// driver registration callback.
    pub fn from_value(raw: Value) -> AdapterResult<Self> {
        Self::new(ConfigOverrides::from_value(raw)?)
    }

    pub fn default_config() -> AdapterConfig {
        AdapterConfig::default()
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Looks a configuration field up by its snake or camel case name.
    pub fn get(&self, name: &str) -> AdapterResult<ConfigValue<'_>> {
        self.config.get(name)
    }

    pub fn mount(&self) -> &VirtualMount {
        &self.mount
    }

    pub fn mount_mut(&mut self) -> &mut VirtualMount {
        &mut self.mount
    }
}

impl PosixAdapter for VirtualFilesystemAdapter {
    type Backend = MapFS;

    fn backend(&self) -> &MapFS {
        self.mount.fs()
    }

    fn backend_mut(&mut self) -> &mut MapFS {
        self.mount.fs_mut()
    }

    fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    // The mount root exists for the lifetime of the mount.
    fn ensure_directory(&mut self, dir: &Path) -> Result<()> {
        if utils::is_virtual_root(dir) {
            return Ok(());
        }
        default_ensure_directory(self, dir)
    }

    // The in-memory tree has no canonical paths; remove the node as addressed.
    fn delete_file_node(&mut self, path: &Path) -> Result<()> {
        self.mount.fs_mut().remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Visibility, WriteOptions};
    use crate::config::{LinkHandling, WriteFlags};
    use crate::error::AdapterError;
    use serde_json::json;

    fn adapter() -> VirtualFilesystemAdapter {
        VirtualFilesystemAdapter::new(ConfigOverrides::default()).unwrap()
    }

    mod construction {
        use super::*;

        #[test]
        fn test_default_construction() {
            let adapter = adapter();
            assert_eq!(adapter.config(), &VirtualFilesystemAdapter::default_config());
            assert_eq!(adapter.mount().handle().label(), "root");
            assert!(adapter.has(""));
        }

        #[test]
        fn test_unknown_field_is_rejected() {
            let err = adapter().get("fooBar").unwrap_err();
            assert!(err.to_string().contains("fooBar is not a valid field."));
        }

        #[test]
        fn test_accessor_reads_merged_config() {
            let adapter =
                VirtualFilesystemAdapter::from_value(json!({ "dirName": "ignored" }));
            assert!(matches!(adapter, Err(AdapterError::InvalidConfig(_))));

            let adapter = VirtualFilesystemAdapter::from_value(json!({ "dir_name": "assets" })).unwrap();
            assert_eq!(adapter.get("dirName").unwrap(), ConfigValue::Text("assets"));
            assert_eq!(adapter.get("dir_name").unwrap(), ConfigValue::Text("assets"));
        }

        #[test]
        fn test_shared_registry_rejects_second_mount() {
            let registry = MountRegistry::new();
            let _first = VirtualFilesystemAdapter::with_registry(ConfigOverrides::default(), &registry).unwrap();
            let second = VirtualFilesystemAdapter::with_registry(ConfigOverrides::default(), &registry);
            assert!(matches!(second, Err(AdapterError::Mount(_))));
        }
    }

    mod files {
        use super::*;

        #[test]
        fn test_write_creates_parents() {
            let mut adapter = adapter();
            assert!(adapter.write("foo/bar/tile1.txt", b"FooBar", WriteOptions::default()));
            assert!(adapter.has("foo/bar"));
            assert_eq!(adapter.get_size("foo/bar/tile1.txt"), Some(6));
            assert_eq!(adapter.get_visibility("foo"), Some(Visibility::Public));
        }

        #[test]
        fn test_update_requires_parent() {
            let mut adapter = adapter();
            assert!(!adapter.update("missing/file.txt", b"x", WriteOptions::default()));
            assert!(adapter.write("file.txt", b"one", WriteOptions::default()));
            assert!(adapter.update("file.txt", b"two", WriteOptions::default()));
            assert_eq!(adapter.read("file.txt").unwrap(), b"two");
        }

        #[test]
        fn test_append_flag() {
            let mut adapter = VirtualFilesystemAdapter::from_value(json!({
                "write_flags": WriteFlags::FILE_APPEND.bits()
            }))
            .unwrap();
            assert!(adapter.write("log.txt", b"a", WriteOptions::default()));
            assert!(adapter.update("log.txt", b"b", WriteOptions::default()));
            assert_eq!(adapter.read("log.txt").unwrap(), b"ab");
        }

        #[test]
        fn test_private_write() {
            let mut adapter = adapter();
            let options = WriteOptions::with_visibility(Visibility::Private);
            assert!(adapter.write("secret.txt", b"s", options));
            assert_eq!(adapter.backend().stat("/secret.txt").unwrap().mode, 0o600);
            assert_eq!(adapter.get_visibility("secret.txt"), Some(Visibility::Private));
        }

        #[test]
        fn test_delete_refuses_directories() {
            let mut adapter = adapter();
            adapter.create_dir("dir", WriteOptions::default()).unwrap();
            assert!(!adapter.delete("dir"));
            assert!(adapter.write("dir/file.txt", b"f", WriteOptions::default()));
            assert!(adapter.delete("dir/file.txt"));
            assert!(!adapter.has("dir/file.txt"));
            assert!(!adapter.delete("dir/file.txt"));
        }
    }

    mod directories {
        use super::*;

        #[test]
        fn test_create_dir_reports_metadata() {
            let mut adapter = adapter();
            let metadata = adapter
                .create_dir("a/b", WriteOptions::with_visibility(Visibility::Private))
                .unwrap();
            assert!(metadata.is_dir());
            assert_eq!(metadata.path, "a/b");
            assert_eq!(adapter.get_visibility("a/b"), Some(Visibility::Private));
            assert!(adapter.create_dir("a/b", WriteOptions::default()).is_some());

            assert!(adapter.write("f.txt", b"", WriteOptions::default()));
            assert!(adapter.create_dir("f.txt", WriteOptions::default()).is_none());
        }

        #[test]
        fn test_delete_dir_removes_subtree() {
            let mut adapter = adapter();
            assert!(adapter.write("d/x/1.txt", b"1", WriteOptions::default()));
            assert!(adapter.write("d/2.txt", b"2", WriteOptions::default()));
            assert!(adapter.delete_dir("d"));
            assert!(!adapter.has("d"));
            assert!(!adapter.delete_dir("d"));
            assert!(adapter.has(""));
        }

        #[test]
        fn test_delete_dir_refuses_root() {
            let mut adapter = adapter();
            assert!(adapter.write("keep/me.txt", b"kept", WriteOptions::default()));
            assert!(!adapter.delete_dir(""));
            assert!(!adapter.delete_dir("/"));
            assert!(!adapter.delete_dir("keep/.."));
            assert!(adapter.has("keep/me.txt"));
            assert_eq!(adapter.read("keep/me.txt").unwrap(), b"kept");
        }

        #[test]
        fn test_links_follow_link_handling() {
            let mut adapter = adapter();
            adapter.backend_mut().symlink("/link", "/target").unwrap();
            assert!(matches!(
                adapter.list_contents("", false),
                Err(AdapterError::LinkNotSupported(path)) if path == "link"
            ));

            let mut allowing = VirtualFilesystemAdapter::from_value(json!({
                "link_handling": LinkHandling::AllowLinks
            }))
            .unwrap();
            allowing.backend_mut().symlink("/link", "/target").unwrap();
            let contents = allowing.list_contents("", false).unwrap();
            assert_eq!(contents.len(), 1);
            assert_eq!(contents[0].metadata.kind, crate::vfs::EntryType::Symlink);
        }
    }

    mod visibility {
        use super::*;

        #[test]
        fn test_set_visibility() {
            let mut adapter = adapter();
            assert!(adapter.write("a.txt", b"a", WriteOptions::default()));
            let metadata = adapter.set_visibility("a.txt", Visibility::Private).unwrap();
            assert_eq!(metadata.visibility, Some(Visibility::Private));
            assert_eq!(adapter.get_visibility("a.txt"), Some(Visibility::Private));

            adapter.set_visibility("a.txt", Visibility::Mode(0o640)).unwrap();
            assert_eq!(adapter.get_visibility("a.txt"), Some(Visibility::Mode(0o640)));
            assert!(adapter.set_visibility("missing.txt", Visibility::Public).is_none());
        }
    }
}

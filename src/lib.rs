//! A pluggable filesystem adapter backed by an ephemeral in-memory tree.
//!
//! Code that consumes the [`PosixAdapter`] contract can run unchanged against a
//! [`VirtualFilesystemAdapter`] in tests and a [`LocalAdapter`] elsewhere.
//!
//! ### Overview
//!
//! - **Configuration**: raw mappings are parsed into [`ConfigOverrides`] and merged leaf by
//!   leaf over the documented defaults ([`resolve`]). Fields can be looked up by snake or camel
//!   case name ([`AdapterConfig::get`]).
//! - **Mounting**: a [`VirtualMount`] owns one in-memory tree ([`MapFS`]) built from the
//!   configured layout, registered under a unique label in a [`MountRegistry`].
//! - **Operations**: write, update, read, delete, rename, copy, directories, metadata and
//!   visibility through [`PosixAdapter`]. Failures surface as `false` or `None`, never panics.
//! - **Backends**: [`FsBackend`] is the tree-engine contract. [`MapFS`] keeps everything in
//!   memory; [`DirFS`] maps onto a real directory and cleans up after itself.
//!
//! ```
//! use vfs_adapter::{ConfigOverrides, PosixAdapter, VirtualFilesystemAdapter, WriteOptions};
//!
//! let mut adapter = VirtualFilesystemAdapter::new(ConfigOverrides::default()).unwrap();
//! assert!(adapter.write("foo/bar/tile1.txt", b"FooBar", WriteOptions::default()));
//!
//! let contents = adapter.list_contents("foo/bar", false).unwrap();
//! assert_eq!(contents[0].info.basename, "tile1.txt");
//! assert_eq!(contents[0].metadata.size, Some(6));
//! ```

mod adapter;
mod config;
mod core;
mod error;
mod mount;
mod vfs;

pub use crate::adapter::{
    AdapterSettings, ContentEntry, LocalAdapter, Metadata, PathInfo, PosixAdapter,
    VirtualFilesystemAdapter, Visibility, WriteOptions, default_ensure_directory,
};
pub use crate::config::{
    AdapterConfig, ConfigField, ConfigOverrides, ConfigValue, DirStructure, LinkHandling,
    ModeOverrides, PermissionMap, PermissionOverrides, StructureNode, VisibilityModes, WriteFlags,
    resolve,
};
pub use crate::core::{FsBackend, Result, Stat};
pub use crate::error::{AdapterError, AdapterResult};
pub use crate::mount::{MountHandle, MountId, MountRegistry, VirtualMount};
pub use crate::vfs::{DEFAULT_DIR_MODE, DirFS, Entry, EntryType, MapFS};

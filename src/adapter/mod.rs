//! The file-operation contract and its implementations.
//!
//! [`PosixAdapter`] carries every operation as a provided method over an
//! [`FsBackend`](crate::FsBackend). Implementations only supply the backend and
//! may override the two hooks that differ between storages: directory
//! enforcement and file-node deletion.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::config::{AdapterConfig, LinkHandling, PermissionMap, WriteFlags};
use crate::core::Stat;
use crate::vfs::EntryType;

mod local;
mod posix;
mod virtual_fs;

pub use crate::core::utils::PathInfo;
pub use local::LocalAdapter;
pub use posix::{PosixAdapter, default_ensure_directory};
pub use virtual_fs::VirtualFilesystemAdapter;

/// Access level of a node, mapped to permission bits through a [`PermissionMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    /// Raw permission bits that match neither mapped level.
    Mode(u32),
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
            Visibility::Mode(mode) => write!(f, "{mode:04o}"),
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    /// Accepts `public`, `private` or an octal mode such as `0640`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => u32::from_str_radix(s, 8)
                .map(|mode| Visibility::Mode(mode & 0o7777))
                .map_err(|_| format!("{s} is not a valid visibility")),
        }
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-call options of write-like operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Visibility of the created node. Existing nodes keep their mode unless set.
    pub visibility: Option<Visibility>,
}

impl WriteOptions {
    pub fn with_visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
        }
    }
}

/// The part of the configuration consulted while serving operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSettings {
    pub write_flags: WriteFlags,
    pub link_handling: LinkHandling,
    pub permissions: PermissionMap,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self::from(&AdapterConfig::default())
    }
}

impl From<&AdapterConfig> for AdapterSettings {
    fn from(config: &AdapterConfig) -> Self {
        Self {
            write_flags: config.write_flags,
            link_handling: config.link_handling,
            permissions: config.permissions,
        }
    }
}

impl AdapterSettings {
    pub fn file_mode(&self, visibility: Visibility) -> u32 {
        match visibility {
            Visibility::Public => self.permissions.file.public,
            Visibility::Private => self.permissions.file.private,
            Visibility::Mode(mode) => mode,
        }
    }

    pub fn dir_mode(&self, visibility: Visibility) -> u32 {
        match visibility {
            Visibility::Public => self.permissions.dir.public,
            Visibility::Private => self.permissions.dir.private,
            Visibility::Mode(mode) => mode,
        }
    }

    /// Maps permission bits of a node of `entry_type` back to a visibility.
    pub fn visibility_of(&self, entry_type: EntryType, mode: u32) -> Visibility {
        let modes = match entry_type {
            EntryType::Directory => self.permissions.dir,
            _ => self.permissions.file,
        };
        if mode == modes.public {
            Visibility::Public
        } else if mode == modes.private {
            Visibility::Private
        } else {
            Visibility::Mode(mode)
        }
    }
}

/// Attributes of a node as reported by the metadata operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(rename = "type")]
    pub kind: EntryType,
    /// Slash-separated path relative to the mount root.
    pub path: String,
    /// Modification time, seconds since the Unix epoch.
    pub timestamp: u64,
    /// Content length; files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

impl Metadata {
    pub fn from_stat(path: String, stat: &Stat) -> Self {
        Self {
            kind: stat.entry_type,
            path,
            timestamp: stat.timestamp(),
            size: (stat.entry_type == EntryType::File).then_some(stat.size),
            visibility: None,
            mimetype: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryType::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryType::Directory
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEntry {
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub info: PathInfo,
}

//! Adapter configuration: the typed schema, its documented defaults, the
//! leaf-precise override merge and the naming-convention-agnostic accessor.

use std::collections::BTreeMap;
use std::ops::BitOr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use crate::core::utils;
use crate::error::{AdapterError, AdapterResult};

/// Flags applied when file content is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteFlags(u32);

impl WriteFlags {
    pub const NONE: WriteFlags = WriteFlags(0);
    /// Whole-content exclusive replacement.
    pub const LOCK_EX: WriteFlags = WriteFlags(2);
    /// Writes to an existing file append instead of replacing.
    pub const FILE_APPEND: WriteFlags = WriteFlags(8);

    pub const fn from_bits(bits: u32) -> Self {
        WriteFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: WriteFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for WriteFlags {
    type Output = WriteFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        WriteFlags(self.0 | rhs.0)
    }
}

/// How symbolic links met while listing are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkHandling {
    /// Links are listed as `link` entries.
    AllowLinks,
    /// Listing a directory that contains a link fails.
    #[default]
    DisallowLinks,
}

/// Permission bits for the two visibilities of one node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisibilityModes {
    pub public: u32,
    pub private: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionMap {
    pub file: VisibilityModes,
    pub dir: VisibilityModes,
}

impl Default for PermissionMap {
    fn default() -> Self {
        Self {
            file: VisibilityModes {
                public: 0o644,
                private: 0o600,
            },
            dir: VisibilityModes {
                public: 0o755,
                private: 0o700,
            },
        }
    }
}

/// Initial layout of a mount: names map to file contents or nested directories.
pub type DirStructure = BTreeMap<String, StructureNode>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructureNode {
    File(String),
    Directory(DirStructure),
}

/// The merged, immutable adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    /// Mount root label.
    pub dir_name: String,
    /// Permission bits of the mount root.
    pub dir_permissions: u32,
    pub dir_structure: DirStructure,
    pub write_flags: WriteFlags,
    pub link_handling: LinkHandling,
    pub permissions: PermissionMap,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            dir_name: "root".to_string(),
            dir_permissions: 0o755,
            dir_structure: DirStructure::new(),
            write_flags: WriteFlags::LOCK_EX,
            link_handling: LinkHandling::DisallowLinks,
            permissions: PermissionMap::default(),
        }
    }
}

/// Names of the configuration fields. Parsed from their snake_case spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ConfigField {
    DirName,
    DirPermissions,
    DirStructure,
    WriteFlags,
    LinkHandling,
    Permissions,
}

impl ConfigField {
    /// Resolves `dirName`, `DirName` or `dir_name` alike.
    ///
    /// The error carries `name` as given, not its normalized form.
    pub fn lookup(name: &str) -> AdapterResult<Self> {
        ConfigField::from_str(&utils::snake_case(name))
            .map_err(|_| AdapterError::UnknownField(name.to_string()))
    }
}

/// A borrowed view of one configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue<'a> {
    Text(&'a str),
    Mode(u32),
    WriteFlags(WriteFlags),
    LinkHandling(LinkHandling),
    Structure(&'a DirStructure),
    Permissions(&'a PermissionMap),
}

impl AdapterConfig {
    pub fn field(&self, field: ConfigField) -> ConfigValue<'_> {
        match field {
            ConfigField::DirName => ConfigValue::Text(&self.dir_name),
            ConfigField::DirPermissions => ConfigValue::Mode(self.dir_permissions),
            ConfigField::DirStructure => ConfigValue::Structure(&self.dir_structure),
            ConfigField::WriteFlags => ConfigValue::WriteFlags(self.write_flags),
            ConfigField::LinkHandling => ConfigValue::LinkHandling(self.link_handling),
            ConfigField::Permissions => ConfigValue::Permissions(&self.permissions),
        }
    }

    /// Looks a field up by name in either snake_case or camelCase.
    pub fn get(&self, name: &str) -> AdapterResult<ConfigValue<'_>> {
        ConfigField::lookup(name).map(|field| self.field(field))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeOverrides {
    pub public: Option<u32>,
    pub private: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionOverrides {
    pub file: Option<ModeOverrides>,
    pub dir: Option<ModeOverrides>,
}

/// User supplied configuration. Every field, nested ones included, may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub dir_name: Option<String>,
    pub dir_permissions: Option<u32>,
    pub dir_structure: Option<DirStructure>,
    pub write_flags: Option<WriteFlags>,
    pub link_handling: Option<LinkHandling>,
    pub permissions: Option<PermissionOverrides>,
}

impl ConfigOverrides {
    /// Parses a raw configuration mapping.
    ///
    /// Unknown keys and values whose shape disagrees with the schema (e.g. a
    /// number where a mapping belongs) are rejected.
    pub fn from_value(value: serde_json::Value) -> AdapterResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Merges `overrides` over `defaults` leaf by leaf. `dir_structure` is replaced
/// as a whole.
pub fn resolve(defaults: &AdapterConfig, overrides: ConfigOverrides) -> AdapterConfig {
    let permissions = match overrides.permissions {
        Some(p) => PermissionMap {
            file: merge_modes(defaults.permissions.file, p.file),
            dir: merge_modes(defaults.permissions.dir, p.dir),
        },
        None => defaults.permissions,
    };

    AdapterConfig {
        dir_name: overrides
            .dir_name
            .unwrap_or_else(|| defaults.dir_name.clone()),
        dir_permissions: overrides.dir_permissions.unwrap_or(defaults.dir_permissions),
        dir_structure: overrides
            .dir_structure
            .unwrap_or_else(|| defaults.dir_structure.clone()),
        write_flags: overrides.write_flags.unwrap_or(defaults.write_flags),
        link_handling: overrides.link_handling.unwrap_or(defaults.link_handling),
        permissions,
    }
}

fn merge_modes(base: VisibilityModes, overrides: Option<ModeOverrides>) -> VisibilityModes {
    let Some(overrides) = overrides else {
        return base;
    };
    VisibilityModes {
        public: overrides.public.unwrap_or(base.public),
        private: overrides.private.unwrap_or(base.private),
    }
}

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    #[serde(rename = "dir")]
    Directory,
    #[serde(rename = "link")]
    Symlink,
}

/// A node of the in-memory tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    entry_type: EntryType,
    content: Option<Vec<u8>>,
    target: Option<PathBuf>,
    mode: u32,
    modified: SystemTime,
}

impl Entry {
    pub fn new(entry_type: EntryType, mode: u32) -> Entry {
        Entry {
            entry_type,
            content: None,
            target: None,
            mode: mode & 0o7777,
            modified: SystemTime::now(),
        }
    }

    pub fn link(target: PathBuf) -> Entry {
        Entry {
            target: Some(target),
            ..Entry::new(EntryType::Symlink, 0o777)
        }
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    pub fn is_link(&self) -> bool {
        self.entry_type == EntryType::Symlink
    }

    pub fn content(&self) -> Option<&Vec<u8>> {
        self.content.as_ref()
    }

    pub fn set_content(&mut self, content: &[u8]) {
        self.content = Some(content.to_vec());
        self.touch();
    }

    pub fn append_content(&mut self, content: &[u8]) {
        self.content
            .get_or_insert_with(Vec::new)
            .extend_from_slice(content);
        self.touch();
    }

    /// Link target for symbolic links.
    pub fn target(&self) -> Option<&PathBuf> {
        self.target.as_ref()
    }

    pub fn size(&self) -> u64 {
        match (&self.content, &self.target) {
            (Some(content), _) => content.len() as u64,
            (None, Some(target)) => target.as_os_str().len() as u64,
            _ => 0,
        }
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn set_mode(&mut self, mode: u32) {
        self.mode = mode & 0o7777;
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    fn touch(&mut self) {
        self.modified = SystemTime::now();
    }
}

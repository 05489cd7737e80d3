//! Ordered in-memory node tree.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::core::{FsBackend, Result, Stat, utils};
use crate::{Entry, EntryType};

/// Permission bits given to directories created implicitly as parents.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// The in-memory tree engine behind every virtual mount.
///
/// Nodes live in a `BTreeMap` keyed by inner absolute normalized paths (`/`, `/a`, `/a/b.txt`),
/// so a directory always sorts before its descendants. Each node carries its kind, permission
/// bits and modification time; files also own their bytes and links store their target verbatim.
///
/// `root` is only a locator (e.g. `/root` for a mount labelled `root`). It is what `to_host()`
/// renders for diagnostics and never touches the host.
///
/// The tree upholds:
/// - `/` is always present and is a directory;
/// - every other node has a directory as parent;
/// - keys contain no `.`, `..`, empty or trailing components.
///
/// Wrap it in a `Mutex` to share it between threads.
///
/// ### Example
///
/// ```
/// use vfs_adapter::{FsBackend, MapFS};
///
/// let mut fs = MapFS::new();
///
/// fs.mkdir("/docs", 0o755).unwrap();
/// fs.mkfile("/docs/note.txt", Some(b"Hello"), 0o644).unwrap();
///
/// assert!(fs.exists("/docs/note.txt"));
///
/// fs.rm("/docs/note.txt").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct MapFS {
    root: PathBuf,
    entries: BTreeMap<PathBuf, Entry>,
}

impl Default for MapFS {
    fn default() -> Self {
        Self::new()
    }
}

impl MapFS {
    /// Creates new MapFS instance whose root directory has mode `0o755`.
    pub fn new() -> Self {
        Self::with_root_mode(DEFAULT_DIR_MODE)
    }

    /// Creates new MapFS instance whose root directory has permission bits `mode`.
    pub fn with_root_mode(mode: u32) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::new(EntryType::Directory, mode));

        Self {
            root: PathBuf::from("/"),
            entries,
        }
    }

    /// Changes root path.
    /// * `path` must be an absolute
    /// If `path` isn't an absolute error returns.
    pub fn set_root<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(anyhow!("root path must be an absolute"));
        }
        self.root = path.to_path_buf();
        Ok(())
    }

    /// Creates a symbolic link node at `link` pointing to `target`.
    /// The target is stored verbatim and never resolved.
    pub fn symlink<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, link: P, target: Q) -> Result<()> {
        let link = self.to_inner(link);
        if self.exists(&link) {
            return Err(anyhow!("{} already exist", link.display()));
        }
        self.require_parent_dir(&link)?;
        self.entries
            .insert(link, Entry::link(target.as_ref().to_path_buf()));
        Ok(())
    }

    fn to_inner<P: AsRef<Path>>(&self, inner_path: P) -> PathBuf {
        utils::normalize(Path::new("/").join(inner_path))
    }

    fn entry(&self, inner: &Path) -> Result<&Entry> {
        self.entries
            .get(inner)
            .ok_or_else(|| anyhow!("{} does not exist", inner.display()))
    }

    fn file_entry_mut(&mut self, inner: &Path) -> Result<&mut Entry> {
        let entry = self
            .entries
            .get_mut(inner)
            .ok_or_else(|| anyhow!("{} does not exist", inner.display()))?;
        match entry.entry_type() {
            EntryType::File => Ok(entry),
            EntryType::Directory => Err(anyhow!("{} is a directory", inner.display())),
            EntryType::Symlink => Err(anyhow!("{} is a symbolic link", inner.display())),
        }
    }

    fn require_parent_dir(&self, inner: &Path) -> Result<()> {
        let parent = inner
            .parent()
            .ok_or_else(|| anyhow!("{} has no parent", inner.display()))?;
        match self.entries.get(parent) {
            Some(entry) if entry.is_dir() => Ok(()),
            Some(_) => Err(anyhow!("{} is not a directory", parent.display())),
            None => Err(anyhow!("{} does not exist", parent.display())),
        }
    }

    fn descendants<'a>(&'a self, inner: &'a Path) -> impl Iterator<Item = &'a PathBuf> + 'a {
        self.entries
            .keys()
            .filter(move |path| path.starts_with(inner) && path.as_path() != inner)
    }
}

impl FsBackend for MapFS {
    /// Returns root path.
    fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Returns a hypothetical "host-path" joining `root` and `inner_path`.
    fn to_host<P: AsRef<Path>>(&self, inner_path: P) -> Result<PathBuf> {
        let inner = self.to_inner(inner_path);
        Ok(self.root.join(inner.strip_prefix("/")?))
    }

    /// Checks if a `path` exists in the VFS.
    fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        let inner = self.to_inner(path);
        self.entries.contains_key(&inner)
    }

    /// Checks if `path` is a directory.
    fn is_dir<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let inner = self.to_inner(path);
        Ok(self.entry(&inner)?.is_dir())
    }

    /// Checks if `path` is a regular file.
    fn is_file<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let inner = self.to_inner(path);
        Ok(self.entry(&inner)?.is_file())
    }

    /// Lists the **immediate children** of a directory.
    ///
    /// # Returns
    /// * `Ok(Vec<PathBuf>)` - Inner absolute paths one level below `path`, in path order.
    /// * `Err(anyhow::Error)` - If `path` does not exist or is not a directory.
    fn ls<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>> {
        let inner = self.to_inner(path);
        if !self.entry(&inner)?.is_dir() {
            return Err(anyhow!("{} is not a directory", inner.display()));
        }
        let depth = inner.components().count() + 1;
        Ok(self
            .descendants(&inner)
            .filter(|path| path.components().count() == depth)
            .cloned()
            .collect())
    }

    /// Returns every node below a directory. The starting directory itself is not included.
    fn tree<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>> {
        let inner = self.to_inner(path);
        if !self.entry(&inner)?.is_dir() {
            return Err(anyhow!("{} is not a directory", inner.display()));
        }
        Ok(self.descendants(&inner).cloned().collect())
    }

    /// Creates directory and all it parents (if needed).
    /// * `path` - inner vfs path.
    /// * `mode` - permission bits for every directory created.
    fn mkdir<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> Result<()> {
        if path.as_ref().as_os_str().is_empty() {
            return Err(anyhow!("invalid path: empty"));
        }

        let inner_path = self.to_inner(path);

        if self.exists(&inner_path) {
            return Err(anyhow!("path already exists: {}", inner_path.display()));
        }

        // Looking for the first existing parent
        let mut existed_parent = inner_path.clone();
        while let Some(parent) = existed_parent.parent() {
            existed_parent = parent.to_path_buf();
            if self.exists(&existed_parent) {
                break;
            }
        }
        if !self.entry(&existed_parent)?.is_dir() {
            return Err(anyhow!("{} is not a directory", existed_parent.display()));
        }

        // Create from the closest existing parent to the target path
        let need_to_create: Vec<_> = inner_path
            .strip_prefix(&existed_parent)?
            .components()
            .collect();

        let mut built = existed_parent;
        for component in need_to_create {
            built.push(component);
            self.entries
                .insert(built.clone(), Entry::new(EntryType::Directory, mode));
        }

        Ok(())
    }

    /// Creates new file in VFS.
    /// * `file_path` must be inner VFS path. It must contain the name of the file,
    /// optionally preceded by parent directory.
    /// If the parent directory does not exist, it will be created with `DEFAULT_DIR_MODE`.
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
                self.mkdir(parent, DEFAULT_DIR_MODE)?;
            }
        }
        self.require_parent_dir(&file_path)?;

        let mut entry = Entry::new(EntryType::File, mode);
        entry.set_content(content.unwrap_or_default());
        self.entries.insert(file_path, entry);

        Ok(())
    }

    /// Reads the entire contents of a file into a byte vector.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - File content as a byte vector if successful.
    /// * `Err(anyhow::Error)` - If the file does not exist or `path` is not a regular file.
    fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let inner = self.to_inner(path);
        let entry = self.entry(&inner)?;
        if !entry.is_file() {
            return Err(anyhow!("{} is not a regular file", inner.display()));
        }
        Ok(entry.content().cloned().unwrap_or_default())
    }

    /// Returns a cursor over a snapshot of the file content.
    fn reader<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Read>> {
        let content = self.read(path)?;
        Ok(Box::new(Cursor::new(content)))
    }

    /// Writes bytes to an existing file, replacing its entire contents.
    ///
    /// # Behavior
    /// - **Overwrites completely**: The entire existing content is replaced.
    /// - **No file creation**: File must exist (use `mkfile()` first).
    fn write<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        let inner = self.to_inner(path);
        self.file_entry_mut(&inner)?.set_content(content);
        Ok(())
    }

    /// Appends bytes to the end of an existing file, preserving its old contents.
    fn append<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        let inner = self.to_inner(path);
        self.file_entry_mut(&inner)?.append_content(content);
        Ok(())
    }

    /// Removes a file or directory at the specified path.
    /// If the path is a directory, all its contents are removed recursively.
    ///
    /// Returns:
    /// - `Ok(())` on successful removal.
    /// - `Err(_)` if the path does not exist in the VFS or is the root;
    fn rm<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if path.as_ref().as_os_str().is_empty() {
            return Err(anyhow!("invalid path: empty"));
        }
        let inner_path = self.to_inner(path);
        if utils::is_virtual_root(&inner_path) {
            return Err(anyhow!("invalid path: the root cannot be removed"));
        }
        if !self.exists(&inner_path) {
            return Err(anyhow!("{} does not exist", inner_path.display()));
        }

        let removed: Vec<PathBuf> = self.descendants(&inner_path).cloned().collect();
        for p in &removed {
            self.entries.remove(p);
        }
        self.entries.remove(&inner_path);

        Ok(())
    }

    /// Removes the node itself; no path resolution beyond normalization takes place.
    fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let inner = self.to_inner(path);
        if self.entry(&inner)?.is_dir() {
            return Err(anyhow!("{} is a directory", inner.display()));
        }
        self.entries.remove(&inner);
        Ok(())
    }

    fn rmdir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let inner = self.to_inner(path);
        if utils::is_virtual_root(&inner) {
            return Err(anyhow!("invalid path: the root cannot be removed"));
        }
        if !self.entry(&inner)?.is_dir() {
            return Err(anyhow!("{} is not a directory", inner.display()));
        }
        if self.descendants(&inner).next().is_some() {
            return Err(anyhow!("directory not empty: {}", inner.display()));
        }
        self.entries.remove(&inner);
        Ok(())
    }

    /// Moves `from` (and its subtree) to `to`.
    ///
    /// All checks run before the first mutation, so a failed rename leaves the tree untouched:
    /// * `from` must exist and must not be the root;
    /// * `to` must not exist and its parent must be a directory;
    /// * `to` must not lie inside `from`.
    fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let from = self.to_inner(from);
        let to = self.to_inner(to);
        if utils::is_virtual_root(&from) {
            return Err(anyhow!("invalid path: the root cannot be moved"));
        }
        self.entry(&from)?;
        if self.exists(&to) {
            return Err(anyhow!("{} already exist", to.display()));
        }
        if to.starts_with(&from) {
            return Err(anyhow!(
                "cannot move {} into itself ({})",
                from.display(),
                to.display()
            ));
        }
        self.require_parent_dir(&to)?;

        let moved: Vec<PathBuf> = self.descendants(&from).cloned().collect();
        for old in moved {
            if let Some(entry) = self.entries.remove(&old) {
                let suffix = old.strip_prefix(&from)?;
                self.entries.insert(to.join(suffix), entry);
            }
        }
        if let Some(entry) = self.entries.remove(&from) {
            self.entries.insert(to, entry);
        }

        Ok(())
    }

    fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, from: P, to: Q) -> Result<()> {
        let from = self.to_inner(from);
        let to = self.to_inner(to);
        let source = self.entry(&from)?;
        if !source.is_file() {
            return Err(anyhow!("{} is not a regular file", from.display()));
        }
        if let Some(existing) = self.entries.get(&to) {
            if !existing.is_file() {
                return Err(anyhow!("{} is not a regular file", to.display()));
            }
        }
        self.require_parent_dir(&to)?;

        let mut copied = Entry::new(EntryType::File, source.mode());
        copied.set_content(source.content().map(Vec::as_slice).unwrap_or_default());
        self.entries.insert(to, copied);
        Ok(())
    }

    fn stat<P: AsRef<Path>>(&self, path: P) -> Result<Stat> {
        let inner = self.to_inner(path);
        let entry = self.entry(&inner)?;
        Ok(Stat {
            entry_type: entry.entry_type(),
            size: entry.size(),
            modified: entry.modified(),
            mode: entry.mode(),
        })
    }

    fn set_mode<P: AsRef<Path>>(&mut self, path: P, mode: u32) -> Result<()> {
        let inner = self.to_inner(path);
        self.entries
            .get_mut(&inner)
            .ok_or_else(|| anyhow!("{} does not exist", inner.display()))?
            .set_mode(mode);
        Ok(())
    }

    /// In-memory trees have no canonical (host-resolved) form.
    fn canonicalize<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        Err(anyhow!(
            "cannot resolve a canonical path for {} in an in-memory tree",
            self.to_inner(path).display()
        ))
    }

    /// Removes all artifacts (dirs and files) in vfs, but preserve its root.
    fn cleanup(&mut self) -> bool {
        self.entries.retain(|path, _| path.as_path() == Path::new("/"));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create a pre‑populated MapFS instance for testing
    fn setup_test_vfs() -> MapFS {
        let mut vfs = MapFS::new();

        vfs.mkdir("/etc", 0o755).unwrap();
        vfs.mkdir("/home/user", 0o700).unwrap();
        vfs.mkfile("/home/user/file.txt", Some(b"Hello"), 0o644)
            .unwrap();
        vfs.mkfile("/readme.md", Some(b"Project docs"), 0o600)
            .unwrap();

        vfs
    }

    mod creations {
        use super::*;

        #[test]
        fn test_new_map_fs() {
            let mut fs = MapFS::with_root_mode(0o700);
            assert_eq!(fs.root(), Path::new("/"));
            assert_eq!(fs.stat("/").unwrap().mode, 0o700);

            fs.set_root("/vfs/root").unwrap();
            assert_eq!(fs.root(), Path::new("/vfs/root"));

            let host_path = fs.to_host("/inner/path").unwrap();
            assert_eq!(host_path, PathBuf::from("/vfs/root/inner/path"));

            assert!(fs.set_root("new/relative/root").is_err());
        }

        #[test]
        fn test_mkdir_nested_directories() -> Result<()> {
            let mut vfs = MapFS::new();
            vfs.mkdir("/a/b/c", 0o750)?;

            assert!(vfs.is_dir("/a")?);
            assert!(vfs.is_dir("/a/b")?);
            assert_eq!(vfs.stat("/a/b/c")?.mode, 0o750);
            Ok(())
        }

        #[test]
        fn test_mkdir_already_exists() {
            let mut vfs = setup_test_vfs();
            let result = vfs.mkdir("/etc", 0o755);
            assert!(result.unwrap_err().to_string().contains("already exists"));
        }

        #[test]
        fn test_mkdir_below_file_fails() {
            let mut vfs = setup_test_vfs();
            let result = vfs.mkdir("/readme.md/sub", 0o755);
            assert!(result.unwrap_err().to_string().contains("not a directory"));
        }

        #[test]
        fn test_mkfile_creates_parents() -> Result<()> {
            let mut vfs = MapFS::new();
            vfs.mkfile("/x/y/z.txt", Some(b"data"), 0o640)?;

            assert!(vfs.is_dir("/x/y")?);
            assert_eq!(vfs.stat("/x/y")?.mode, DEFAULT_DIR_MODE);
            assert_eq!(vfs.read("/x/y/z.txt")?, b"data");
            assert_eq!(vfs.stat("/x/y/z.txt")?.mode, 0o640);
            Ok(())
        }

        #[test]
        fn test_mkfile_existing_fails() {
            let mut vfs = setup_test_vfs();
            assert!(vfs.mkfile("/readme.md", None, 0o644).is_err());
        }

        #[test]
        fn test_symlink_node() -> Result<()> {
            let mut vfs = setup_test_vfs();
            vfs.symlink("/etc/link", "../readme.md")?;

            let stat = vfs.stat("/etc/link")?;
            assert_eq!(stat.entry_type, EntryType::Symlink);
            assert!(!vfs.is_file("/etc/link")?);
            assert!(vfs.read("/etc/link").is_err());
            Ok(())
        }
    }

    mod exists {
        use super::*;

        #[test]
        fn test_exists_paths() {
            let vfs = setup_test_vfs();
            assert!(vfs.exists("/"));
            assert!(vfs.exists("/home/user/file.txt"));
            assert!(vfs.exists("home/user")); // relative to the root
            assert!(vfs.exists("/home/"));
            assert!(vfs.exists("/home/user/../user/./file.txt"));
            assert!(!vfs.exists("/home/us"));
            assert!(!vfs.exists("/tmp"));
        }

        #[test]
        fn test_is_dir_nonexistent_path() {
            let vfs = setup_test_vfs();
            let result = vfs.is_dir("/nonexistent");
            assert!(
                result.unwrap_err().to_string().contains("does not exist"),
                "Error should mention path does not exist"
            );
        }
    }

    mod listing {
        use super::*;

        #[test]
        fn test_ls_root_directory() -> Result<()> {
            let vfs = setup_test_vfs();
            let entries = vfs.ls("/")?;

            assert_eq!(
                entries,
                vec![
                    PathBuf::from("/etc"),
                    PathBuf::from("/home"),
                    PathBuf::from("/readme.md")
                ]
            );
            Ok(())
        }

        #[test]
        fn test_ls_file_path() {
            let vfs = setup_test_vfs();
            assert!(vfs.ls("/readme.md").is_err());
        }

        #[test]
        fn test_tree_parents_before_children() -> Result<()> {
            let vfs = setup_test_vfs();
            let entries = vfs.tree("/home")?;

            assert_eq!(
                entries,
                vec![
                    PathBuf::from("/home/user"),
                    PathBuf::from("/home/user/file.txt")
                ]
            );
            Ok(())
        }

        #[test]
        fn test_tree_empty_directory() -> Result<()> {
            let vfs = setup_test_vfs();
            assert!(vfs.tree("/etc")?.is_empty());
            Ok(())
        }
    }

    mod read_write {
        use super::*;

        #[test]
        fn test_write_replaces_content() -> Result<()> {
            let mut vfs = setup_test_vfs();
            vfs.write("/home/user/file.txt", b"Bye")?;
            assert_eq!(vfs.read("/home/user/file.txt")?, b"Bye");
            assert_eq!(vfs.stat("/home/user/file.txt")?.size, 3);
            Ok(())
        }

        #[test]
        fn test_append_keeps_content() -> Result<()> {
            let mut vfs = setup_test_vfs();
            vfs.append("/home/user/file.txt", b", world")?;
            assert_eq!(vfs.read("/home/user/file.txt")?, b"Hello, world");
            Ok(())
        }

        #[test]
        fn test_write_directory_fails() {
            let mut vfs = setup_test_vfs();
            let result = vfs.write("/home", b"x");
            assert!(result.unwrap_err().to_string().contains("is a directory"));
        }

        #[test]
        fn test_write_missing_file_fails() {
            let mut vfs = setup_test_vfs();
            assert!(vfs.write("/missing.txt", b"x").is_err());
        }

        #[test]
        fn test_reader_streams_snapshot() -> Result<()> {
            let mut vfs = setup_test_vfs();
            let mut reader = vfs.reader("/readme.md")?;
            vfs.write("/readme.md", b"changed")?;

            let mut buf = String::new();
            reader.read_to_string(&mut buf)?;
            assert_eq!(buf, "Project docs");
            Ok(())
        }
    }

    mod removal {
        use super::*;

        #[test]
        fn test_rm_directory_recursively() -> Result<()> {
            let mut vfs = setup_test_vfs();
            vfs.rm("/home")?;
            assert!(!vfs.exists("/home"));
            assert!(!vfs.exists("/home/user/file.txt"));
            assert!(vfs.exists("/readme.md"));
            Ok(())
        }

        #[test]
        fn test_rm_root_fails() {
            let mut vfs = setup_test_vfs();
            assert!(vfs.rm("/").is_err());
        }

        #[test]
        fn test_remove_file_refuses_directories() -> Result<()> {
            let mut vfs = setup_test_vfs();
            assert!(vfs.remove_file("/etc").is_err());
            vfs.remove_file("/readme.md")?;
            assert!(!vfs.exists("/readme.md"));
            Ok(())
        }

        #[test]
        fn test_rmdir_requires_empty_directory() -> Result<()> {
            let mut vfs = setup_test_vfs();
            assert!(vfs.rmdir("/home").is_err());
            vfs.rmdir("/etc")?;
            assert!(!vfs.exists("/etc"));
            Ok(())
        }

        #[test]
        fn test_cleanup_preserves_root() {
            let mut vfs = setup_test_vfs();
            assert!(vfs.cleanup());
            assert!(vfs.exists("/"));
            assert!(vfs.ls("/").unwrap().is_empty());
        }

        #[test]
        fn test_canonicalize_is_unsupported() {
            let vfs = setup_test_vfs();
            assert!(vfs.canonicalize("/readme.md").is_err());
        }
    }

    mod rename_copy {
        use super::*;

        #[test]
        fn test_rename_moves_subtree() -> Result<()> {
            let mut vfs = setup_test_vfs();
            vfs.rename("/home", "/etc/home")?;

            assert!(!vfs.exists("/home"));
            assert_eq!(vfs.read("/etc/home/user/file.txt")?, b"Hello");
            assert_eq!(vfs.stat("/etc/home/user")?.mode, 0o700);
            Ok(())
        }

        #[test]
        fn test_rename_onto_existing_leaves_tree_untouched() {
            let mut vfs = setup_test_vfs();
            let before = vfs.entries.clone();

            assert!(vfs.rename("/readme.md", "/home/user/file.txt").is_err());
            assert!(vfs.rename("/readme.md", "/missing/readme.md").is_err());
            assert!(vfs.rename("/home", "/home/user/inner").is_err());
            assert_eq!(vfs.entries, before);
        }

        #[test]
        fn test_copy_file() -> Result<()> {
            let mut vfs = setup_test_vfs();
            vfs.copy("/readme.md", "/etc/readme.md")?;

            assert_eq!(vfs.read("/readme.md")?, b"Project docs");
            assert_eq!(vfs.read("/etc/readme.md")?, b"Project docs");
            assert_eq!(vfs.stat("/etc/readme.md")?.mode, 0o600);
            Ok(())
        }

        #[test]
        fn test_copy_directory_fails() {
            let mut vfs = setup_test_vfs();
            assert!(vfs.copy("/home", "/home2").is_err());
        }
    }
}

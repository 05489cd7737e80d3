use std::io::Read;
use std::path::Path;

use anyhow::anyhow;
use tracing::debug;

use super::{AdapterSettings, ContentEntry, Metadata, Visibility, WriteOptions};
use crate::config::{LinkHandling, WriteFlags};
use crate::core::{FsBackend, Result, utils};
use crate::error::{AdapterError, AdapterResult};
use crate::vfs::EntryType;

/// POSIX-like file operations over a storage backend.
///
/// All paths are slash-separated and relative to the backend root. Operations
/// report failure as `false` or `None`; the cause is logged at `debug` level.
/// Only [`list_contents`](PosixAdapter::list_contents) returns an error, for
/// link policy violations and backend faults.
pub trait PosixAdapter {
    type Backend: FsBackend;

    fn backend(&self) -> &Self::Backend;
    fn backend_mut(&mut self) -> &mut Self::Backend;
    fn settings(&self) -> &AdapterSettings;

    /// Makes sure `dir` exists as a directory, creating missing levels with
    /// the public directory mode.
    fn ensure_directory(&mut self, dir: &Path) -> Result<()> {
        default_ensure_directory(self, dir)
    }

    /// Removes a single non-directory node.
    ///
    /// The default resolves the canonical location first, so links in the
    /// parent chain are followed and paths leaving the root are refused.
    fn delete_file_node(&mut self, path: &Path) -> Result<()> {
        let canonical = self.backend().canonicalize(path)?;
        self.backend_mut().remove_file(canonical)
    }

    /// Writes a new file, creating missing parent directories.
    fn write(&mut self, path: &str, contents: &[u8], options: WriteOptions) -> bool {
        let inner = utils::inner_path(path);
        let result = parent_of(&inner)
            .and_then(|parent| self.ensure_directory(parent))
            .and_then(|_| put(self, &inner, contents, options));
        settle("write", &inner, result).is_some()
    }

    /// Replaces the contents of a file. Parent directories are not created.
    fn update(&mut self, path: &str, contents: &[u8], options: WriteOptions) -> bool {
        let inner = utils::inner_path(path);
        let result = put(self, &inner, contents, options);
        settle("update", &inner, result).is_some()
    }

    fn write_stream<R: Read>(&mut self, path: &str, mut resource: R, options: WriteOptions) -> bool {
        let mut contents = Vec::new();
        if let Err(e) = resource.read_to_end(&mut contents) {
            debug!(operation = "write_stream", path, error = %e, "unable to read source stream");
            return false;
        }
        self.write(path, &contents, options)
    }

    fn update_stream<R: Read>(&mut self, path: &str, mut resource: R, options: WriteOptions) -> bool {
        let mut contents = Vec::new();
        if let Err(e) = resource.read_to_end(&mut contents) {
            debug!(operation = "update_stream", path, error = %e, "unable to read source stream");
            return false;
        }
        self.update(path, &contents, options)
    }

    fn read(&self, path: &str) -> Option<Vec<u8>> {
        let inner = utils::inner_path(path);
        settle("read", &inner, self.backend().read(&inner))
    }

    fn read_stream(&self, path: &str) -> Option<Box<dyn Read>> {
        let inner = utils::inner_path(path);
        settle("read_stream", &inner, self.backend().reader(&inner))
    }

    /// Deletes a file or link. Directories are refused.
    fn delete(&mut self, path: &str) -> bool {
        let inner = utils::inner_path(path);
        let result = self.delete_file_node(&inner);
        settle("delete", &inner, result).is_some()
    }

    /// Deletes a directory and everything below it, deepest nodes first.
    fn delete_dir(&mut self, dirname: &str) -> bool {
        let inner = utils::inner_path(dirname);
        if utils::is_virtual_root(&inner) {
            debug!(operation = "delete_dir", "the root cannot be deleted");
            return false;
        }
        if !self.backend().is_dir(&inner).unwrap_or(false) {
            debug!(operation = "delete_dir", path = %inner.display(), "not a directory");
            return false;
        }
        let result = self.backend().tree(&inner).and_then(|nodes| {
            for node in nodes.iter().rev() {
                if self.backend().is_dir(node)? {
                    self.backend_mut().rmdir(node)?;
                } else {
                    self.delete_file_node(node)?;
                }
            }
            self.backend_mut().rmdir(&inner)
        });
        settle("delete_dir", &inner, result).is_some()
    }

    /// Creates a directory. An existing directory is reported as created.
    fn create_dir(&mut self, dirname: &str, options: WriteOptions) -> Option<Metadata> {
        let inner = utils::inner_path(dirname);
        let result = make_dir(self, &inner, options).and_then(|_| describe(&*self, &inner));
        settle("create_dir", &inner, result)
    }

    /// Moves a node. Fails without changes when `new_path` already exists.
    fn rename(&mut self, path: &str, new_path: &str) -> bool {
        let (from, to) = (utils::inner_path(path), utils::inner_path(new_path));
        let result = check_move(self.backend(), &from, &to)
            .and_then(|_| parent_of(&to))
            .and_then(|parent| self.ensure_directory(parent))
            .and_then(|_| self.backend_mut().rename(&from, &to));
        settle("rename", &from, result).is_some()
    }

    /// Copies a file, overwriting an existing file at `new_path`.
    fn copy(&mut self, path: &str, new_path: &str) -> bool {
        let (from, to) = (utils::inner_path(path), utils::inner_path(new_path));
        let result = check_copy(self.backend(), &from, &to)
            .and_then(|_| parent_of(&to))
            .and_then(|parent| self.ensure_directory(parent))
            .and_then(|_| self.backend_mut().copy(&from, &to));
        settle("copy", &from, result).is_some()
    }

    fn has(&self, path: &str) -> bool {
        self.backend().exists(utils::inner_path(path))
    }

    /// Lists a directory, optionally with all descendants. Anything but a
    /// directory lists as empty.
    fn list_contents(&self, directory: &str, recursive: bool) -> AdapterResult<Vec<ContentEntry>> {
        let inner = utils::inner_path(directory);
        let backend = self.backend();
        if !backend.is_dir(&inner).unwrap_or(false) {
            return Ok(Vec::new());
        }
        let nodes = if recursive {
            backend.tree(&inner)?
        } else {
            backend.ls(&inner)?
        };

        let mut contents = Vec::with_capacity(nodes.len());
        for node in nodes {
            let stat = backend.stat(&node)?;
            let path = utils::relative_path(&node);
            if stat.entry_type == EntryType::Symlink
                && self.settings().link_handling == LinkHandling::DisallowLinks
            {
                return Err(AdapterError::LinkNotSupported(path));
            }
            contents.push(ContentEntry {
                info: utils::path_info(&path),
                metadata: Metadata::from_stat(path, &stat),
            });
        }
        Ok(contents)
    }

    fn get_metadata(&self, path: &str) -> Option<Metadata> {
        let inner = utils::inner_path(path);
        settle("get_metadata", &inner, describe(self, &inner))
    }

    fn get_size(&self, path: &str) -> Option<u64> {
        self.get_metadata(path).and_then(|metadata| metadata.size)
    }

    fn get_timestamp(&self, path: &str) -> Option<u64> {
        self.get_metadata(path).map(|metadata| metadata.timestamp)
    }

    /// Detects the content type of a file; directories report `directory`.
    fn get_mimetype(&self, path: &str) -> Option<String> {
        let inner = utils::inner_path(path);
        let backend = self.backend();
        let result = backend.is_dir(&inner).and_then(|is_dir| {
            if is_dir {
                return Ok("directory".to_string());
            }
            let contents = backend.read(&inner)?;
            Ok(utils::guess_mime(&inner, &contents))
        });
        settle("get_mimetype", &inner, result)
    }

    fn get_visibility(&self, path: &str) -> Option<Visibility> {
        let inner = utils::inner_path(path);
        let result = self.backend().stat(&inner);
        settle("get_visibility", &inner, result)
            .map(|stat| self.settings().visibility_of(stat.entry_type, stat.mode))
    }

    fn set_visibility(&mut self, path: &str, visibility: Visibility) -> Option<Metadata> {
        let inner = utils::inner_path(path);
        let result = self.backend().is_dir(&inner).and_then(|is_dir| {
            let mode = if is_dir {
                self.settings().dir_mode(visibility)
            } else {
                self.settings().file_mode(visibility)
            };
            self.backend_mut().set_mode(&inner, mode)?;
            let mut metadata = describe(&*self, &inner)?;
            metadata.visibility = Some(visibility);
            Ok(metadata)
        });
        settle("set_visibility", &inner, result)
    }
}

/// Directory enforcement shared by every [`PosixAdapter`]; overrides that only
/// special-case some paths delegate here for the rest.
pub fn default_ensure_directory<A: PosixAdapter + ?Sized>(adapter: &mut A, dir: &Path) -> Result<()> {
    let backend = adapter.backend();
    if backend.exists(dir) {
        if backend.is_dir(dir)? {
            return Ok(());
        }
        return Err(anyhow!("{} exists and is not a directory", dir.display()));
    }
    let mode = adapter.settings().permissions.dir.public;
    adapter.backend_mut().mkdir(dir, mode)
}

/// Rejects a move before anything is created for it.
fn check_move<B: FsBackend>(backend: &B, from: &Path, to: &Path) -> Result<()> {
    if !backend.exists(from) {
        return Err(anyhow!("{} does not exist", from.display()));
    }
    if backend.exists(to) {
        return Err(anyhow!("{} already exists", to.display()));
    }
    Ok(())
}

/// Rejects a copy before anything is created for it.
fn check_copy<B: FsBackend>(backend: &B, from: &Path, to: &Path) -> Result<()> {
    if !backend.is_file(from)? {
        return Err(anyhow!("{} is not a regular file", from.display()));
    }
    if backend.exists(to) && !backend.is_file(to)? {
        return Err(anyhow!("{} exists and is not a regular file", to.display()));
    }
    Ok(())
}

fn parent_of(inner: &Path) -> Result<&Path> {
    inner
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent", inner.display()))
}

/// Stores `contents` at `inner`: new files get the mode of the requested
/// visibility, existing ones are replaced or appended to per the write flags.
fn put<A: PosixAdapter + ?Sized>(
    adapter: &mut A,
    inner: &Path,
    contents: &[u8],
    options: WriteOptions,
) -> Result<()> {
    let settings = *adapter.settings();
    if adapter.backend().exists(inner) {
        if settings.write_flags.contains(WriteFlags::FILE_APPEND) {
            adapter.backend_mut().append(inner, contents)?;
        } else {
            adapter.backend_mut().write(inner, contents)?;
        }
        if let Some(visibility) = options.visibility {
            adapter
                .backend_mut()
                .set_mode(inner, settings.file_mode(visibility))?;
        }
        return Ok(());
    }
    let mode = settings.file_mode(options.visibility.unwrap_or_default());
    adapter.backend_mut().mkfile(inner, Some(contents), mode)
}

fn make_dir<A: PosixAdapter + ?Sized>(adapter: &mut A, inner: &Path, options: WriteOptions) -> Result<()> {
    if adapter.backend().exists(inner) {
        if adapter.backend().is_dir(inner)? {
            return Ok(());
        }
        return Err(anyhow!("{} exists and is not a directory", inner.display()));
    }
    let mode = adapter.settings().dir_mode(options.visibility.unwrap_or_default());
    adapter.backend_mut().mkdir(inner, mode)
}

fn describe<A: PosixAdapter + ?Sized>(adapter: &A, inner: &Path) -> Result<Metadata> {
    let stat = adapter.backend().stat(inner)?;
    Ok(Metadata::from_stat(utils::relative_path(inner), &stat))
}

fn settle<T>(operation: &str, path: &Path, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(operation, path = %path.display(), error = %e, "operation failed");
            None
        }
    }
}

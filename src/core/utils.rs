use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::core::Result;

/// Normalizes a path: resolves `.` and `..`, drops redundant separators and
/// trailing slashes. `..` never climbs above the first component.
pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(parent) = result.parent() {
                    result = parent.to_path_buf();
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Resolves a slash-separated path, relative to the mount root, into an inner
/// absolute normalized path.
pub fn inner_path(path: &str) -> PathBuf {
    normalize(Path::new("/").join(path.trim_start_matches('/')))
}

/// The inverse of [`inner_path`]: `/foo/bar.txt` becomes `foo/bar.txt`, the
/// root becomes the empty string.
pub fn relative_path<P: AsRef<Path>>(inner: P) -> String {
    let inner = inner.as_ref();
    inner
        .strip_prefix("/")
        .unwrap_or(inner)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn is_virtual_root<P: AsRef<Path>>(path: P) -> bool {
    normalize(path.as_ref()) == Path::new("/")
}

/// Removes a file, link or directory tree from the host.
pub fn rm_on_host<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let meta = std::fs::symlink_metadata(path)?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Converts `dirName`, `DirName`, `dir name` or `dir_name` to `dir_name`.
///
/// Every whitespace-separated word is capitalized and the whitespace dropped;
/// then an underscore is inserted before every uppercase letter that follows
/// another character and the result is lowercased.
pub fn snake_case(name: &str) -> String {
    if name.chars().all(char::is_lowercase) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    let mut word_start = true;
    for c in name.chars() {
        if c.is_whitespace() {
            word_start = true;
            continue;
        }
        if (c.is_uppercase() || (word_start && c.is_lowercase())) && !out.is_empty() {
            out.push('_');
        }
        out.extend(c.to_lowercase());
        word_start = false;
    }
    out
}

/// Name parts of a slash-separated relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathInfo {
    /// Parent path, empty for top-level nodes.
    pub dirname: String,
    pub basename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Base name without its extension.
    pub filename: String,
}

pub fn path_info(path: &str) -> PathInfo {
    let path = Path::new(path);
    let lossy = |s: &std::ffi::OsStr| s.to_string_lossy().into_owned();
    PathInfo {
        dirname: path.parent().map(relative_path).unwrap_or_default(),
        basename: path.file_name().map(lossy).unwrap_or_default(),
        extension: path.extension().map(lossy),
        filename: path.file_stem().map(lossy).unwrap_or_default(),
    }
}

/// Detects a mimetype from content first and file name second.
pub fn guess_mime(path: &Path, content: &[u8]) -> String {
    if let Some(mime) = sniff(content) {
        return mime.to_string();
    }
    let by_name = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| by_extension(&ext.to_ascii_lowercase()));
    if let Some(mime) = by_name {
        return mime.to_string();
    }
    if !content.is_empty() && std::str::from_utf8(content).is_ok() {
        "text/plain".to_string()
    } else {
        "application/octet-stream".to_string()
    }
}

fn sniff(content: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"%PDF-", "application/pdf"),
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"II*\0", "image/tiff"),
        (b"MM\0*", "image/tiff"),
        (b"PK\x03\x04", "application/zip"),
    ];
    SIGNATURES
        .iter()
        .find(|(magic, _)| content.starts_with(magic))
        .map(|(_, mime)| *mime)
}

fn by_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "txt" | "log" => "text/plain",
        "htm" | "html" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "xml" => "application/xml",
        "js" => "application/javascript",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "php" => "text/x-php",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize("/a/./b/../c/"), PathBuf::from("/a/c"));
        assert_eq!(normalize("/../../x"), PathBuf::from("/x"));
        assert_eq!(normalize("/a//b"), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_inner_and_relative_paths() {
        assert_eq!(inner_path("foo/bar.txt"), PathBuf::from("/foo/bar.txt"));
        assert_eq!(inner_path("/foo/"), PathBuf::from("/foo"));
        assert_eq!(inner_path(""), PathBuf::from("/"));
        assert_eq!(relative_path("/foo/bar.txt"), "foo/bar.txt");
        assert_eq!(relative_path("/"), "");
    }

    #[test]
    fn test_is_virtual_root() {
        assert!(is_virtual_root("/"));
        assert!(is_virtual_root("/a/.."));
        assert!(!is_virtual_root("/a"));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("dirName"), "dir_name");
        assert_eq!(snake_case("DirPermissions"), "dir_permissions");
        assert_eq!(snake_case("dir_name"), "dir_name");
        assert_eq!(snake_case("linkHandling"), "link_handling");
        assert_eq!(snake_case("fooBar"), "foo_bar");
        assert_eq!(snake_case("dir name"), "dir_name");
        assert_eq!(snake_case("Dir  Permissions"), "dir_permissions");
        assert_eq!(snake_case(" link handling "), "link_handling");
    }

    #[test]
    fn test_path_info() {
        let info = path_info("foo/bar/tile1.txt");
        assert_eq!(info.dirname, "foo/bar");
        assert_eq!(info.basename, "tile1.txt");
        assert_eq!(info.extension.as_deref(), Some("txt"));
        assert_eq!(info.filename, "tile1");

        let top = path_info("README");
        assert_eq!(top.dirname, "");
        assert_eq!(top.extension, None);
        assert_eq!(top.filename, "README");
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("a.pdf"), b""), "application/pdf");
        assert_eq!(guess_mime(Path::new("one.TIF"), b""), "image/tiff");
        assert_eq!(guess_mime(Path::new("noext"), b"%PDF-1.4"), "application/pdf");
        assert_eq!(guess_mime(Path::new("file.txt"), b"contents"), "text/plain");
        assert_eq!(guess_mime(Path::new("blob"), &[0, 159, 146, 150]), "application/octet-stream");
    }
}

//! Maps client-visible virtual paths onto object keys below the configured bucket prefix.
//!
//! Object stores have a flat namespace, so the "filesystem" here is pure bookkeeping: a virtual
//! path is normalized (`.`/`..` collapsed, `..` clamped at the root) and then prefixed to form
//! the object key. Nothing a client sends can produce a key outside the prefix.

use crate::storage::{Error, ErrorKind};
use std::path::{Component, Path, PathBuf};

// Characters we refuse in path segments, on top of ASCII control characters.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Normalizes a virtual path: makes it absolute, collapses `.` and `..`, and clamps `..` at the
/// root so the result always starts with `/` and never escapes it.
pub(crate) fn normalize_virtual<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.as_ref().components() {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// A virtual path resolved against the bucket prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedPath {
    /// The absolute path as the client sees it. Always starts with `/`.
    pub client_path: String,
    /// The object key: the prefix followed by the client path without its leading slash.
    /// Empty when the path is the root of an unprefixed bucket.
    pub fs_path: String,
}

impl ResolvedPath {
    /// True when this is the virtual root.
    pub fn is_root(&self) -> bool {
        self.client_path == "/"
    }

    /// The final path segment, empty for the root.
    pub fn base_name(&self) -> &str {
        self.client_path.rsplit('/').next().unwrap_or("")
    }

    /// The object key of the parent directory.
    pub fn parent_fs_path(&self) -> String {
        match self.fs_path.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        }
    }

    /// The object key of a child of this path.
    pub fn child_key(&self, name: &str) -> String {
        join_key(&self.fs_path, name)
    }
}

/// Joins two key fragments with a single slash, tolerating empty fragments.
pub(crate) fn join_key(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{}/{}", left.trim_end_matches('/'), right.trim_start_matches('/')),
    }
}

/// Resolves a virtual path against the configured prefix, validating every segment.
pub(crate) fn resolve<P: AsRef<Path>>(prefix: &str, path: P) -> Result<ResolvedPath, Error> {
    let normalized = normalize_virtual(path);
    let client_path = normalized.to_str().ok_or(ErrorKind::FileNameNotAllowedError)?.replace('\\', "/");
    for segment in client_path.split('/') {
        if segment.chars().any(|c| c.is_ascii_control() || FORBIDDEN.contains(&c)) {
            return Err(Error::from(ErrorKind::FileNameNotAllowedError));
        }
    }
    let relative = client_path.trim_start_matches('/');
    Ok(ResolvedPath {
        fs_path: join_key(prefix, relative),
        client_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalization_collapses_dots_and_slashes() {
        assert_eq!(normalize_virtual("/a/./b//c"), PathBuf::from("/a/b/c"));
        assert_eq!(normalize_virtual("/a/b/../c"), PathBuf::from("/a/c"));
        assert_eq!(normalize_virtual("a/b"), PathBuf::from("/a/b"));
    }

    #[test]
    fn parent_dir_is_clamped_at_the_root() {
        assert_eq!(normalize_virtual("/../../x"), PathBuf::from("/x"));
        assert_eq!(normalize_virtual("/.."), PathBuf::from("/"));
        assert_eq!(normalize_virtual("/a/../../.."), PathBuf::from("/"));
    }

    #[test]
    fn resolution_prefixes_the_key() {
        let r = resolve("pre", "/a/b.txt").unwrap();
        assert_eq!(r.client_path, "/a/b.txt");
        assert_eq!(r.fs_path, "pre/a/b.txt");
        assert_eq!(r.base_name(), "b.txt");
        assert_eq!(r.parent_fs_path(), "pre/a");
    }

    #[test]
    fn resolution_of_the_root() {
        let r = resolve("", "/").unwrap();
        assert!(r.is_root());
        assert_eq!(r.fs_path, "");
        let r = resolve("pre", "/").unwrap();
        assert_eq!(r.fs_path, "pre");
    }

    #[test]
    fn escapes_stay_inside_the_prefix() {
        let r = resolve("pre", "/../../etc/passwd").unwrap();
        assert_eq!(r.fs_path, "pre/etc/passwd");
    }

    #[test]
    fn forbidden_characters_are_rejected() {
        for bad in ["/a<b", "/a|b", "/a?b", "/a*b", "/a\"b", "/a\x01b", "/a:b"] {
            assert!(resolve("", bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn child_keys_join_cleanly() {
        let r = resolve("pre", "/sub").unwrap();
        assert_eq!(r.child_key("file.txt"), "pre/sub/file.txt");
        let root = resolve("", "/").unwrap();
        assert_eq!(root.child_key("file.txt"), "file.txt");
    }
}

//! Defines the service provider interface for storage back-end implementors.

use super::error::Error;
use crate::auth::UserDetail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    fmt::{self, Debug, Formatter, Write},
    path::Path,
    result,
    time::SystemTime,
};

/// Tells if STOR/RETR restarts are supported by the storage back-end,
/// i.e. starting from a different byte offset.
pub const FEATURE_RESTART: u32 = 0b0000_0001;

/// Result type used by traits in this module
pub type Result<T> = result::Result<T, Error>;

/// Represents the metadata of an _FTP File_
pub trait Metadata {
    /// Returns the length (size) of the file in bytes.
    fn len(&self) -> u64;

    /// Returns `self.len() == 0`.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the path is a directory.
    fn is_dir(&self) -> bool;

    /// Returns true if the path is a file.
    fn is_file(&self) -> bool;

    /// Returns the last modified time of the path.
    fn modified(&self) -> Result<SystemTime>;

    /// Returns the number of links to the file. The default implementation always returns `1`.
    fn links(&self) -> u64 {
        1
    }

    /// Returns the `permissions` of the file. The default implementation assumes unix permissions
    /// and defaults to "rwxr-xr-x" for directories and "rw-r--r--" for files.
    fn permissions(&self) -> Permissions {
        if self.is_dir() {
            Permissions(0o755)
        } else {
            Permissions(0o644)
        }
    }

    /// Returns the media type of the file, if the back-end knows it.
    fn media_type(&self) -> Option<&str> {
        None
    }
}

/// Represents the permissions of an _FTP File_
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Permissions(pub u32);

const PERM_READ: u32 = 0b100100100;
const PERM_WRITE: u32 = 0b010010010;
const PERM_EXEC: u32 = 0b001001001;
const PERM_USER: u32 = 0b111000000;
const PERM_GROUP: u32 = 0b000111000;
const PERM_OTHERS: u32 = 0b000000111;

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char(if self.0 & PERM_USER & PERM_READ > 0 { 'r' } else { '-' })?;
        f.write_char(if self.0 & PERM_USER & PERM_WRITE > 0 { 'w' } else { '-' })?;
        f.write_char(if self.0 & PERM_USER & PERM_EXEC > 0 { 'x' } else { '-' })?;
        f.write_char(if self.0 & PERM_GROUP & PERM_READ > 0 { 'r' } else { '-' })?;
        f.write_char(if self.0 & PERM_GROUP & PERM_WRITE > 0 { 'w' } else { '-' })?;
        f.write_char(if self.0 & PERM_GROUP & PERM_EXEC > 0 { 'x' } else { '-' })?;
        f.write_char(if self.0 & PERM_OTHERS & PERM_READ > 0 { 'r' } else { '-' })?;
        f.write_char(if self.0 & PERM_OTHERS & PERM_WRITE > 0 { 'w' } else { '-' })?;
        f.write_char(if self.0 & PERM_OTHERS & PERM_EXEC > 0 { 'x' } else { '-' })?;
        Ok(())
    }
}

/// Fileinfo contains the path and [`Metadata`] of a file.
#[derive(Clone)]
pub struct Fileinfo<P, M>
where
    P: AsRef<Path>,
    M: Metadata,
{
    /// The full path to the file
    pub path: P,
    /// The file's metadata
    pub metadata: M,
}

impl<P, M> Fileinfo<P, M>
where
    P: AsRef<Path>,
    M: Metadata,
{
    /// The last path component, as shown to FTP clients.
    pub fn name(&self) -> &str {
        self.path.as_ref().file_name().map(|n| n.to_str().unwrap_or("")).unwrap_or("")
    }
}

impl<P, M> fmt::Display for Fileinfo<P, M>
where
    P: AsRef<Path>,
    M: Metadata,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&super::listing::format_ls(self))
    }
}

/// The parameters of a single write ([`StorageBackend::put`]) operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PutParams {
    /// The byte offset to restart at, from a preceding REST command.
    pub start_pos: u64,
    /// Whether the write appends to an existing object (APPE) instead of replacing it (STOR).
    pub append: bool,
}

/// The `StorageBackend` trait links an FTP virtual file system to whatever actually holds the
/// bytes. Implement it and register the implementation with the [`Server`](crate::Server) on
/// construction.
#[async_trait]
pub trait StorageBackend<User: UserDetail>: Send + Sync + Debug {
    /// The concrete type of the _metadata_ used by this storage back-end.
    type Metadata: Metadata + Sync + Send;

    /// Implement to set the name of the storage back-end. By default it returns the type signature.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Tells which optional features are supported by the storage back-end.
    /// Return a value with bits set according to the FEATURE_* constants.
    fn supported_features(&self) -> u32 {
        0
    }

    /// Returns the [`Metadata`] for the given file or directory.
    async fn metadata<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<Self::Metadata>;

    /// Returns the list of files in the given directory. Dot-files are filtered out unless
    /// `show_hidden` is set; the directory placeholder never appears.
    async fn list<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P, show_hidden: bool) -> Result<Vec<Fileinfo<std::path::PathBuf, Self::Metadata>>>
    where
        <Self as StorageBackend<User>>::Metadata: Metadata;

    /// Returns the content of the given file from offset `start_pos` as a byte stream.
    async fn get<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P, start_pos: u64) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;

    /// Writes bytes from the given reader to the specified path and returns the number of bytes
    /// written. `params` carries the restart offset and append mode.
    async fn put<P: AsRef<Path> + Send + Debug, R: tokio::io::AsyncRead + Send + Sync + Unpin + 'static>(
        &self,
        user: &User,
        input: R,
        path: P,
        params: PutParams,
    ) -> Result<u64>;

    /// Deletes the file at the given path.
    async fn del<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;

    /// Creates the given directory.
    async fn mkd<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;

    /// Renames the given file or directory to the given new name.
    async fn rename<P: AsRef<Path> + Send + Debug>(&self, user: &User, from: P, to: P) -> Result<()>;

    /// Deletes the given directory, including anything in it.
    async fn rmd<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;

    /// Verifies that the given path is a directory that a client can change into.
    async fn cwd<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;

    /// Changes the permission bits of a file or directory. Back-ends without a notion of
    /// permissions accept and ignore this.
    async fn chmod<P: AsRef<Path> + Send + Debug>(&self, _user: &User, _path: P, _mode: u32) -> Result<()> {
        Ok(())
    }

    /// Produces a name unlikely to collide with an existing object, used by STOU. The extension
    /// is kept; a millisecond timestamp and a random tag, both base36, go before it.
    fn unique_name(&self, name: &str) -> String {
        let (base, ext) = match name.rsplit_once('.') {
            Some((b, e)) if !b.is_empty() => (b, Some(e)),
            _ => (name, None),
        };
        let stamp = to_base36(Utc::now().timestamp_millis() as u128);
        let tag = random_base36(13);
        match ext {
            Some(ext) => format!("{}_{}_{}.{}", base, stamp, tag, ext),
            None => format!("{}_{}_{}", base, stamp, tag),
        }
    }
}

pub(crate) fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

pub(crate) fn random_base36(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        let chunk = to_base36(uuid::Uuid::new_v4().as_u128());
        out.push_str(&chunk[..std::cmp::min(len - out.len(), chunk.len())]);
    }
    out
}

/// Formats a [`SystemTime`] the way `MDTM` wants it: `YYYYMMDDHHMMSS.sss`, UTC.
pub fn mdtm_timestamp(when: SystemTime) -> String {
    let when: DateTime<Utc> = when.into();
    when.format("%Y%m%d%H%M%S%.3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn permissions_render_like_ls() {
        assert_eq!(format!("{}", Permissions(0o755)), "rwxr-xr-x");
        assert_eq!(format!("{}", Permissions(0o644)), "rw-r--r--");
        assert_eq!(format!("{}", Permissions(0o000)), "---------");
    }

    #[test]
    fn base36_round_numbers() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn random_base36_has_requested_length() {
        let tag = random_base36(13);
        assert_eq!(tag.len(), 13);
        assert!(tag.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn mdtm_format_includes_millis() {
        let when = UNIX_EPOCH + Duration::from_millis(1_704_164_645_123); // 2024-01-02T03:04:05.123Z
        assert_eq!(mdtm_timestamp(when), "20240102030405.123");
    }
}

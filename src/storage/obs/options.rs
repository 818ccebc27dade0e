//! Configuration for the object-store back-end.

use crate::storage::{Error, ErrorKind};

/// The storage root an FTP session is attached to: a bucket plus an optional key prefix inside
/// it, written `bucket` or `bucket/some/prefix`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreRoot {
    bucket: String,
    prefix: String,
}

impl StoreRoot {
    /// Parses and validates a `bucket[/prefix]` string.
    pub fn parse(root: &str) -> Result<StoreRoot, Error> {
        let root = root.trim();
        if root.is_empty() || root == "/" || root.contains(char::is_whitespace) {
            return Err(Error::new(ErrorKind::FileNameNotAllowedError, format!("invalid storage root {:?}", root)));
        }
        let (bucket, prefix) = match root.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
            None => (root, ""),
        };
        if !valid_bucket_name(bucket) {
            return Err(Error::new(ErrorKind::FileNameNotAllowedError, format!("invalid bucket name {:?}", bucket)));
        }
        Ok(StoreRoot {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

// Bucket names: 1-63 chars, lowercase alphanumerics with `-`/`_` inside, alphanumeric at both
// ends.
fn valid_bucket_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > 63 {
        return false;
    }
    let inner_ok = bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-' || *b == b'_');
    let edge = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    inner_ok && edge(&bytes[0]) && edge(&bytes[bytes.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_bucket() {
        let root = StoreRoot::parse("my-bucket").unwrap();
        assert_eq!(root.bucket(), "my-bucket");
        assert_eq!(root.prefix(), "");
    }

    #[test]
    fn bucket_with_prefix() {
        let root = StoreRoot::parse("my-bucket/ftp/home/").unwrap();
        assert_eq!(root.bucket(), "my-bucket");
        assert_eq!(root.prefix(), "ftp/home");
    }

    #[test]
    fn single_character_bucket_is_fine() {
        assert_eq!(StoreRoot::parse("b").unwrap().bucket(), "b");
    }

    #[test]
    fn bad_roots_are_rejected() {
        for bad in ["", "/", "  ", "has space", "-leading", "trailing-", "UPPER", &"x".repeat(64)] {
            assert!(StoreRoot::parse(bad).is_err(), "{:?} should be rejected", bad);
        }
    }
}

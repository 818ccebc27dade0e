//! The [`Metadata`] implementation for objects and emulated directories.

use crate::storage::{Metadata, Result};
use std::time::SystemTime;

/// Metadata of one entry in the object store: either a real object or an emulated directory.
#[derive(Clone, Debug)]
pub struct ObjectMetadata {
    pub(crate) last_modified: SystemTime,
    pub(crate) is_file: bool,
    pub(crate) size: u64,
    pub(crate) media_type: Option<String>,
}

impl ObjectMetadata {
    /// Synthesizes the metadata of an emulated directory. The timestamp normally comes from the
    /// directory's placeholder object.
    pub(crate) fn directory(last_modified: SystemTime) -> Self {
        ObjectMetadata {
            last_modified,
            is_file: false,
            size: 0,
            media_type: None,
        }
    }
}

impl Metadata for ObjectMetadata {
    fn len(&self) -> u64 {
        self.size
    }

    fn is_dir(&self) -> bool {
        !self.is_file
    }

    fn is_file(&self) -> bool {
        self.is_file
    }

    fn modified(&self) -> Result<SystemTime> {
        Ok(self.last_modified)
    }

    fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }
}

//! Contains the service provider interface (SPI) for storage back-ends, the listing formatters
//! and the object-store back-end that maps FTP paths onto bucket keys.

pub(crate) mod error;
pub(crate) mod listing;
pub mod obs;
pub(crate) mod storage_backend;

pub use error::{Error, ErrorKind};
pub(crate) use obs::paths::normalize_virtual;
pub use listing::{format_entry, format_ep, format_ls, format_mlsd, ListFormat, MlstFact};
pub use obs::ObjectStorage;
pub use storage_backend::{mdtm_timestamp, Fileinfo, Metadata, Permissions, PutParams, Result, StorageBackend, FEATURE_RESTART};

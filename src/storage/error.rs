use crate::BoxError;
use derive_more::Display;
use thiserror::Error;

/// The error type returned by storage back-ends. Pick the [`ErrorKind`] carefully: it determines
/// the FTP reply code the client ends up seeing.
#[derive(Debug, Error)]
#[error("storage error: {kind}")]
pub struct Error {
    kind: ErrorKind,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Creates a new storage error wrapping the given source error.
    pub fn new<E>(kind: ErrorKind, error: E) -> Error
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            source: Some(error.into()),
        }
    }

    /// Tells the FTP server what to do with the failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind, source: None }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::PermanentFileNotAvailable,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted | std::io::ErrorKind::BrokenPipe => ErrorKind::ConnectionClosed,
            _ => ErrorKind::LocalError,
        };
        Error::new(kind, err)
    }
}

/// The `ErrorKind` variants that can be produced by [`StorageBackend`](crate::storage::StorageBackend)
/// implementations.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ErrorKind {
    /// 450 File not available right now, the client may retry.
    #[display("450 Transient file not available")]
    TransientFileNotAvailable,
    /// 550 File not available and retrying won't help.
    #[display("550 Permanent file not available")]
    PermanentFileNotAvailable,
    /// 550 Directory not available and retrying won't help.
    #[display("550 Permanent directory not available")]
    PermanentDirectoryNotAvailable,
    /// 550 Access to the file or directory was denied.
    #[display("550 Permission denied")]
    PermissionDenied,
    /// 426 The transfer was aborted, by the client or because of a network issue.
    #[display("426 Connection closed, transfer aborted")]
    ConnectionClosed,
    /// 451 The requested action was aborted because of a local processing error.
    #[display("451 Local error")]
    LocalError,
    /// 452 Insufficient storage space in the back-end.
    #[display("452 Insufficient storage space error")]
    InsufficientStorageSpaceError,
    /// 552 Exceeded the storage allocation.
    #[display("552 Exceeded storage allocation error")]
    ExceededStorageAllocationError,
    /// 553 The requested file name is not allowed.
    #[display("553 File name not allowed error")]
    FileNameNotAllowedError,
    /// 502 The operation is not implemented by this storage back-end.
    #[display("502 Command not implemented")]
    CommandNotImplemented,
}

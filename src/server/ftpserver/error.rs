//! Contains the error type reported by the server front-end.

use derive_more::Display;
use thiserror::Error;

/// The error returned by [`Server::listen`](crate::Server::listen).
#[derive(Debug, Error)]
#[error("server error: {kind}")]
pub struct ServerError {
    kind: ServerErrorKind,
    #[source]
    source: Option<crate::BoxError>,
}

#[derive(Debug, Display, Eq, PartialEq)]
pub enum ServerErrorKind {
    /// The bind address could not be parsed or bound.
    #[display("could not bind to the control address")]
    Bind,
    /// The TLS certificate or key could not be loaded.
    #[display("could not load the TLS configuration")]
    Tls,
    /// A configuration value is out of range.
    #[display("invalid server configuration")]
    Config,
}

impl ServerError {
    pub(crate) fn new<E>(kind: ServerErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ServerError {
            kind,
            source: Some(source.into()),
        }
    }

    pub(crate) fn config<S: Into<String>>(message: S) -> Self {
        ServerError {
            kind: ServerErrorKind::Config,
            source: Some(message.into().into()),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> &ServerErrorKind {
        &self.kind
    }
}

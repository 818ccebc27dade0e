//! Contains the `ControlChanError` struct that defines the control channel error type.

use super::line_parser::{ParseError, ParseErrorKind};
use crate::BoxError;

use derive_more::Display;
use thiserror::Error;

/// The error type produced on the control channel.
#[derive(Debug, Error)]
#[error("control channel error: {kind}")]
pub struct ControlChanError {
    kind: ControlChanErrorKind,
    #[source]
    source: Option<BoxError>,
}

/// A list specifying categories of control channel errors.
#[derive(Eq, PartialEq, Debug, Display, Clone, Copy)]
#[allow(dead_code)]
pub enum ControlChanErrorKind {
    /// We encountered a system IO error.
    #[display("Failed to perform IO")]
    IoError,
    /// The client sent a line that does not hold a well-formed directive.
    #[display("Syntax error in command line")]
    BadCommandLine,
    /// The client issued a known directive in an invalid way (e.g. `USER` without a username).
    #[display("Invalid command (invalid parameter)")]
    InvalidCommand,
    /// We encountered a non-UTF8 character in the command.
    #[display("Non-UTF8 character in command")]
    Utf8Error,
    /// Internal Server Error. This is probably a bug.
    #[display("Internal Server Error")]
    InternalServerError,
    /// The idle timer on the control channel elapsed.
    #[display("Encountered read timeout on the control channel")]
    ControlChannelTimeout,
    /// The session sent more commands than its rate limit allows.
    #[display("Command rate limit exceeded")]
    RateLimitExceeded,
    /// The control channel is out of sync, e.g. a PASS arrived without a preceding USER.
    #[display("Control channel in illegal state")]
    IllegalState,
}

impl ControlChanError {
    /// Creates a new control channel error with the specific kind
    pub fn new(kind: ControlChanErrorKind) -> Self {
        ControlChanError { kind, source: None }
    }

    /// Return the inner error kind of this error.
    pub fn kind(&self) -> ControlChanErrorKind {
        self.kind
    }
}

impl From<ControlChanErrorKind> for ControlChanError {
    fn from(kind: ControlChanErrorKind) -> ControlChanError {
        ControlChanError { kind, source: None }
    }
}

impl From<std::io::Error> for ControlChanError {
    fn from(err: std::io::Error) -> ControlChanError {
        ControlChanError {
            kind: ControlChanErrorKind::IoError,
            source: Some(Box::new(err)),
        }
    }
}

impl From<ParseError> for ControlChanError {
    fn from(err: ParseError) -> ControlChanError {
        let kind = match err.kind() {
            ParseErrorKind::InvalidUtf8 => ControlChanErrorKind::Utf8Error,
            ParseErrorKind::InvalidCommand => ControlChanErrorKind::InvalidCommand,
            ParseErrorKind::EmptyLine | ParseErrorKind::LineTooLong | ParseErrorKind::InvalidDirective => ControlChanErrorKind::BadCommandLine,
        };
        ControlChanError {
            kind,
            source: Some(Box::new(err)),
        }
    }
}

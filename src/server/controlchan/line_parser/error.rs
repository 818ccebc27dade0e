use derive_more::Display;
use std::{result, str::Utf8Error};
use thiserror::Error;

/// The error type returned by the [`parse`](super::parser::parse) function.
#[derive(Debug, Error, PartialEq)]
#[error("parse error: {kind}")]
pub struct ParseError {
    kind: ParseErrorKind,
}

/// A list specifying categories of parse errors.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Display)]
pub enum ParseErrorKind {
    /// The line contained nothing after sanitizing.
    #[display("Empty command line")]
    EmptyLine,
    /// The line exceeded the maximum length of a control channel line.
    #[display("Command line too long")]
    LineTooLong,
    /// The directive token is not a 3 or 4 letter word.
    #[display("Invalid directive")]
    InvalidDirective,
    /// The directive is known but its parameters are not acceptable.
    #[display("Invalid command (invalid parameter)")]
    InvalidCommand,
    /// Non-UTF8 character encountered.
    #[display("Non-UTF8 character while parsing")]
    InvalidUtf8,
}

impl ParseError {
    /// Returns the corresponding [`ParseErrorKind`] for this error.
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> ParseError {
        ParseError { kind }
    }
}

impl From<Utf8Error> for ParseError {
    fn from(_: Utf8Error) -> ParseError {
        ParseError {
            kind: ParseErrorKind::InvalidUtf8,
        }
    }
}

/// The Result type used in this module.
pub type Result<T> = result::Result<T, ParseError>;

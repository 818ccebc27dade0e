//! The service provider interface (SPI) for authentication.

use super::UserDetail;
use async_trait::async_trait;
use derive_more::Display;
use std::fmt::{self, Debug, Formatter};
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

/// A password, kept out of `Debug` output so it can't leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new<S: Into<String>>(password: S) -> Self {
        Password(password.into())
    }

    /// The actual password bytes. Handle with care.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Password::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Password::new(s)
    }
}

/// Everything an [`Authenticator`] gets to see about a login attempt.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// The name given with USER.
    pub username: String,
    /// The password given with PASS.
    pub password: Password,
    /// The address the control connection comes from.
    pub source_ip: IpAddr,
    /// The id of the session performing the login.
    pub session_id: String,
    /// Whether the control channel had been upgraded to TLS at login time.
    pub secure: bool,
}

/// What a successful login grants: the user detail plus where in storage the session lives and
/// any per-user restriction of the command set.
#[derive(Debug)]
pub struct LoginGrant<User: UserDetail> {
    /// The authenticated subject.
    pub user: User,
    /// The storage root for this session, `bucket[/prefix]` for the object-store back-end.
    pub root: String,
    /// The initial working directory, `/` if unset.
    pub cwd: Option<PathBuf>,
    /// Directives to refuse for this session, on top of the server-wide blacklist.
    pub blacklist: Vec<String>,
    /// If non-empty, the only directives this session may use.
    pub whitelist: Vec<String>,
}

impl<User: UserDetail> LoginGrant<User> {
    /// A grant with the given user and root and no further restrictions.
    pub fn new<S: Into<String>>(user: User, root: S) -> Self {
        LoginGrant {
            user,
            root: root.into(),
            cwd: None,
            blacklist: Vec::new(),
            whitelist: Vec::new(),
        }
    }
}

/// The error type returned by authenticators.
#[derive(Debug, Error)]
#[error("authentication error: {kind}")]
pub struct AuthenticationError {
    kind: AuthenticationErrorKind,
    #[source]
    source: Option<crate::BoxError>,
}

#[derive(Debug, Display, Eq, PartialEq)]
pub enum AuthenticationErrorKind {
    /// The username is not known.
    #[display("unknown user")]
    UnknownUser,
    /// The password did not match.
    #[display("bad password")]
    BadPassword,
    /// The account exists but may not log in.
    #[display("account disabled")]
    AccountDisabled,
    /// The authenticator itself failed.
    #[display("authenticator failure")]
    ImplementationError,
}

impl AuthenticationError {
    pub fn new(kind: AuthenticationErrorKind) -> Self {
        AuthenticationError { kind, source: None }
    }

    pub fn with_source<E>(kind: AuthenticationErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        AuthenticationError {
            kind,
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> &AuthenticationErrorKind {
        &self.kind
    }
}

impl From<AuthenticationErrorKind> for AuthenticationError {
    fn from(kind: AuthenticationErrorKind) -> Self {
        AuthenticationError::new(kind)
    }
}

/// Async authenticator interface. Implementations decide who may log in and what storage root
/// they land in.
#[async_trait]
pub trait Authenticator<User: UserDetail>: Sync + Send + Debug {
    /// Authenticates the login attempt, returning the grant on success.
    async fn login(&self, request: LoginRequest) -> Result<LoginGrant<User>, AuthenticationError>;

    /// Implement to set the name of the authenticator. By default it returns the type signature.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

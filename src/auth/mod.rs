//! Contains the service provider interface (SPI) for authentication and the built-in
//! implementations of it.
//!
//! The [`Authenticator`] decides who may log in and, through the [`LoginGrant`], where in
//! storage the session lands and which directives it may use.

pub mod anonymous;

mod authenticator;
mod user;

pub use anonymous::AnonymousAuthenticator;
pub use authenticator::{AuthenticationError, AuthenticationErrorKind, Authenticator, LoginGrant, LoginRequest, Password};
pub use user::{DefaultUser, StoragePermissions, UserDetail};

#![forbid(unsafe_code)]

//! bucketftp is an async FTP(S) server library whose files live in an HTTP object store.
//!
//! The server speaks standards-compliant FTP on the wire (RFC 959 with the usual extensions:
//! AUTH TLS, FEAT/OPTS, EPRT/EPSV, MDTM/MLST/MLSD/SIZE/REST) and maps every filesystem
//! operation onto object-store primitives: listing and moving objects, deleting in batches,
//! ranged downloads via signed URLs and streaming uploads via the store's resumable upload
//! protocol. Directories are emulated with placeholder objects because the store's namespace is
//! flat.
//!
//! Authentication is pluggable through the [`auth::Authenticator`] trait, storage through
//! [`storage::StorageBackend`], and lifecycle events can be observed through the
//! [`notification`] listeners. It runs on the Tokio runtime.
//!
//! # Quick start
//!
//! ```no_run
//! use bucketftp::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let server = Server::with_object_store(
//!         "http://localhost:8000/storage/v1",
//!         "my-service-key",
//!         "my-bucket",
//!     )
//!     .greeting("Welcome")
//!     .passive_ports(50000..=51000);
//!
//!     server.listen("127.0.0.1:2121").await.unwrap();
//! }
//! ```

pub mod auth;
pub mod notification;
pub(crate) mod server;
pub mod storage;

pub use crate::server::ftpserver::{error::ServerError, options, Server, StorageFactory};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

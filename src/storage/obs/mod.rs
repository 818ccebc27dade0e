//! A [`StorageBackend`] that keeps FTP files in an HTTP object-store service.
//!
//! The store has a flat key namespace: directories are emulated with zero-byte
//! `.emptyFolderPlaceholder` objects, downloads go through short-lived signed URLs and uploads
//! through the service's resumable chunked-upload protocol. One instance serves one bucket,
//! optionally below a fixed key prefix, and nothing it does can reach outside that root.

pub mod object_metadata;
pub mod options;

mod media_type;
pub(crate) mod paths;
mod response_body;
mod upload;
mod uri;

use crate::auth::UserDetail;
use crate::storage::{Error, ErrorKind, Fileinfo, Metadata, PutParams, Result, StorageBackend, FEATURE_RESTART};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use object_metadata::ObjectMetadata;
use options::StoreRoot;
use paths::ResolvedPath;
use response_body::{ListRequest, MoveRequest, ObjectItem, RemoveRequest, SignedUrl};
use slog::o;
use std::{
    fmt::Debug,
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
    time::SystemTime,
};
use upload::{HttpClient, TusUploader};
use uri::ObsUri;

// The zero-byte object that marks an emulated directory as existing.
const DIR_PLACEHOLDER: &str = ".emptyFolderPlaceholder";
// How many entries one listing request returns.
const LIST_LIMIT: u32 = 1000;
// Validity of the signed URLs used for downloads, in seconds.
const SIGNED_URL_TTL_SECS: u32 = 30;

/// A [`StorageBackend`] implementation backed by an HTTP object store.
pub struct ObjectStorage {
    uris: ObsUri,
    client: HttpClient,
    service_key: String,
    prefix: String,
    uploader: TusUploader,
    logger: slog::Logger,
}

impl Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage").field("uris", &self.uris).field("prefix", &self.prefix).finish()
    }
}

impl ObjectStorage {
    /// Creates a back-end for the given service URL and `bucket[/prefix]` root. The service key
    /// authorizes every request this back-end makes.
    pub fn new<S: Into<String>>(base_url: S, root: &str, service_key: S) -> Result<ObjectStorage> {
        let root = StoreRoot::parse(root)?;
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| Error::new(ErrorKind::LocalError, e))?
            .https_or_http()
            .enable_http1()
            .build();
        let client: HttpClient = Client::builder(TokioExecutor::new()).build(connector);
        let uris = ObsUri::new(base_url.into(), root.bucket().to_string());
        let service_key = service_key.into();
        let uploader = TusUploader::new(client.clone(), uris.clone(), service_key.clone());
        Ok(ObjectStorage {
            uris,
            client,
            service_key,
            prefix: root.prefix().to_string(),
            uploader,
            logger: slog::Logger::root(slog::Discard, o!()),
        })
    }

    /// Attaches a logger; without one the back-end stays silent.
    pub fn logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    fn resolve<P: AsRef<Path>>(&self, path: P) -> Result<ResolvedPath> {
        paths::resolve(&self.prefix, path)
    }

    async fn send(&self, method: Method, uri: Uri, json_body: Option<Vec<u8>>) -> Result<(StatusCode, Bytes)> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header("apikey", self.service_key.clone());
        let body = match json_body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(json))
            }
            None => Full::new(Bytes::new()),
        };
        let request = builder.body(body).map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let response = self.client.request(request).await.map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::new(ErrorKind::LocalError, e))?
            .to_bytes();
        Ok((status, bytes))
    }

    async fn list_objects(&self, prefix: &str, limit: u32, search: Option<&str>) -> Result<Vec<ObjectItem>> {
        let body = serde_json::to_vec(&ListRequest::new(prefix, limit, search)).map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let (status, bytes) = self.send(Method::POST, self.uris.list()?, Some(body)).await?;
        check_status(status)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::new(ErrorKind::LocalError, e))
    }

    // Fetches the placeholder of a directory to recover its modification time. Best effort.
    async fn placeholder_modified(&self, dir_key: &str) -> Option<SystemTime> {
        match self.list_objects(dir_key, 1, Some(DIR_PLACEHOLDER)).await {
            Ok(items) => items.first().and_then(|item| item.modified()),
            Err(_) => None,
        }
    }

    async fn remove_keys(&self, keys: Vec<String>) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let body = serde_json::to_vec(&RemoveRequest { prefixes: keys }).map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let (status, _) = self.send(Method::DELETE, self.uris.remove()?, Some(body)).await?;
        check_status(status)
    }

    async fn move_key(&self, from: &str, to: &str) -> Result<()> {
        let body = serde_json::to_vec(&MoveRequest {
            bucket_id: self.uris.bucket(),
            source_key: from,
            destination_key: to,
        })
        .map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let (status, _) = self.send(Method::POST, self.uris.move_object()?, Some(body)).await?;
        check_status(status)
    }

    async fn put_placeholder(&self, dir_key: &str) -> Result<()> {
        let key = paths::join_key(dir_key, DIR_PLACEHOLDER);
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.uris.object(&key)?)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header("apikey", self.service_key.clone())
            .header(header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.to_string())
            .header(header::CONTENT_LENGTH, "0")
            .header("x-upsert", "true")
            .body(Full::new(Bytes::new()))
            .map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let response = self.client.request(request).await.map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        check_status(response.status())
    }

    // Removes a directory tree bottom-up: files in one batch, sub-directories recursively, the
    // placeholder last so the directory never looks deleted while children remain.
    fn remove_dir_tree<'a>(&'a self, dir_key: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let items = self.list_objects(&dir_key, LIST_LIMIT, None).await?;
            let mut files = Vec::new();
            let mut dirs = Vec::new();
            for item in items {
                let key = paths::join_key(&dir_key, &item.name);
                if item.is_directory() {
                    dirs.push(key);
                } else if item.name != DIR_PLACEHOLDER {
                    files.push(key);
                }
            }
            self.remove_keys(files).await?;
            for dir in dirs {
                self.remove_dir_tree(dir).await?;
            }
            // Tolerate a missing placeholder; directories can exist purely through children.
            if let Err(err) = self.remove_keys(vec![paths::join_key(&dir_key, DIR_PLACEHOLDER)]).await {
                if err.kind() != ErrorKind::PermanentFileNotAvailable {
                    return Err(err);
                }
            }
            Ok(())
        })
    }

    fn move_dir_tree<'a>(&'a self, from_key: String, to_key: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.put_placeholder(&to_key).await?;
            let items = self.list_objects(&from_key, LIST_LIMIT, None).await?;
            for item in items {
                let source = paths::join_key(&from_key, &item.name);
                let destination = paths::join_key(&to_key, &item.name);
                if item.is_directory() {
                    self.move_dir_tree(source, destination).await?;
                } else if item.name != DIR_PLACEHOLDER {
                    self.move_key(&source, &destination).await?;
                }
            }
            if let Err(err) = self.remove_keys(vec![paths::join_key(&from_key, DIR_PLACEHOLDER)]).await {
                if err.kind() != ErrorKind::PermanentFileNotAvailable {
                    return Err(err);
                }
            }
            Ok(())
        })
    }

    async fn entry_metadata(&self, resolved: &ResolvedPath) -> Result<ObjectMetadata> {
        if resolved.is_root() {
            let modified = self.placeholder_modified(&resolved.fs_path).await.unwrap_or_else(SystemTime::now);
            return Ok(ObjectMetadata::directory(modified));
        }
        let base = resolved.base_name();
        let items = self.list_objects(&resolved.parent_fs_path(), LIST_LIMIT, Some(base)).await?;
        if let Some(item) = items.iter().find(|item| item.name == base) {
            return Ok(item.to_metadata());
        }
        // Not in the parent listing; the path may still be a directory that only exists through
        // its placeholder or children.
        let children = self.list_objects(&resolved.fs_path, 1, None).await?;
        if !children.is_empty() {
            let modified = self.placeholder_modified(&resolved.fs_path).await.unwrap_or_else(SystemTime::now);
            return Ok(ObjectMetadata::directory(modified));
        }
        Err(Error::new(ErrorKind::PermanentFileNotAvailable, format!("no such file or directory: {}", resolved.client_path)))
    }
}

#[async_trait]
impl<User: UserDetail> StorageBackend<User> for ObjectStorage {
    type Metadata = ObjectMetadata;

    fn supported_features(&self) -> u32 {
        FEATURE_RESTART
    }

    #[tracing_attributes::instrument]
    async fn metadata<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<Self::Metadata> {
        let resolved = self.resolve(path)?;
        self.entry_metadata(&resolved).await
    }

    #[tracing_attributes::instrument]
    async fn list<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P, show_hidden: bool) -> Result<Vec<Fileinfo<PathBuf, Self::Metadata>>> {
        let resolved = self.resolve(path)?;
        let items = self.list_objects(&resolved.fs_path, LIST_LIMIT, None).await?;
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            if item.name == DIR_PLACEHOLDER || (!show_hidden && item.name.starts_with('.')) {
                continue;
            }
            let mut metadata = item.to_metadata();
            if metadata.is_dir() {
                // Sub-directory mtimes live on their placeholder objects.
                if let Some(modified) = self.placeholder_modified(&resolved.child_key(&item.name)).await {
                    metadata = ObjectMetadata::directory(modified);
                }
            }
            entries.push(Fileinfo {
                path: PathBuf::from(&resolved.client_path).join(&item.name),
                metadata,
            });
        }
        Ok(entries)
    }

    async fn get<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P, start_pos: u64) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let resolved = self.resolve(path)?;
        let body = serde_json::to_vec(&serde_json::json!({ "expiresIn": SIGNED_URL_TTL_SECS })).map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let (status, bytes) = self.send(Method::POST, self.uris.sign(&resolved.fs_path)?, Some(body)).await?;
        check_status(status)?;
        let signed: SignedUrl = serde_json::from_slice(&bytes).map_err(|e| Error::new(ErrorKind::LocalError, e))?;

        let mut builder = Request::builder().method(Method::GET).uri(self.uris.signed_download(&signed.signed_url)?);
        if start_pos > 0 {
            builder = builder.header(header::RANGE, format!("bytes={}-", start_pos));
        }
        let request = builder.body(Full::new(Bytes::new())).map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let response = self.client.request(request).await.map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        match response.status() {
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => {}
            status => return Err(check_status(status).unwrap_err()),
        }
        let stream = response.into_body().into_data_stream().map_err(std::io::Error::other);
        Ok(Box::new(tokio_util::io::StreamReader::new(stream)))
    }

    async fn put<P: AsRef<Path> + Send + Debug, R: tokio::io::AsyncRead + Send + Sync + Unpin + 'static>(
        &self,
        _user: &User,
        input: R,
        path: P,
        params: PutParams,
    ) -> Result<u64> {
        let resolved = self.resolve(path)?;
        let content_type = media_type::from_file_name(resolved.base_name());
        self.uploader.upload(&resolved.fs_path, content_type, input, params, &self.logger).await
    }

    #[tracing_attributes::instrument]
    async fn del<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        let resolved = self.resolve(&path)?;
        let metadata = self.entry_metadata(&resolved).await?;
        if metadata.is_dir() {
            self.remove_dir_tree(resolved.fs_path).await
        } else {
            self.remove_keys(vec![resolved.fs_path]).await
        }
    }

    #[tracing_attributes::instrument]
    async fn mkd<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        let resolved = self.resolve(path)?;
        self.put_placeholder(&resolved.fs_path).await
    }

    #[tracing_attributes::instrument]
    async fn rename<P: AsRef<Path> + Send + Debug>(&self, _user: &User, from: P, to: P) -> Result<()> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        let metadata = self.entry_metadata(&from).await?;
        if metadata.is_file() {
            self.move_key(&from.fs_path, &to.fs_path).await
        } else {
            self.move_dir_tree(from.fs_path, to.fs_path).await
        }
    }

    #[tracing_attributes::instrument]
    async fn rmd<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        let resolved = self.resolve(path)?;
        self.remove_dir_tree(resolved.fs_path).await
    }

    #[tracing_attributes::instrument]
    async fn cwd<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        let resolved = self.resolve(path)?;
        if resolved.is_root() {
            return Ok(());
        }
        let children = self.list_objects(&resolved.fs_path, 1, None).await?;
        if children.is_empty() {
            return Err(Error::new(
                ErrorKind::PermanentDirectoryNotAvailable,
                format!("directory does not exist: {}", resolved.client_path),
            ));
        }
        Ok(())
    }

    async fn chmod<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P, mode: u32) -> Result<()> {
        slog::warn!(self.logger, "chmod {:o} on {:?} ignored, the object store has no permission bits", mode, path.as_ref());
        Ok(())
    }
}

fn check_status(status: StatusCode) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    let kind = match status.as_u16() {
        400 | 404 => ErrorKind::PermanentFileNotAvailable,
        401 | 403 => ErrorKind::PermissionDenied,
        409 => ErrorKind::FileNameNotAllowedError,
        413 => ErrorKind::ExceededStorageAllocationError,
        429 => ErrorKind::TransientFileNotAvailable,
        _ => ErrorKind::LocalError,
    };
    Err(Error::new(kind, format!("object store request failed with http status {}", status)))
}

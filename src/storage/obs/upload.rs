//! A client for the object store's resumable (tus flavoured) upload protocol.
//!
//! An upload is created with a deferred length, fed in fixed-size chunks and finalized by
//! declaring the total length on the last PATCH. Open uploads are journalled per object key so a
//! restarted FTP transfer (REST + STOR/APPE) can resume where the previous one left off.

use super::uri::ObsUri;
use crate::storage::{Error, ErrorKind, PutParams, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

const TUS_VERSION: &str = "1.0.0";
const CHUNK_SIZE: usize = 6 * 1024 * 1024;
const RETRY_DELAYS_MS: [u64; 5] = [0, 3_000, 5_000, 10_000, 20_000];

pub(crate) type HttpClient = hyper_util::client::legacy::Client<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>, Full<Bytes>>;

pub(crate) struct TusUploader {
    client: HttpClient,
    uris: ObsUri,
    service_key: String,
    // Object key -> upload URL of an upload that has been created but not yet finalized.
    journal: Arc<DashMap<String, String>>,
}

impl TusUploader {
    pub fn new(client: HttpClient, uris: ObsUri, service_key: String) -> Self {
        TusUploader {
            client,
            uris,
            service_key,
            journal: Arc::new(DashMap::new()),
        }
    }

    /// Streams `input` to the object at `key`. Returns the number of bytes consumed from the
    /// input, which excludes any prefix already present in a resumed upload.
    pub async fn upload<R>(&self, key: &str, content_type: &str, mut input: R, params: PutParams, logger: &slog::Logger) -> Result<u64>
    where
        R: tokio::io::AsyncRead + Send + Sync + Unpin,
    {
        let (upload_url, mut offset) = self.open_upload(key, content_type, params).await?;

        if params.start_pos != 0 && params.start_pos != offset {
            return Err(Error::new(
                ErrorKind::TransientFileNotAvailable,
                format!("restart marker {} does not match upload offset {}", params.start_pos, offset),
            ));
        }

        let mut written: u64 = 0;
        let mut buffer = vec![0_u8; 64 * 1024];
        loop {
            let mut chunk = BytesMut::with_capacity(CHUNK_SIZE);
            let mut eof = false;
            while chunk.len() < CHUNK_SIZE {
                let want = std::cmp::min(buffer.len(), CHUNK_SIZE - chunk.len());
                let n = input.read(&mut buffer[..want]).await.map_err(Error::from)?;
                if n == 0 {
                    eof = true;
                    break;
                }
                chunk.extend_from_slice(&buffer[..n]);
            }
            let chunk = chunk.freeze();
            let total = if eof { Some(offset + chunk.len() as u64) } else { None };
            written += chunk.len() as u64;
            self.patch_with_retry(&upload_url, &mut offset, chunk, total, logger).await?;
            if eof {
                break;
            }
        }

        self.journal.remove(key);
        Ok(written)
    }

    // Finds a journalled upload to resume or creates a fresh one. Returns (url, server offset).
    async fn open_upload(&self, key: &str, content_type: &str, params: PutParams) -> Result<(String, u64)> {
        if let Some(entry) = self.journal.get(key) {
            let url = entry.value().clone();
            drop(entry);
            match self.current_offset(&url).await? {
                Some(offset) if params.start_pos > 0 || params.append || offset == 0 => return Ok((url, offset)),
                _ => {
                    // A stale upload and the client wants a clean write: start over.
                    self.journal.remove(key);
                }
            }
        }
        if params.start_pos > 0 {
            return Err(Error::new(ErrorKind::PermanentFileNotAvailable, "no resumable upload to restart from"));
        }
        let url = self.create(key, content_type, params.append).await?;
        self.journal.insert(key.to_string(), url.clone());
        Ok((url, 0))
    }

    async fn create(&self, key: &str, content_type: &str, upsert: bool) -> Result<String> {
        let metadata = format!(
            "bucketName {},objectName {},contentType {}",
            BASE64.encode(self.uris.bucket()),
            BASE64.encode(key),
            BASE64.encode(content_type),
        );
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.uris.resumable_upload()?)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Defer-Length", "1")
            .header("Upload-Metadata", metadata);
        if upsert {
            builder = builder.header("x-upsert", "true");
        }
        let request = self
            .authorized(builder)
            .body(Full::new(Bytes::new()))
            .map_err(|e| Error::new(ErrorKind::LocalError, e))?;

        let response = self.client.request(request).await.map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        if response.status() != StatusCode::CREATED {
            return Err(upload_error(response.status()));
        }
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::new(ErrorKind::LocalError, "upload creation reply carried no location"))?;
        Ok(self.uris.upload_location(location))
    }

    // Asks the server how far an upload has progressed. `None` means the upload is gone.
    async fn current_offset(&self, url: &str) -> Result<Option<u64>> {
        let request = self
            .authorized(Request::builder().method(Method::HEAD).uri(url).header("Tus-Resumable", TUS_VERSION))
            .body(Full::new(Bytes::new()))
            .map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let response = self.client.request(request).await.map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                let offset = response
                    .headers()
                    .get("Upload-Offset")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(|| Error::new(ErrorKind::LocalError, "upload status reply carried no offset"))?;
                Ok(Some(offset))
            }
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(None),
            status => Err(upload_error(status)),
        }
    }

    async fn patch(&self, url: &str, offset: u64, chunk: Bytes, total: Option<u64>) -> Result<()> {
        let mut builder = Request::builder()
            .method(Method::PATCH)
            .uri(url)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Offset", offset.to_string())
            .header(header::CONTENT_TYPE, "application/offset+octet-stream");
        if let Some(total) = total {
            builder = builder.header("Upload-Length", total.to_string());
        }
        let request = self.authorized(builder).body(Full::new(chunk)).map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let response = self.client.request(request).await.map_err(|e| Error::new(ErrorKind::TransientFileNotAvailable, e))?;
        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => {
                // Drain so the connection can be reused.
                let _ = response.into_body().collect().await;
                Ok(())
            }
            status => Err(upload_error(status)),
        }
    }

    // Sends one chunk, re-synchronizing on the server's offset between attempts.
    async fn patch_with_retry(&self, url: &str, offset: &mut u64, chunk: Bytes, total: Option<u64>, logger: &slog::Logger) -> Result<()> {
        let chunk_start = *offset;
        let chunk_end = chunk_start + chunk.len() as u64;
        let mut last_error = Error::from(ErrorKind::LocalError);
        for (attempt, delay) in RETRY_DELAYS_MS.iter().enumerate() {
            if *delay > 0 {
                tokio::time::sleep(Duration::from_millis(*delay)).await;
            }
            let skip = (*offset - chunk_start) as usize;
            match self.patch(url, *offset, chunk.slice(skip..), total).await {
                Ok(()) => {
                    *offset = chunk_end;
                    return Ok(());
                }
                Err(err) => {
                    slog::warn!(logger, "upload chunk attempt {} failed: {}", attempt + 1, err);
                    last_error = err;
                    // The server may have taken part of the chunk before failing.
                    if let Ok(Some(server_offset)) = self.current_offset(url).await {
                        if server_offset >= chunk_end {
                            *offset = chunk_end;
                            return Ok(());
                        }
                        if server_offset >= chunk_start {
                            *offset = server_offset;
                        }
                    }
                }
            }
        }
        Err(last_error)
    }

    fn authorized(&self, builder: hyper::http::request::Builder) -> hyper::http::request::Builder {
        builder
            .header(header::AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header("apikey", self.service_key.clone())
    }
}

fn upload_error(status: StatusCode) -> Error {
    let kind = match status.as_u16() {
        404 | 410 => ErrorKind::PermanentFileNotAvailable,
        401 | 403 => ErrorKind::PermissionDenied,
        409 => ErrorKind::FileNameNotAllowedError,
        413 => ErrorKind::ExceededStorageAllocationError,
        429 | 500..=599 => ErrorKind::TransientFileNotAvailable,
        _ => ErrorKind::LocalError,
    };
    Error::new(kind, format!("upload request failed with http status {}", status))
}

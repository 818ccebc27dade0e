use crate::storage::{Error, ErrorKind};
use hyper::Uri;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

// Everything that must be escaped inside a key while keeping `/` intact.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'[')
    .add(b']');

/// Builds the HTTP endpoints of the object-store service for one bucket.
#[derive(Clone, Debug)]
pub(crate) struct ObsUri {
    base_url: String,
    bucket: String,
}

impl ObsUri {
    pub fn new(base_url: String, bucket: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `POST` here with a prefix/search body to enumerate objects.
    pub fn list(&self) -> Result<Uri, Error> {
        make_uri(format!("{}/object/list/{}", self.base_url, self.bucket))
    }

    /// `POST` here to obtain a time-limited signed download URL for `key`.
    pub fn sign(&self, key: &str) -> Result<Uri, Error> {
        make_uri(format!("{}/object/sign/{}/{}", self.base_url, self.bucket, encode_key(key)))
    }

    /// Turns the relative signed URL the service hands back into an absolute one.
    pub fn signed_download(&self, signed_url: &str) -> Result<Uri, Error> {
        if signed_url.starts_with('/') {
            make_uri(format!("{}{}", self.base_url, signed_url))
        } else {
            make_uri(signed_url.to_string())
        }
    }

    /// `DELETE` here with a `prefixes` body to remove objects in one call.
    pub fn remove(&self) -> Result<Uri, Error> {
        make_uri(format!("{}/object/{}", self.base_url, self.bucket))
    }

    /// `POST` here to create the zero-byte object at `key` (directory placeholders).
    pub fn object(&self, key: &str) -> Result<Uri, Error> {
        make_uri(format!("{}/object/{}/{}", self.base_url, self.bucket, encode_key(key)))
    }

    /// `POST` here with source/destination keys to move an object.
    pub fn move_object(&self) -> Result<Uri, Error> {
        make_uri(format!("{}/object/move", self.base_url))
    }

    /// The tus creation endpoint for resumable uploads.
    pub fn resumable_upload(&self) -> Result<Uri, Error> {
        make_uri(format!("{}/upload/resumable", self.base_url))
    }

    /// Resolves the `Location` returned by a tus creation request, which may be relative.
    pub fn upload_location(&self, location: &str) -> String {
        if location.starts_with('/') {
            format!("{}{}", self.base_url, location)
        } else {
            location.to_string()
        }
    }
}

fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET).to_string()
}

fn make_uri(path_and_query: String) -> Result<Uri, Error> {
    Uri::try_from(path_and_query).map_err(|e| Error::new(ErrorKind::FileNameNotAllowedError, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn uris() -> ObsUri {
        ObsUri::new("http://localhost:8000/storage/v1".to_string(), "b".to_string())
    }

    #[test]
    fn list_and_remove_endpoints() {
        assert_eq!(uris().list().unwrap().to_string(), "http://localhost:8000/storage/v1/object/list/b");
        assert_eq!(uris().remove().unwrap().to_string(), "http://localhost:8000/storage/v1/object/b");
    }

    #[test]
    fn sign_keeps_slashes_and_escapes_spaces() {
        let uri = uris().sign("sub/my file.txt").unwrap();
        assert_eq!(uri.to_string(), "http://localhost:8000/storage/v1/object/sign/b/sub/my%20file.txt");
    }

    #[test]
    fn relative_signed_urls_become_absolute() {
        let uri = uris().signed_download("/object/sign/b/x.txt?token=abc").unwrap();
        assert_eq!(uri.to_string(), "http://localhost:8000/storage/v1/object/sign/b/x.txt?token=abc");
    }

    #[test]
    fn upload_location_resolution() {
        assert_eq!(
            uris().upload_location("/upload/resumable/xyz"),
            "http://localhost:8000/storage/v1/upload/resumable/xyz"
        );
        assert_eq!(uris().upload_location("http://elsewhere/u/1"), "http://elsewhere/u/1");
    }
}

//! Wire types for the object-store JSON API.

use super::object_metadata::ObjectMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// The body of a list request: enumerate the objects directly below `prefix`, optionally
/// narrowed to names matching `search`.
#[derive(Debug, Serialize)]
pub(crate) struct ListRequest<'a> {
    pub prefix: &'a str,
    pub limit: u32,
    pub offset: u32,
    #[serde(rename = "sortBy")]
    pub sort_by: SortBy<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SortBy<'a> {
    pub column: &'a str,
    pub order: &'a str,
}

impl<'a> ListRequest<'a> {
    pub fn new(prefix: &'a str, limit: u32, search: Option<&'a str>) -> Self {
        ListRequest {
            prefix,
            limit,
            offset: 0,
            sort_by: SortBy { column: "name", order: "asc" },
            search,
        }
    }
}

/// One entry returned by a list request. Entries without `metadata` are sub-directories in the
/// store's emulated hierarchy.
#[derive(Debug, Deserialize)]
pub(crate) struct ObjectItem {
    pub name: String,
    #[allow(dead_code)]
    pub id: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub metadata: Option<ItemMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemMetadata {
    pub size: Option<u64>,
    pub mimetype: Option<String>,
    #[allow(dead_code)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectItem {
    pub fn is_directory(&self) -> bool {
        self.metadata.is_none()
    }

    /// The best modification time we have for this entry.
    pub fn modified(&self) -> Option<SystemTime> {
        self.updated_at.or(self.created_at).map(SystemTime::from)
    }

    pub fn to_metadata(&self) -> ObjectMetadata {
        let last_modified = self.modified().unwrap_or_else(SystemTime::now);
        match &self.metadata {
            Some(meta) => ObjectMetadata {
                last_modified,
                is_file: true,
                size: meta.size.unwrap_or(0),
                media_type: meta.mimetype.clone(),
            },
            None => ObjectMetadata::directory(last_modified),
        }
    }
}

/// Response to a sign request: a relative URL carrying a single-use download token.
#[derive(Debug, Deserialize)]
pub(crate) struct SignedUrl {
    #[serde(rename = "signedURL")]
    pub signed_url: String,
}

/// Body of a move request.
#[derive(Debug, Serialize)]
pub(crate) struct MoveRequest<'a> {
    #[serde(rename = "bucketId")]
    pub bucket_id: &'a str,
    #[serde(rename = "sourceKey")]
    pub source_key: &'a str,
    #[serde(rename = "destinationKey")]
    pub destination_key: &'a str,
}

/// Body of a batch remove request.
#[derive(Debug, Serialize)]
pub(crate) struct RemoveRequest {
    pub prefixes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Metadata;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_entries_carry_metadata() {
        let json = r#"{
            "name": "readme.txt",
            "id": "3b6bf9a0",
            "updated_at": "2024-01-02T03:04:05.000Z",
            "created_at": "2024-01-01T00:00:00.000Z",
            "metadata": {"size": 10, "mimetype": "text/plain", "lastModified": "2024-01-02T03:04:05.000Z"}
        }"#;
        let item: ObjectItem = serde_json::from_str(json).unwrap();
        assert!(!item.is_directory());
        let meta = item.to_metadata();
        assert!(meta.is_file());
        assert_eq!(meta.len(), 10);
        assert_eq!(meta.media_type(), Some("text/plain"));
    }

    #[test]
    fn directory_entries_have_no_metadata() {
        let json = r#"{"name": "sub", "id": null, "updated_at": null, "created_at": null, "metadata": null}"#;
        let item: ObjectItem = serde_json::from_str(json).unwrap();
        assert!(item.is_directory());
        assert!(item.to_metadata().is_dir());
    }

    #[test]
    fn list_request_serializes_in_the_service_shape() {
        let body = serde_json::to_value(ListRequest::new("pre/sub", 1000, Some(".emptyFolderPlaceholder"))).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "prefix": "pre/sub",
                "limit": 1000,
                "offset": 0,
                "sortBy": {"column": "name", "order": "asc"},
                "search": ".emptyFolderPlaceholder"
            })
        );
    }

    #[test]
    fn signed_url_field_name() {
        let parsed: SignedUrl = serde_json::from_str(r#"{"signedURL": "/object/sign/b/x?token=t"}"#).unwrap();
        assert_eq!(parsed.signed_url, "/object/sign/b/x?token=t");
    }
}

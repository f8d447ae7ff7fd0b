//! Upload payloads exchanged with the credential endpoint and media service.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Signed, time-limited parameters authorizing a single upload.
///
/// Fetched fresh for every attempt and never cached.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCredential {
    pub signature: String,
    /// Unix timestamp (seconds) after which the signature is rejected.
    pub expire: i64,
    pub token: String,
    pub public_key: String,
}

impl UploadCredential {
    /// Whether every string field carries a value.
    pub fn is_complete(&self) -> bool {
        [&self.signature, &self.token, &self.public_key]
            .iter()
            .all(|value| !value.trim().is_empty())
    }
}

impl fmt::Debug for UploadCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UploadCredential")
            .field("signature", &"[REDACTED]")
            .field("expire", &self.expire)
            .field("token", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// A user-selected file.
///
/// `bytes` is reference counted, so cloning a target never copies the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadTarget {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for UploadTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UploadTarget")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// File metadata returned by the media service after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub file_id: String,
    pub name: String,
    pub size: u64,
    pub file_path: String,
    pub url: String,
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl UploadResult {
    /// Resolve the URL to render this file from.
    ///
    /// Joins the media-delivery base URL with `file_path` when one is
    /// configured, otherwise returns the URL reported by the service.
    pub fn delivery_url(&self, url_endpoint: Option<&str>) -> String {
        let Some(base) = url_endpoint.map(|value| value.trim().trim_end_matches('/')) else {
            return self.url.clone();
        };
        if base.is_empty() || self.file_path.is_empty() {
            return self.url.clone();
        }
        format!("{base}/{}", self.file_path.trim_start_matches('/'))
    }

    /// Whether the service classified the file as an image.
    pub fn is_image(&self) -> bool {
        self.file_type.eq_ignore_ascii_case("image")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_result() -> UploadResult {
        UploadResult {
            file_id: "f1".to_string(),
            name: "a.png".to_string(),
            size: 10_485_760,
            file_path: "/a.png".to_string(),
            url: "https://x/a.png".to_string(),
            file_type: "image".to_string(),
            height: None,
            width: None,
            thumbnail_url: None,
        }
    }

    #[test]
    fn credential_parses_camel_case_body() {
        let credential: UploadCredential = serde_json::from_str(
            r#"{"signature":"s","expire":1700000000,"token":"t","publicKey":"pk"}"#,
        )
        .unwrap();
        assert_eq!(credential.signature, "s");
        assert_eq!(credential.expire, 1_700_000_000);
        assert_eq!(credential.token, "t");
        assert_eq!(credential.public_key, "pk");
        assert!(credential.is_complete());
    }

    #[test]
    fn credential_debug_redacts_secrets() {
        let credential = UploadCredential {
            signature: "sensitive-signature".to_string(),
            expire: 1,
            token: "sensitive-token".to_string(),
            public_key: "pk".to_string(),
        };
        let debug_output = format!("{credential:?}");
        assert!(!debug_output.contains("sensitive-signature"));
        assert!(!debug_output.contains("sensitive-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn credential_with_blank_fields_is_incomplete() {
        let credential = UploadCredential {
            signature: " ".to_string(),
            expire: 1,
            token: "t".to_string(),
            public_key: "pk".to_string(),
        };
        assert!(!credential.is_complete());
    }

    #[test]
    fn result_parses_optional_image_fields() {
        let result: UploadResult = serde_json::from_str(
            r#"{
                "fileId": "f1",
                "name": "a.png",
                "size": 10485760,
                "filePath": "/a.png",
                "url": "https://x/a.png",
                "fileType": "image",
                "height": 600,
                "width": 800,
                "thumbnailUrl": "https://x/tr:n-thumb/a.png",
                "versionInfo": {"id": "v1"}
            }"#,
        )
        .unwrap();
        assert_eq!(result.height, Some(600));
        assert_eq!(result.width, Some(800));
        assert_eq!(
            result.thumbnail_url.as_deref(),
            Some("https://x/tr:n-thumb/a.png")
        );
        assert!(result.is_image());
    }

    #[test]
    fn delivery_url_prefers_configured_endpoint() {
        let result = sample_result();
        assert_eq!(result.delivery_url(None), "https://x/a.png");
        assert_eq!(
            result.delivery_url(Some("https://ik.example.com/demo/")),
            "https://ik.example.com/demo/a.png"
        );
        assert_eq!(result.delivery_url(Some("  ")), "https://x/a.png");
    }

    #[test]
    fn target_clone_shares_payload() {
        let target = UploadTarget::new("a.png", None, vec![0_u8; 16]);
        let copy = target.clone();
        assert_eq!(copy.size(), 16);
        assert_eq!(copy.bytes.as_ptr(), target.bytes.as_ptr());
    }
}

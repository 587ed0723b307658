//! Upload types: options, file payload, signed policy and results

use crate::s3::error::{Result, UploadError};
use crate::s3::secret::SecretKey;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How the policy constrains the object key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyCondition {
    /// The key must equal the derived key
    #[default]
    Exact,
    /// The key must start with this prefix
    StartsWith(String),
}

/// Options for a single POST upload
///
/// Immutable for the duration of one call. `bucket`, `region` and both halves
/// of the credential pair are required.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Target bucket name
    pub bucket: String,
    /// Region identifier, used to build the endpoint host
    pub region: String,
    /// Base domain override (default: amazonaws.com)
    pub endpoint_host: Option<String>,
    /// Prepended to the file name to form the object key
    pub key_prefix: String,
    /// Access key ID sent as `AWSAccessKeyId`
    pub access_key_id: String,
    /// Secret used to sign the policy, never sent
    pub secret_key: SecretKey,
    /// Canned ACL
    pub acl: String,
    /// Status code the provider returns on success
    pub success_action_status: u16,
    /// How long the signed policy stays valid
    pub expiration_window: Duration,
    /// Key constraint written into the policy
    pub key_condition: KeyCondition,
}

impl UploadOptions {
    pub const DEFAULT_ENDPOINT_HOST: &'static str = "amazonaws.com";
    pub const DEFAULT_ACL: &'static str = "private";
    pub const DEFAULT_SUCCESS_ACTION_STATUS: u16 = 201;
    pub const DEFAULT_EXPIRATION_WINDOW: Duration = Duration::from_secs(5 * 60);

    /// Create options with the required fields and defaults for the rest
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_key: impl Into<SecretKey>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint_host: None,
            key_prefix: String::new(),
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
            acl: Self::DEFAULT_ACL.to_string(),
            success_action_status: Self::DEFAULT_SUCCESS_ACTION_STATUS,
            expiration_window: Self::DEFAULT_EXPIRATION_WINDOW,
            key_condition: KeyCondition::Exact,
        }
    }

    pub fn with_endpoint_host(mut self, host: impl Into<String>) -> Self {
        self.endpoint_host = Some(host.into());
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_acl(mut self, acl: impl Into<String>) -> Self {
        self.acl = acl.into();
        self
    }

    pub fn with_success_action_status(mut self, status: u16) -> Self {
        self.success_action_status = status;
        self
    }

    pub fn with_expiration_window(mut self, window: Duration) -> Self {
        self.expiration_window = window;
        self
    }

    pub fn with_key_condition(mut self, condition: KeyCondition) -> Self {
        self.key_condition = condition;
        self
    }

    /// Endpoint host resolved against the default
    pub fn endpoint_host(&self) -> &str {
        match self.endpoint_host.as_deref() {
            Some(host) if !host.is_empty() => host,
            _ => Self::DEFAULT_ENDPOINT_HOST,
        }
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(UploadError::Configuration("bucket must not be empty".to_string()));
        }
        if self.region.is_empty() {
            return Err(UploadError::Configuration("region must not be empty".to_string()));
        }
        if self.access_key_id.is_empty() {
            return Err(UploadError::Configuration(
                "access key id must not be empty".to_string(),
            ));
        }
        if self.secret_key.is_empty() {
            return Err(UploadError::Configuration(
                "secret key must not be empty".to_string(),
            ));
        }
        if self.acl.is_empty() {
            return Err(UploadError::Configuration("acl must not be empty".to_string()));
        }
        Ok(())
    }
}

/// File payload to upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// File name, appended to the key prefix
    pub name: String,
    /// MIME content type
    pub content_type: String,
    /// Binary content
    pub body: Bytes,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Read a local file, guessing the content type from its extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                UploadError::Configuration(format!("Not a file path: {}", path.display()))
            })?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let body = tokio::fs::read(path).await?;

        Ok(Self::new(name, content_type, body))
    }
}

/// A policy signed for exactly one upload
///
/// Minted fresh per call and never reused.
#[derive(Debug, Clone)]
pub struct SignedPolicy {
    pub access_key_id: String,
    /// Base64 policy document
    pub policy: String,
    /// Base64 HMAC-SHA1 over `policy`
    pub signature: String,
    pub key: String,
    pub content_type: String,
    pub acl: String,
    pub success_action_status: String,
    pub expiration: DateTime<Utc>,
}

impl SignedPolicy {
    /// Plain-text form fields in the order they are sent
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.key.clone()),
            ("acl", self.acl.clone()),
            ("success_action_status", self.success_action_status.clone()),
            ("Content-Type", self.content_type.clone()),
            ("AWSAccessKeyId", self.access_key_id.clone()),
            ("policy", self.policy.clone()),
            ("signature", self.signature.clone()),
        ]
    }
}

/// Fields extracted from the provider's `PostResponse` XML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub key: Option<String>,
    pub etag: Option<String>,
    pub bucket: Option<String>,
    pub location: Option<String>,
}

impl UploadResult {
    /// True when none of the four fields were found
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.etag.is_none() && self.bucket.is_none() && self.location.is_none()
    }
}

/// Successful upload response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    /// HTTP status returned by the provider
    pub status: u16,
    /// Raw response text, possibly empty
    pub text: Option<String>,
    /// Parsed fields, absent exactly when `text` is absent; all empty for `""`
    pub post_response: Option<UploadResult>,
}

impl UploadResponse {
    /// Parsed fields, all empty when there was no body
    pub fn result(&self) -> UploadResult {
        self.post_response.clone().unwrap_or_default()
    }
}

//! Signed POST uploads to S3-compatible storage
//!
//! This module provides:
//! - POST policy construction and HMAC-SHA1 signing
//! - Multipart form assembly and a pluggable HTTP transport
//! - Extraction of the provider's `PostResponse` fields

pub mod error;
pub mod multipart;
pub mod policy;
pub mod response;
pub mod secret;
pub mod transport;
pub mod types;
pub mod upload;

// Re-export main types for convenience
pub use error::{Result, UploadError};
pub use policy::{Condition, PolicyDocument, PolicySigner};
pub use response::parse_post_response;
pub use secret::SecretKey;
pub use transport::{FilePart, HyperTransport, Transport, TransportResponse, UploadRequest};
pub use types::{
    KeyCondition, SignedPolicy, UploadFile, UploadOptions, UploadResponse, UploadResult,
};
pub use upload::{build_request, endpoint_url, Uploader};

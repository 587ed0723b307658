//! HTTP transport for POST uploads
//!
//! The orchestrator hands a fully assembled [`UploadRequest`] to a
//! [`Transport`] and gets back the raw status and text. [`HyperTransport`] is
//! the default implementation:
//! - HTTP/1.1 over native-tls
//! - Single attempt per request (canceled requests are not retried)
//! - Request timeout around the whole exchange

use crate::s3::error::{Result, UploadError};
use crate::s3::multipart::MultipartBody;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use std::time::Duration;

/// The binary part of an upload
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// A fully assembled POST upload
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub url: String,
    /// Plain text fields, in send order
    pub fields: Vec<(String, String)>,
    /// Sent after every plain field
    pub file: FilePart,
}

impl UploadRequest {
    /// Value of a plain text field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Encode as `multipart/form-data`, file part last
    pub fn to_multipart(&self, mut body: MultipartBody) -> MultipartBody {
        for (name, value) in &self.fields {
            body.text(name, value);
        }
        body.file(
            &self.file.field,
            &self.file.file_name,
            &self.file.content_type,
            &self.file.body,
        );
        body
    }
}

/// Raw provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Response body; `Some("")` for an empty body, `None` when the transport had none
    pub text: Option<String>,
}

/// Sends one upload request and returns whatever the provider answered
///
/// Implementations must not retry: a resent body carries a policy that may
/// have expired. Dropping the returned future cancels the request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: UploadRequest) -> Result<TransportResponse>;
}

/// Default transport over hyper
///
/// Clone is cheap - the underlying HTTP client uses Arc internally.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl HyperTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new() -> Result<Self> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(10)));

        let tls = TlsConnector::new()
            .map_err(|e| UploadError::Transport(format!("TLS setup failed: {}", e)))?;
        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .retry_canceled_requests(false)
            .set_host(true)
            .build(https);

        Ok(Self {
            client,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: UploadRequest) -> Result<TransportResponse> {
        let body = request.to_multipart(MultipartBody::new());
        let content_type = body.content_type();
        let bytes = body.finish();

        let req = Request::builder()
            .method(Method::POST)
            .uri(&request.url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, bytes.len())
            .body(Full::new(bytes))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(req))
            .await
            .map_err(|_| {
                UploadError::Transport(format!("Request timed out after {:?}", self.timeout))
            })??;

        let status = response.status().as_u16();
        let body_bytes = response
            .collect()
            .await
            .map_err(|e| UploadError::Transport(format!("Body error: {}", e)))?
            .to_bytes();

        let text = Some(String::from_utf8_lossy(&body_bytes).into_owned());

        Ok(TransportResponse { status, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UploadRequest {
        UploadRequest {
            url: "https://s3.us-east-1.amazonaws.com/b".to_string(),
            fields: vec![
                ("key".to_string(), "k".to_string()),
                ("acl".to_string(), "private".to_string()),
            ],
            file: FilePart {
                field: "file".to_string(),
                file_name: "a.txt".to_string(),
                content_type: "text/plain".to_string(),
                body: Bytes::from_static(b"hello"),
            },
        }
    }

    #[test]
    fn test_field_lookup() {
        let request = request();
        assert_eq!(request.field("key"), Some("k"));
        assert_eq!(request.field("missing"), None);
    }

    #[test]
    fn test_file_part_is_last() {
        let bytes = request().to_multipart(MultipartBody::with_boundary("BND")).finish();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        let key_pos = text.find("name=\"key\"").unwrap();
        let acl_pos = text.find("name=\"acl\"").unwrap();
        let file_pos = text.find("name=\"file\"; filename=\"a.txt\"").unwrap();
        assert!(key_pos < acl_pos);
        assert!(acl_pos < file_pos);
        assert!(text.ends_with("hello\r\n--BND--\r\n"));
    }

    #[tokio::test]
    async fn test_transport_creation() {
        let transport = HyperTransport::new().unwrap().with_timeout(Duration::from_secs(5));
        assert_eq!(transport.timeout, Duration::from_secs(5));
        let _clone = transport.clone();
    }
}

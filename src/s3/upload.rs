//! POST upload orchestration
//!
//! One call signs a fresh policy, assembles the form, sends it once through
//! the injected [`Transport`] and extracts the `PostResponse` fields. There
//! are no retries: a failed upload must be signed again by calling
//! [`Uploader::upload`] again.

use crate::s3::error::{Result, UploadError};
use crate::s3::policy::PolicySigner;
use crate::s3::response::parse_post_response;
use crate::s3::transport::{FilePart, HyperTransport, Transport, TransportResponse, UploadRequest};
use crate::s3::types::{SignedPolicy, UploadFile, UploadOptions, UploadResponse};
use chrono::{DateTime, Utc};
use hyper::Uri;
use tracing::debug;

/// Form field carrying the binary payload
pub const FILE_FIELD: &str = "file";

/// Path-style endpoint: `https://s3.<region>.<host>/<bucket>`
pub fn endpoint_url(options: &UploadOptions) -> String {
    let host = options.endpoint_host();
    let mut url = String::with_capacity(
        "https://s3.".len() + options.region.len() + 1 + host.len() + 1 + options.bucket.len(),
    );
    url.push_str("https://s3.");
    url.push_str(&options.region);
    url.push('.');
    url.push_str(host);
    url.push('/');
    url.push_str(&options.bucket);
    url
}

/// Assemble the request for a signed policy
pub fn build_request(options: &UploadOptions, file: &UploadFile, signed: &SignedPolicy) -> UploadRequest {
    let fields = signed
        .form_fields()
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

    UploadRequest {
        url: endpoint_url(options),
        fields,
        file: FilePart {
            field: FILE_FIELD.to_string(),
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
            body: file.body.clone(),
        },
    }
}

/// Uploads files with signed POST policies
pub struct Uploader<T> {
    transport: T,
}

impl Uploader<HyperTransport> {
    /// Uploader over the default hyper transport
    pub fn with_default_transport() -> Result<Self> {
        Ok(Self::new(HyperTransport::new()?))
    }
}

impl<T: Transport> Uploader<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sign and assemble without sending
    ///
    /// A bucket, region or host that cannot form a valid URI is a
    /// configuration error here rather than a transport failure later.
    pub fn prepare(
        &self,
        file: &UploadFile,
        options: &UploadOptions,
        now: DateTime<Utc>,
    ) -> Result<UploadRequest> {
        let signed = PolicySigner::sign(options, file, now)?;
        let request = build_request(options, file, &signed);
        request.url.parse::<Uri>().map_err(|e| {
            UploadError::Configuration(format!("invalid endpoint url {:?}: {}", request.url, e))
        })?;
        Ok(request)
    }

    /// Upload `file`, returning the provider's parsed confirmation
    ///
    /// Configuration problems fail before any network I/O. A non-2xx answer
    /// becomes [`UploadError::Provider`] with the raw status and body.
    pub async fn upload(&self, file: &UploadFile, options: &UploadOptions) -> Result<UploadResponse> {
        let request = self.prepare(file, options, Utc::now())?;

        debug!(
            url = %request.url,
            key = request.field("key").unwrap_or_default(),
            size = request.file.body.len(),
            "post_upload_send"
        );

        let response = self.transport.send(request).await?;

        debug!(status = response.status, "post_upload_response");

        into_upload_response(response)
    }
}

fn into_upload_response(response: TransportResponse) -> Result<UploadResponse> {
    let TransportResponse { status, text } = response;

    if !(200..300).contains(&status) {
        return Err(UploadError::Provider {
            status,
            body: text.unwrap_or_default(),
        });
    }

    let post_response = text.as_deref().map(|t| parse_post_response(Some(t)));
    Ok(UploadResponse {
        status,
        text,
        post_response,
    })
}

//! `multipart/form-data` body encoding
//!
//! Parts are written in insertion order. Callers add the file part last.

use bytes::{BufMut, Bytes, BytesMut};
use rand::distributions::Alphanumeric;
use rand::Rng;

const BOUNDARY_PREFIX: &str = "----s3post";
const BOUNDARY_RANDOM_LEN: usize = 24;

/// A multipart body under construction
pub struct MultipartBody {
    boundary: String,
    buf: BytesMut,
}

impl MultipartBody {
    /// Start a body with a random boundary
    pub fn new() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(BOUNDARY_RANDOM_LEN)
            .map(char::from)
            .collect();
        Self::with_boundary(format!("{}{}", BOUNDARY_PREFIX, suffix))
    }

    /// Start a body with a fixed boundary
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buf: BytesMut::with_capacity(1024),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a plain text field
    pub fn text(&mut self, name: &str, value: &str) {
        self.open_part();
        self.buf.put_slice(b"Content-Disposition: form-data; name=\"");
        Self::put_quoted(&mut self.buf, name);
        self.buf.put_slice(b"\"\r\n\r\n");
        self.buf.put_slice(value.as_bytes());
        self.buf.put_slice(b"\r\n");
    }

    /// Append a file field
    pub fn file(&mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) {
        self.open_part();
        self.buf.put_slice(b"Content-Disposition: form-data; name=\"");
        Self::put_quoted(&mut self.buf, name);
        self.buf.put_slice(b"\"; filename=\"");
        Self::put_quoted(&mut self.buf, file_name);
        self.buf.put_slice(b"\"\r\nContent-Type: ");
        self.buf.put_slice(content_type.as_bytes());
        self.buf.put_slice(b"\r\n\r\n");
        self.buf.put_slice(data);
        self.buf.put_slice(b"\r\n");
    }

    /// Write the closing delimiter and return the encoded bytes
    pub fn finish(mut self) -> Bytes {
        self.buf.put_slice(b"--");
        self.buf.put_slice(self.boundary.as_bytes());
        self.buf.put_slice(b"--\r\n");
        self.buf.freeze()
    }

    fn open_part(&mut self) {
        self.buf.put_slice(b"--");
        self.buf.put_slice(self.boundary.as_bytes());
        self.buf.put_slice(b"\r\n");
    }

    /// Percent-escape the characters that would break a quoted header value
    fn put_quoted(buf: &mut BytesMut, s: &str) {
        for byte in s.bytes() {
            match byte {
                b'"' => buf.put_slice(b"%22"),
                b'\r' => buf.put_slice(b"%0D"),
                b'\n' => buf.put_slice(b"%0A"),
                _ => buf.put_u8(byte),
            }
        }
    }
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

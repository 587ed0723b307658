//! `PostResponse` field extraction
//!
//! The success body is a small fixed XML fragment, so each field is pulled
//! out with its own pattern instead of a full XML parse. The supported schema
//! is exactly `Key`, `ETag`, `Bucket` and `Location`; a new field needs a new
//! named pattern here.

use crate::s3::types::UploadResult;
use regex::Regex;
use std::sync::LazyLock;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Key>(.*?)</Key>").expect("static pattern"));

// ETag may arrive wrapped in literal or entity-escaped quotes
static ETAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<ETag>(?:"|&quot;)?(.*?)(?:"|&quot;)?</ETag>"#).expect("static pattern")
});

static BUCKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Bucket>(.*?)</Bucket>").expect("static pattern"));

static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Location>(.*?)</Location>").expect("static pattern"));

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the four response fields independently
///
/// Absent or empty text yields an all-empty result; a missing element only
/// leaves its own field empty.
pub fn parse_post_response(text: Option<&str>) -> UploadResult {
    let Some(text) = text else {
        return UploadResult::default();
    };

    UploadResult {
        key: capture(&KEY_RE, text),
        etag: capture(&ETAG_RE, text),
        bucket: capture(&BUCKET_RE, text),
        location: capture(&LOCATION_RE, text),
    }
}

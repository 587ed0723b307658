//! POST policy construction and signing
//!
//! Uses the browser-POST signature scheme: the policy JSON is base64 encoded
//! and signed with HMAC-SHA1 keyed by the secret key, and the digest is base64
//! encoded. Sent alongside `AWSAccessKeyId`, `policy` and `signature`.
//!
//! Every plain form field other than `AWSAccessKeyId`, `policy` and
//! `signature` gets exactly one condition. Conditions and form fields are
//! derived from the same list.

use crate::s3::error::{Result, UploadError};
use crate::s3::secret::SecretKey;
use crate::s3::types::{KeyCondition, SignedPolicy, UploadFile, UploadOptions};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Serialize, Serializer};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Expiration timestamp format: ISO-8601, UTC, millisecond precision
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Form fields the provider does not require a condition for
pub const UNCONDITIONED_FIELDS: [&str; 3] = ["AWSAccessKeyId", "policy", "signature"];

/// One entry of the policy's `conditions` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `{"field": "value"}`
    Exact { field: String, value: String },
    /// `["starts-with", "$field", "prefix"]`
    StartsWith { field: String, prefix: String },
}

impl Condition {
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Exact {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Condition::StartsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Condition::Exact { field, value } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(field, value)?;
                map.end()
            }
            Condition::StartsWith { field, prefix } => {
                let mut seq = serializer.serialize_tuple(3)?;
                seq.serialize_element("starts-with")?;
                seq.serialize_element(&format!("${}", field))?;
                seq.serialize_element(prefix)?;
                seq.end()
            }
        }
    }
}

/// Policy document before encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    pub expiration: String,
    pub conditions: Vec<Condition>,
}

impl PolicyDocument {
    /// Canonical JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Base64 of the canonical JSON, no line wrapping
    pub fn encode(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_json()?))
    }
}

/// Builds and signs POST policies
pub struct PolicySigner;

impl PolicySigner {
    /// Sign a policy for `file` using the current time
    ///
    /// The clock is read exactly once.
    pub fn sign_now(options: &UploadOptions, file: &UploadFile) -> Result<SignedPolicy> {
        Self::sign(options, file, Utc::now())
    }

    /// Sign a policy for `file` as of `now`
    ///
    /// Pure: the same inputs give byte-identical policy and signature.
    pub fn sign(
        options: &UploadOptions,
        file: &UploadFile,
        now: DateTime<Utc>,
    ) -> Result<SignedPolicy> {
        options.validate()?;

        let key = Self::object_key(options, file);
        if key.is_empty() {
            return Err(UploadError::Configuration("object key is empty".to_string()));
        }
        if file.content_type.contains(['\r', '\n']) {
            return Err(UploadError::Configuration(
                "content type must not contain line breaks".to_string(),
            ));
        }
        let expiration = Self::expiration(options, now)?;
        let success_action_status = options.success_action_status.to_string();

        let document = Self::document(options, &key, &file.content_type, &success_action_status, expiration)?;
        let policy = document.encode()?;
        let signature = Self::signature(&options.secret_key, &policy)?;

        Ok(SignedPolicy {
            access_key_id: options.access_key_id.clone(),
            policy,
            signature,
            key,
            content_type: file.content_type.clone(),
            acl: options.acl.clone(),
            success_action_status,
            expiration,
        })
    }

    /// `key_prefix + file.name`, unsanitized
    pub fn object_key(options: &UploadOptions, file: &UploadFile) -> String {
        let mut key = String::with_capacity(options.key_prefix.len() + file.name.len());
        key.push_str(&options.key_prefix);
        key.push_str(&file.name);
        key
    }

    /// Build the policy document for an already derived key
    pub fn document(
        options: &UploadOptions,
        key: &str,
        content_type: &str,
        success_action_status: &str,
        expiration: DateTime<Utc>,
    ) -> Result<PolicyDocument> {
        let key_condition = match &options.key_condition {
            KeyCondition::Exact => Condition::exact("key", key),
            KeyCondition::StartsWith(prefix) => {
                if !key.starts_with(prefix.as_str()) {
                    return Err(UploadError::Configuration(format!(
                        "key {:?} does not start with policy prefix {:?}",
                        key, prefix
                    )));
                }
                Condition::starts_with("key", prefix.as_str())
            }
        };

        let conditions = vec![
            Condition::exact("bucket", options.bucket.as_str()),
            key_condition,
            Condition::exact("acl", options.acl.as_str()),
            Condition::exact("success_action_status", success_action_status),
            Condition::exact("Content-Type", content_type),
        ];

        Ok(PolicyDocument {
            expiration: expiration.format(EXPIRATION_FORMAT).to_string(),
            conditions,
        })
    }

    /// `now + expiration_window`
    fn expiration(options: &UploadOptions, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let window = TimeDelta::from_std(options.expiration_window).map_err(|_| {
            UploadError::Configuration("expiration window is out of range".to_string())
        })?;
        now.checked_add_signed(window)
            .ok_or_else(|| UploadError::Signing("policy expiration overflows".to_string()))
    }

    /// base64(HMAC-SHA1(secret, policy))
    fn signature(secret: &SecretKey, policy: &str) -> Result<String> {
        let digest = Self::hmac_sha1(secret.expose(), policy.as_bytes())?;
        Ok(STANDARD.encode(digest))
    }

    fn hmac_sha1(key: &[u8], msg: &[u8]) -> Result<[u8; 20]> {
        let mut mac = HmacSha1::new_from_slice(key)
            .map_err(|e| UploadError::Signing(format!("Invalid HMAC key: {}", e)))?;
        mac.update(msg);
        let result = mac.finalize().into_bytes();
        let mut output = [0u8; 20];
        output.copy_from_slice(&result);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn options() -> UploadOptions {
        UploadOptions::new("b", "us-east-1", "AK", "SK").with_key_prefix("u/")
    }

    fn file() -> UploadFile {
        UploadFile::new("a.png", "image/png", &b"png-bytes"[..])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_hmac_sha1_rfc2202_vector() {
        let digest = PolicySigner::hmac_sha1(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(STANDARD.encode(digest), "7/zfauXrL6LSdBbV8YTfnCWafHk=");
    }

    #[test]
    fn test_known_policy_and_signature() {
        let signed = PolicySigner::sign(&options(), &file(), now()).unwrap();

        let json = String::from_utf8(STANDARD.decode(&signed.policy).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"expiration":"2024-01-01T00:05:00.000Z","conditions":[{"bucket":"b"},{"key":"u/a.png"},{"acl":"private"},{"success_action_status":"201"},{"Content-Type":"image/png"}]}"#
        );
        assert_eq!(signed.signature, "8im684RBFx7WosIDezqJzHy8Q8I=");
        assert_eq!(signed.access_key_id, "AK");
        assert_eq!(signed.key, "u/a.png");
        assert_eq!(signed.content_type, "image/png");
        assert_eq!(signed.acl, "private");
        assert_eq!(signed.success_action_status, "201");
    }

    #[test]
    fn test_signing_is_deterministic() {
        let first = PolicySigner::sign(&options(), &file(), now()).unwrap();
        let second = PolicySigner::sign(&options(), &file(), now()).unwrap();
        assert_eq!(first.policy, second.policy);
        assert_eq!(first.signature, second.signature);
    }

    #[test]
    fn test_expiration_changes_signature() {
        let first = PolicySigner::sign(&options(), &file(), now()).unwrap();
        let later = now() + TimeDelta::seconds(301);
        let second = PolicySigner::sign(&options(), &file(), later).unwrap();

        assert_ne!(first.expiration, second.expiration);
        assert_ne!(first.policy, second.policy);
        assert_ne!(first.signature, second.signature);
    }

    #[test]
    fn test_expiration_window_is_configurable() {
        let options = options().with_expiration_window(Duration::from_secs(60));
        let signed = PolicySigner::sign(&options, &file(), now()).unwrap();
        assert_eq!(
            signed.expiration.format(EXPIRATION_FORMAT).to_string(),
            "2024-01-01T00:01:00.000Z"
        );
    }

    #[test]
    fn test_object_key_derivation() {
        let cases = [("", "a.png"), ("u/", "a.png"), ("deep/nested/", "x y.txt"), ("p-", "f")];
        for (prefix, name) in cases {
            let options = UploadOptions::new("b", "r", "AK", "SK").with_key_prefix(prefix);
            let file = UploadFile::new(name, "text/plain", &b""[..]);
            let signed = PolicySigner::sign(&options, &file, now()).unwrap();
            assert_eq!(signed.key, format!("{}{}", prefix, name));
        }
    }

    #[test]
    fn test_empty_bucket_is_configuration_error() {
        let options = UploadOptions::new("", "us-east-1", "AK", "SK");
        let err = PolicySigner::sign(&options, &file(), now()).unwrap_err();
        assert!(matches!(err, UploadError::Configuration(_)));
    }

    #[test]
    fn test_empty_key_is_configuration_error() {
        let file = UploadFile::new("", "image/png", &b""[..]);
        let err = PolicySigner::sign(&UploadOptions::new("b", "r", "AK", "SK"), &file, now()).unwrap_err();
        assert!(matches!(err, UploadError::Configuration(_)));
    }

    #[test]
    fn test_conditions_cover_form_fields() {
        let cases = [
            options(),
            options().with_key_condition(KeyCondition::StartsWith("u/".to_string())),
        ];

        for options in cases {
            let signed = PolicySigner::sign(&options, &file(), now()).unwrap();
            let policy: serde_json::Value =
                serde_json::from_slice(&STANDARD.decode(&signed.policy).unwrap()).unwrap();

            // field -> (is prefix match, value)
            let mut conditioned = BTreeMap::new();
            for condition in policy["conditions"].as_array().unwrap() {
                let (field, entry) = match condition {
                    serde_json::Value::Object(map) => {
                        assert_eq!(map.len(), 1);
                        let (field, value) = map.iter().next().unwrap();
                        (field.clone(), (false, value.as_str().unwrap().to_string()))
                    }
                    serde_json::Value::Array(parts) => {
                        assert_eq!(parts[0], "starts-with");
                        let field = parts[1].as_str().unwrap().trim_start_matches('$');
                        (field.to_string(), (true, parts[2].as_str().unwrap().to_string()))
                    }
                    other => panic!("unexpected condition: {}", other),
                };
                assert!(conditioned.insert(field.clone(), entry).is_none(), "duplicate {}", field);
            }

            assert_eq!(conditioned.remove("bucket"), Some((false, "b".to_string())));
            let sent: Vec<(&str, String)> = signed
                .form_fields()
                .into_iter()
                .filter(|(name, _)| !UNCONDITIONED_FIELDS.contains(name))
                .collect();
            assert_eq!(conditioned.len(), sent.len());
            for (name, value) in sent {
                match conditioned.get(name) {
                    Some((false, expected)) => assert_eq!(&value, expected),
                    Some((true, prefix)) => assert!(value.starts_with(prefix.as_str())),
                    None => panic!("no condition for {}", name),
                }
            }
        }
    }

    #[test]
    fn test_content_type_line_breaks_rejected() {
        for content_type in ["text/plain\r\nX-Injected: 1", "text/plain\nx", "a\rb"] {
            let file = UploadFile::new("a.txt", content_type, &b""[..]);
            let err = PolicySigner::sign(&options(), &file, now()).unwrap_err();
            assert!(matches!(err, UploadError::Configuration(_)));
        }
    }

    #[test]
    fn test_starts_with_key_condition() {
        let options = options().with_key_condition(KeyCondition::StartsWith("u/".to_string()));
        let signed = PolicySigner::sign(&options, &file(), now()).unwrap();
        let json = String::from_utf8(STANDARD.decode(&signed.policy).unwrap()).unwrap();
        assert!(json.contains(r#"["starts-with","$key","u/"]"#));
        assert_eq!(signed.key, "u/a.png");
    }

    #[test]
    fn test_starts_with_mismatch_rejected() {
        let options = options().with_key_condition(KeyCondition::StartsWith("other/".to_string()));
        let err = PolicySigner::sign(&options, &file(), now()).unwrap_err();
        assert!(matches!(err, UploadError::Configuration(_)));
    }

    #[test]
    fn test_policy_has_no_line_wrapping() {
        let file = UploadFile::new("a".repeat(200), "image/png", &b""[..]);
        let signed = PolicySigner::sign(&options(), &file, now()).unwrap();
        assert!(signed.policy.len() > 76);
        assert!(!signed.policy.contains('\n'));
    }

    #[test]
    fn test_secret_not_in_signed_policy() {
        let options = UploadOptions::new("b", "us-east-1", "AK", "very-secret-value");
        let signed = PolicySigner::sign(&options, &file(), now()).unwrap();
        let printed = format!("{:?}", signed);
        assert!(!printed.contains("very-secret-value"));
        let json = String::from_utf8(STANDARD.decode(&signed.policy).unwrap()).unwrap();
        assert!(!json.contains("very-secret-value"));
    }
}

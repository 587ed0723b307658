use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use super::args::FileArgs;
use crate::s3::policy::EXPIRATION_FORMAT;
use crate::s3::{
    HyperTransport, PolicySigner, SignedPolicy, UploadFile, UploadOptions, UploadRequest, Uploader,
};

/// Apply command line overrides to the profile's options
pub fn apply_overrides(options: &UploadOptions, args: &FileArgs) -> UploadOptions {
    let mut options = options.clone();
    if let Some(prefix) = &args.key_prefix {
        options = options.with_key_prefix(prefix.clone());
    }
    if let Some(acl) = &args.acl {
        options = options.with_acl(acl.clone());
    }
    options
}

async fn load_file(args: &FileArgs) -> Result<UploadFile> {
    let mut file = UploadFile::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if let Some(content_type) = &args.content_type {
        file.content_type = content_type.clone();
    }
    Ok(file)
}

/// Upload a local file and print the provider's confirmation as JSON
pub async fn cmd_upload(options: &UploadOptions, args: &FileArgs, timeout: u64) -> Result<()> {
    let options = apply_overrides(options, args);
    let file = load_file(args).await?;

    info!(
        "Uploading {} ({} bytes) to s3://{}/{}{}",
        args.file.display(),
        file.body.len(),
        options.bucket,
        options.key_prefix,
        file.name
    );

    let transport = HyperTransport::new()?.with_timeout(Duration::from_secs(timeout));
    let uploader = Uploader::new(transport);
    let response = uploader
        .upload(&file, &options)
        .await
        .context("Upload failed")?;

    let output = json!({
        "status": response.status,
        "postResponse": response.post_response,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print the signed form without sending it
pub async fn cmd_policy(options: &UploadOptions, args: &FileArgs) -> Result<()> {
    let options = apply_overrides(options, args);
    let file = load_file(args).await?;

    let signed = PolicySigner::sign_now(&options, &file).context("Failed to sign policy")?;
    let request = crate::s3::build_request(&options, &file, &signed);

    let output = policy_output(&request, &signed);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Dry-run view of a signed form, with the expiration exactly as signed
fn policy_output(request: &UploadRequest, signed: &SignedPolicy) -> serde_json::Value {
    let fields: serde_json::Map<String, serde_json::Value> = request
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), json!(value)))
        .collect();

    json!({
        "url": request.url,
        "expiration": signed.expiration.format(EXPIRATION_FORMAT).to_string(),
        "fields": fields,
        "fileField": request.file.field,
    })
}

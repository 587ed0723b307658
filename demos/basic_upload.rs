//! Basic usage example for s3post
//!
//! Signs a POST policy for a local file and uploads it.
//!
//! Run with:
//! ```
//! cargo run --example basic_upload -- ./photo.png
//! ```

use s3post::s3::{PolicySigner, UploadError, UploadFile, UploadOptions, Uploader};

#[tokio::main]
async fn main() -> Result<(), UploadError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "photo.png".to_string());

    let options = UploadOptions::new("my-bucket", "us-east-1", "YOUR_ACCESS_KEY", "YOUR_SECRET_KEY")
        .with_key_prefix("uploads/")
        .with_acl("public-read");

    println!("s3post - Basic Upload Example");
    println!("=============================\n");

    // Example 1: Inspect the signed policy
    let file = UploadFile::from_path(&path).await?;
    let signed = PolicySigner::sign_now(&options, &file)?;
    println!("1. Signed policy for key {}", signed.key);
    println!("   Expires: {}", signed.expiration);
    for (name, value) in signed.form_fields() {
        println!("   {} = {}", name, value);
    }
    println!();

    // Example 2: Upload
    println!("2. Uploading {} ({} bytes)...", file.name, file.body.len());
    let uploader = Uploader::with_default_transport()?;
    match uploader.upload(&file, &options).await {
        Ok(response) => {
            let result = response.result();
            println!("   Status: {}", response.status);
            println!("   Key: {:?}", result.key);
            println!("   ETag: {:?}", result.etag);
            println!("   Location: {:?}", result.location);
        }
        Err(UploadError::Provider { status, body }) => {
            println!("   Rejected with {}:\n{}", status, body);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

//! s3post - signed browser-style POST uploads to S3-compatible storage

pub mod cli;
pub mod config;
pub mod s3;

pub use config::Config;
pub use s3::{UploadError, UploadFile, UploadOptions, Uploader};

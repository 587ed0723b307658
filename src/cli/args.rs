use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// s3post - signed browser-style POST uploads to S3-compatible storage
#[derive(Parser, Debug)]
#[command(name = "s3post")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (falls back to environment variables)
    #[arg(long, global = true, env = "S3POST_CONFIG")]
    pub config: Option<String>,

    /// Profile to use from config
    #[arg(long, global = true, env = "S3POST_PROFILE")]
    pub profile: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Per-file overrides of the profile's upload options
#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// Local file to upload
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Key prefix (overrides the profile)
    #[arg(long)]
    pub key_prefix: Option<String>,

    /// Content type (default: guessed from the file extension)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Canned ACL (overrides the profile)
    #[arg(long)]
    pub acl: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file with a signed POST policy
    Upload {
        #[command(flatten)]
        file: FileArgs,

        /// Request timeout in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
    },

    /// Print the signed form fields and target URL without uploading
    Policy {
        #[command(flatten)]
        file: FileArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Commands::Upload { timeout, .. } = &self.command {
            if *timeout == 0 {
                anyhow::bail!("Timeout must be greater than 0");
            }
        }

        let file = match &self.command {
            Commands::Upload { file, .. } | Commands::Policy { file } => file,
        };
        if let Some(content_type) = &file.content_type {
            if content_type.trim().is_empty() {
                anyhow::bail!("Content type cannot be empty");
            }
            if content_type.contains(['\r', '\n']) {
                anyhow::bail!("Content type cannot contain line breaks");
            }
        }

        Ok(())
    }
}

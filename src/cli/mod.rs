//! CLI module for s3post
//!
//! # Usage
//!
//! ```bash
//! # Upload with the default profile from the environment
//! S3_BUCKET=photos AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=... \
//!     s3post upload ./a.png --key-prefix u/
//!
//! # Inspect the signed form for a profile in a config file
//! s3post --config s3post.yaml --profile prod policy ./a.png
//! ```

pub mod args;
pub mod commands;

use anyhow::{Context, Result};
use tracing::debug;

pub use args::{Cli, Commands, FileArgs};

use crate::config;

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    cli.validate().context("Invalid arguments")?;
    debug!("CLI arguments: {:?}", cli);

    let config = config::load_config(cli.config.as_deref(), cli.profile.as_deref())?;
    let profile = config
        .get_profile(cli.profile.as_deref())
        .ok_or_else(|| anyhow::anyhow!("No profile found in configuration"))?;
    let options = profile.to_upload_options();

    match &cli.command {
        Commands::Upload { file, timeout } => {
            commands::cmd_upload(&options, file, *timeout).await?;
        }
        Commands::Policy { file } => {
            commands::cmd_policy(&options, file).await?;
        }
    }

    Ok(())
}

/// Initialize logging to stderr
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

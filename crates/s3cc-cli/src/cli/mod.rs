//! CLI for s3cc.

mod commands;
pub(crate) mod interrupt;

use anyhow::Result;
use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand};
use s3cc_core::config::{self, S3ccConfig};
use s3cc_core::logging;
use s3cc_core::remote::S3Url;
use std::path::PathBuf;

use commands::{run_etag, run_verify};

/// Top-level CLI for s3cc.
#[derive(Debug, Parser)]
#[command(name = "s3cc")]
#[command(
    about = "s3cc: check that a local file tree matches its copy in S3 (size and ETag)",
    long_about = None
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short = 'D', long, global = true)]
    pub debug: bool,

    /// Config file to use instead of ~/.config/s3cc/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Overrides for config.toml values.
#[derive(Debug, Clone, Default, Args)]
pub struct Tuning {
    /// Multipart chunk size the objects were uploaded with (e.g. 8MiB).
    #[arg(long, value_name = "SIZE")]
    pub chunk_size: Option<ByteSize>,

    /// Files compared concurrently.
    #[arg(long, value_name = "N")]
    pub file_workers: Option<usize>,

    /// Chunks hashed concurrently, across all files.
    #[arg(long, value_name = "N")]
    pub chunk_workers: Option<usize>,

    /// Directory for staged chunks (default /dev/shm).
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Scratch budget (default: free space of the scratch dir).
    #[arg(long, value_name = "SIZE")]
    pub scratch_capacity: Option<ByteSize>,

    /// S3 endpoint URL.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

impl Tuning {
    pub fn apply(&self, cfg: &mut S3ccConfig) {
        if let Some(size) = self.chunk_size {
            cfg.chunk_size = size.as_u64();
        }
        if let Some(n) = self.file_workers {
            cfg.file_workers = n;
        }
        if let Some(n) = self.chunk_workers {
            cfg.chunk_workers = n;
        }
        if let Some(dir) = &self.scratch_dir {
            cfg.scratch_dir = Some(dir.clone());
        }
        if let Some(cap) = self.scratch_capacity {
            cfg.scratch_capacity = Some(cap.as_u64());
        }
        if let Some(endpoint) = &self.endpoint {
            cfg.endpoint = endpoint.clone();
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Compare every file under BASE_DIR with its object under TARGET.
    Verify {
        /// Local directory to verify.
        base_dir: PathBuf,

        /// Remote location, as s3://bucket/prefix.
        target: S3Url,

        #[command(flatten)]
        tuning: Tuning,

        /// Print the summary as one JSON line.
        #[arg(long)]
        json: bool,
    },

    /// Print the S3 ETag of a local file for the configured chunk size.
    Etag {
        /// Path to the file.
        path: PathBuf,

        #[command(flatten)]
        tuning: Tuning,
    },
}

impl CliCommand {
    /// Run the parsed command; returns the process exit status.
    pub fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let mut cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_default()?,
        };

        let log_file = cli.log_file.clone().or_else(|| cfg.log_file.clone());
        logging::init_logging(cli.debug, log_file.as_deref())?;
        tracing::debug!(
            endpoint = %cfg.endpoint,
            region = %cfg.region,
            chunk_size = %ByteSize(cfg.chunk_size),
            file_workers = cfg.file_workers,
            chunk_workers = cfg.chunk_workers,
            "loaded config"
        );
        let abort = interrupt::install_abort_handler()?;

        match cli.command {
            CliCommand::Verify {
                base_dir,
                target,
                tuning,
                json,
            } => {
                tuning.apply(&mut cfg);
                run_verify(&cfg, &base_dir, &target, json, abort)
            }
            CliCommand::Etag { path, tuning } => {
                tuning.apply(&mut cfg);
                run_etag(&cfg, &path, abort)
            }
        }
    }
}

#[cfg(test)]
mod tests;

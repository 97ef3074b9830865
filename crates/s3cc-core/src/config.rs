use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default S3 multipart chunk size (the AWS CLI default).
pub const DEFAULT_CHUNK_SIZE: u64 = 8 * 1024 * 1024;

/// Backoff while waiting for scratch capacity (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay between two reservation attempts, in milliseconds.
    pub interval_ms: u64,
    /// Give up after this many attempts. Missing = wait forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: None,
        }
    }
}

/// Global configuration loaded from `~/.config/s3cc/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3ccConfig {
    /// Multipart chunk size used when the objects were uploaded, in bytes.
    pub chunk_size: u64,
    /// Concurrent file comparisons.
    pub file_workers: usize,
    /// Concurrent per-chunk MD5 computations (shared by all comparisons).
    pub chunk_workers: usize,
    /// S3 endpoint used for HEAD requests (path-style addressing).
    pub endpoint: String,
    /// Region used in request signatures.
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key for signed requests. Missing = `AWS_ACCESS_KEY_ID`, else unsigned.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret key for signed requests. Missing = `AWS_SECRET_ACCESS_KEY`.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Session token for temporary credentials.
    #[serde(default)]
    pub session_token: Option<String>,
    /// Connect timeout for HEAD requests, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Total timeout for one HEAD request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory where chunks are staged. Missing = `/dev/shm`, or the temp dir.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    /// Scratch budget in bytes. Missing = free space of `scratch_dir` at startup.
    #[serde(default)]
    pub scratch_capacity: Option<u64>,
    /// Optional backoff settings; if missing, built-in defaults are used.
    #[serde(default)]
    pub backoff: Option<BackoffConfig>,
    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for S3ccConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            file_workers: 32,
            chunk_workers: 64,
            endpoint: "https://s3.amazonaws.com".to_string(),
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            scratch_dir: None,
            scratch_capacity: None,
            backoff: None,
            log_file: None,
        }
    }
}

impl S3ccConfig {
    /// Scratch directory to use: configured value or `/dev/shm` / temp dir.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(crate::scratch::default_scratch_dir)
    }

    /// Backoff settings with defaults filled in.
    pub fn backoff(&self) -> BackoffConfig {
        self.backoff.clone().unwrap_or_default()
    }
}

/// Location of the user config file; nothing is created.
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("s3cc")?;
    Ok(xdg_dirs.get_config_home().join("s3cc").join("config.toml"))
}

/// Load the user config file, or built-in defaults when there is none.
///
/// Never writes to disk.
pub fn load_or_default() -> Result<S3ccConfig> {
    load_at(&config_path()?)
}

/// Load `path` if it exists, otherwise return the defaults.
pub fn load_at(path: &Path) -> Result<S3ccConfig> {
    if !path.exists() {
        return Ok(S3ccConfig::default());
    }
    load_from(path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<S3ccConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: S3ccConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = S3ccConfig::default();
        assert_eq!(cfg.chunk_size, 8 * 1024 * 1024);
        assert_eq!(cfg.file_workers, 32);
        assert_eq!(cfg.chunk_workers, 64);
        assert!(cfg.scratch_capacity.is_none());
        assert_eq!(cfg.backoff(), BackoffConfig::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = S3ccConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: S3ccConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.chunk_size, cfg.chunk_size);
        assert_eq!(parsed.file_workers, cfg.file_workers);
        assert_eq!(parsed.chunk_workers, cfg.chunk_workers);
        assert_eq!(parsed.endpoint, cfg.endpoint);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            chunk_size = 16_777_216
            file_workers = 4
            chunk_workers = 8
            endpoint = "http://127.0.0.1:9000"
            scratch_dir = "/var/tmp/s3cc"
            scratch_capacity = 1_073_741_824

            [backoff]
            interval_ms = 250
            max_attempts = 10
        "#;
        let cfg: S3ccConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.chunk_size, 16 * 1024 * 1024);
        assert_eq!(cfg.file_workers, 4);
        assert_eq!(cfg.chunk_workers, 8);
        assert_eq!(cfg.connect_timeout_secs, 15);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.region, "us-east-1");
        assert!(cfg.access_key_id.is_none());
        assert_eq!(cfg.scratch_dir(), PathBuf::from("/var/tmp/s3cc"));
        assert_eq!(cfg.scratch_capacity, Some(1 << 30));
        let backoff = cfg.backoff();
        assert_eq!(backoff.interval_ms, 250);
        assert_eq!(backoff.max_attempts, Some(10));
    }

    #[test]
    fn load_from_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "chunk_size = \"big\"").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }

    #[test]
    fn missing_config_gives_defaults_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s3cc").join("config.toml");
        let cfg = load_at(&path).unwrap();
        assert_eq!(cfg.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn existing_config_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = S3ccConfig {
            file_workers: 3,
            ..S3ccConfig::default()
        };
        fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();
        assert_eq!(load_at(&path).unwrap().file_workers, 3);
    }
}

//! Per-file comparison failures.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::etag::ChecksumError;

/// Category of a failed comparison, as reported in logs and the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    MetadataUnavailable,
    LocalMetadataUnavailable,
    SizeMismatch,
    ChecksumMismatch,
    ChecksumFailed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MetadataUnavailable => "metadata-unavailable",
            FailureKind::LocalMetadataUnavailable => "local-metadata-unavailable",
            FailureKind::SizeMismatch => "size-mismatch",
            FailureKind::ChecksumMismatch => "checksum-mismatch",
            FailureKind::ChecksumFailed => "checksum-failed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one file did not verify. Terminal for that file; never aborts the run.
#[derive(Debug, Error)]
pub enum ComparisonFailure {
    #[error("{path}: remote metadata unavailable: {cause:#}")]
    MetadataUnavailable { path: String, cause: anyhow::Error },

    #[error("{path}: cannot stat local file: {source}")]
    LocalMetadataUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: size mismatch (local {local}, remote {remote})")]
    SizeMismatch { path: String, local: u64, remote: u64 },

    #[error("{path}: checksum mismatch (local {local}, remote {remote})")]
    ChecksumMismatch {
        path: String,
        local: String,
        remote: String,
    },

    #[error("{path}: checksum computation failed: {source}")]
    ChecksumFailed {
        path: String,
        #[source]
        source: ChecksumError,
    },
}

impl ComparisonFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ComparisonFailure::MetadataUnavailable { .. } => FailureKind::MetadataUnavailable,
            ComparisonFailure::LocalMetadataUnavailable { .. } => {
                FailureKind::LocalMetadataUnavailable
            }
            ComparisonFailure::SizeMismatch { .. } => FailureKind::SizeMismatch,
            ComparisonFailure::ChecksumMismatch { .. } => FailureKind::ChecksumMismatch,
            ComparisonFailure::ChecksumFailed { .. } => FailureKind::ChecksumFailed,
        }
    }

    /// Relative path of the file that failed.
    pub fn path(&self) -> &str {
        match self {
            ComparisonFailure::MetadataUnavailable { path, .. }
            | ComparisonFailure::LocalMetadataUnavailable { path, .. }
            | ComparisonFailure::SizeMismatch { path, .. }
            | ComparisonFailure::ChecksumMismatch { path, .. }
            | ComparisonFailure::ChecksumFailed { path, .. } => path,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_kebab_case() {
        assert_eq!(FailureKind::SizeMismatch.to_string(), "size-mismatch");
        assert_eq!(
            serde_json::to_string(&FailureKind::LocalMetadataUnavailable).unwrap(),
            "\"local-metadata-unavailable\""
        );
    }

    #[test]
    fn message_carries_values() {
        let f = ComparisonFailure::SizeMismatch {
            path: "a/b".to_string(),
            local: 3,
            remote: 4,
        };
        assert_eq!(f.kind(), FailureKind::SizeMismatch);
        assert_eq!(f.path(), "a/b");
        assert_eq!(f.to_string(), "a/b: size mismatch (local 3, remote 4)");
    }

    #[test]
    fn metadata_cause_includes_context_chain() {
        let cause = anyhow::anyhow!("HTTP 404").context("HEAD http://x/b/k");
        let f = ComparisonFailure::MetadataUnavailable {
            path: "k".to_string(),
            cause,
        };
        assert_eq!(
            f.to_string(),
            "k: remote metadata unavailable: HEAD http://x/b/k: HTTP 404"
        );
    }
}

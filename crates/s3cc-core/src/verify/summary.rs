use bytesize::ByteSize;
use serde::Serialize;
use std::fmt;

use crate::compare::{ComparisonFailure, FailureKind};

/// A file that did not verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub kind: FailureKind,
}

/// Aggregate outcome of one run. Only built once every task has reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Files whose size and checksum matched.
    pub success: u64,
    /// Files that failed for any reason.
    pub errors: u64,
    /// Files compared (`success + errors`).
    pub files: u64,
    /// Total size of the files that matched.
    pub bytes: u64,
    pub failures: Vec<FailedFile>,
}

impl RunSummary {
    pub fn record(&mut self, result: &Result<u64, ComparisonFailure>) {
        match result {
            Ok(bytes) => {
                self.files += 1;
                self.success += 1;
                self.bytes += bytes;
            }
            Err(failure) => self.record_failure(failure.path(), failure.kind()),
        }
    }

    /// Counts a file that failed before it could be compared.
    pub fn record_failure(&mut self, path: &str, kind: FailureKind) {
        self.files += 1;
        self.errors += 1;
        self.failures.push(FailedFile {
            path: path.to_string(),
            kind,
        });
    }

    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    /// Process exit status: 0 when every file matched, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success={} errors={} files={} bytes={}",
            self.success,
            self.errors,
            self.files,
            ByteSize(self.bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_and_sums() {
        let mut s = RunSummary::default();
        s.record(&Ok(10));
        s.record(&Ok(5));
        s.record(&Err(ComparisonFailure::SizeMismatch {
            path: "x".to_string(),
            local: 1,
            remote: 2,
        }));
        assert_eq!(s.success, 2);
        assert_eq!(s.errors, 1);
        assert_eq!(s.files, 3);
        assert_eq!(s.bytes, 15);
        assert_eq!(
            s.failures,
            vec![FailedFile {
                path: "x".to_string(),
                kind: FailureKind::SizeMismatch
            }]
        );
        assert!(!s.is_success());
        assert_eq!(s.exit_code(), 1);
    }

    #[test]
    fn unlisted_entry_fails_the_run() {
        let mut s = RunSummary::default();
        s.record(&Ok(3));
        s.record_failure("locked", FailureKind::LocalMetadataUnavailable);
        assert_eq!(s.files, 2);
        assert_eq!(s.errors, 1);
        assert_eq!(s.failures[0].path, "locked");
        assert_eq!(s.exit_code(), 1);
    }

    #[test]
    fn empty_run_succeeds() {
        let s = RunSummary::default();
        assert!(s.is_success());
        assert_eq!(s.exit_code(), 0);
        assert_eq!(s.to_string(), "success=0 errors=0 files=0 bytes=0 B");
    }

    #[test]
    fn json_uses_kebab_case_kinds() {
        let mut s = RunSummary::default();
        s.record(&Err(ComparisonFailure::ChecksumMismatch {
            path: "a".to_string(),
            local: "l".to_string(),
            remote: "r".to_string(),
        }));
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(
            json,
            r#"{"success":0,"errors":1,"files":1,"bytes":0,"failures":[{"path":"a","kind":"checksum-mismatch"}]}"#
        );
    }
}

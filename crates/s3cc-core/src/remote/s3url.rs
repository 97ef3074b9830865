//! `s3://bucket/prefix` target URLs.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum S3UrlError {
    #[error("not an s3:// URL: {0}")]
    Scheme(String),
    #[error("missing bucket name in {0}")]
    MissingBucket(String),
}

/// Bucket plus key prefix that a local tree is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Url {
    pub bucket: String,
    /// Key prefix without a leading `/`; may be empty.
    pub prefix: String,
}

impl S3Url {
    pub fn from_bucket(bucket: &str, prefix: &str) -> Result<Self, S3UrlError> {
        if bucket.is_empty() {
            return Err(S3UrlError::MissingBucket(format!("s3://{prefix}")));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.trim_start_matches('/').to_string(),
        })
    }
}

impl FromStr for S3Url {
    type Err = S3UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("s3://")
            .ok_or_else(|| S3UrlError::Scheme(s.to_string()))?;
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(S3UrlError::MissingBucket(s.to_string()));
        }
        Self::from_bucket(bucket, prefix)
    }
}

impl fmt::Display for S3Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bucket_and_prefix() {
        let u: S3Url = "s3://photos/2024/raw".parse().unwrap();
        assert_eq!(u.bucket, "photos");
        assert_eq!(u.prefix, "2024/raw");
        assert_eq!(u.to_string(), "s3://photos/2024/raw");
    }

    #[test]
    fn parse_bucket_only() {
        let u: S3Url = "s3://photos".parse().unwrap();
        assert_eq!(u.prefix, "");
        let u: S3Url = "s3://photos/".parse().unwrap();
        assert_eq!(u.prefix, "");
        assert_eq!(u.to_string(), "s3://photos/");
    }

    #[test]
    fn extra_slashes_are_trimmed_from_prefix() {
        let u: S3Url = "s3://photos//a".parse().unwrap();
        assert_eq!(u.prefix, "a");
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            "https://photos/a".parse::<S3Url>(),
            Err(S3UrlError::Scheme("https://photos/a".to_string()))
        );
        assert!(matches!(
            "s3:///a".parse::<S3Url>(),
            Err(S3UrlError::MissingBucket(_))
        ));
    }

    #[test]
    fn from_bucket_requires_name() {
        assert!(S3Url::from_bucket("", "x").is_err());
        assert_eq!(S3Url::from_bucket("b", "/x/").unwrap().prefix, "x/");
    }
}

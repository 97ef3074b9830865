//! HEAD requests against an S3 endpoint.
//!
//! Uses path-style addressing (`{endpoint}/{bucket}/{key}`). Requests are
//! signed with SigV4 when credentials are available; without them they go
//! out unsigned, which works for public buckets and for S3-compatible
//! gateways that allow anonymous reads.

use anyhow::{anyhow, Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::str;
use std::time::Duration;
use url::Url;

use super::parse::parse_headers;
use super::sign::{sign_request, Credentials};
use super::{MetadataSource, RemoteMetadata};
use crate::config::S3ccConfig;

/// Everything but the RFC 3986 unreserved characters, as SigV4 requires.
const URI_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Metadata source backed by libcurl HEAD requests.
#[derive(Debug, Clone)]
pub struct HttpHeadSource {
    endpoint: Url,
    bucket: String,
    region: String,
    credentials: Option<Credentials>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl HttpHeadSource {
    /// Source for `bucket` on `endpoint` (e.g. `https://s3.amazonaws.com`).
    pub fn new(endpoint: &str, bucket: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid endpoint URL {endpoint:?}"))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("endpoint {} cannot be used as a base URL", endpoint);
        }
        Ok(Self {
            endpoint,
            bucket: bucket.to_string(),
            region: "us-east-1".to_string(),
            credentials: None,
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
        })
    }

    /// Source using the endpoint, region, timeouts and credentials from `cfg`
    /// (credentials fall back to the `AWS_*` environment variables).
    pub fn from_config(cfg: &S3ccConfig, bucket: &str) -> Result<Self> {
        let credentials = Credentials::resolve(cfg);
        if credentials.is_none() {
            tracing::debug!("no AWS credentials found, sending unsigned requests");
        }
        Ok(Self::new(&cfg.endpoint, bucket)?
            .with_timeouts(
                Duration::from_secs(cfg.connect_timeout_secs),
                Duration::from_secs(cfg.timeout_secs),
            )
            .with_signing(&cfg.region, credentials))
    }

    /// Sign requests for `region` with `credentials`; `None` sends them unsigned.
    pub fn with_signing(mut self, region: &str, credentials: Option<Credentials>) -> Self {
        self.region = region.to_string();
        self.credentials = credentials;
        self
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.timeout = timeout;
        self
    }

    /// Full URL of the object stored under `key`, with each path segment escaped.
    pub fn object_url(&self, key: &str) -> Result<String> {
        Ok(self.object_location(key)?.to_string())
    }

    fn object_location(&self, key: &str) -> Result<Url> {
        if self.endpoint.cannot_be_a_base() {
            return Err(anyhow!("endpoint {} cannot be used as a base URL", self.endpoint));
        }
        let mut path = self.endpoint.path().trim_end_matches('/').to_string();
        for segment in std::iter::once(self.bucket.as_str()).chain(key.split('/')) {
            path.push('/');
            path.extend(utf8_percent_encode(segment, URI_SEGMENT));
        }
        let mut url = self.endpoint.clone();
        url.set_path(&path);
        Ok(url)
    }

    /// Signature headers for a HEAD of `url`, or none when unsigned.
    fn auth_headers(&self, url: &Url) -> Result<Vec<(String, String)>> {
        let Some(creds) = &self.credentials else {
            return Ok(Vec::new());
        };
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("URL {url} has no host"))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        sign_request(
            "HEAD",
            &host,
            url.path(),
            &[],
            creds,
            &self.region,
            chrono::Utc::now(),
        )
    }
}

impl MetadataSource for HttpHeadSource {
    /// Performs a HEAD request and returns the object's size and ETag.
    ///
    /// Runs in the current thread; follows redirects.
    fn fetch(&self, key: &str) -> Result<RemoteMetadata> {
        let location = self.object_location(key)?;
        let url = location.to_string();
        let mut headers: Vec<String> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&url).context("invalid URL")?;
        easy.nobody(true)?; // HEAD request
        easy.follow_location(true)?;
        let auth = self.auth_headers(&location)?;
        if !auth.is_empty() {
            let mut list = curl::easy::List::new();
            for (name, value) in &auth {
                list.append(&format!("{name}: {value}"))?;
            }
            easy.http_headers(list)?;
        }
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer
                .perform()
                .with_context(|| format!("HEAD {url} failed"))?;
        }

        let code = easy.response_code().context("no response code")?;
        if !(200..300).contains(&code) {
            anyhow::bail!("HEAD {} returned HTTP {}", url, code);
        }

        parse_headers(&headers).with_context(|| format!("HEAD {url}"))
    }
}

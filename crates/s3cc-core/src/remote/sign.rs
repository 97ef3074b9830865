//! AWS Signature Version 4 for object requests.
//!
//! Only what a bodiless request needs: no query string, empty payload hash.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::config::S3ccConfig;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// SHA-256 of an empty body.
const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Access key pair (plus optional session token) used to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: &str) -> Self {
        self.session_token = Some(token.to_string());
        self
    }

    /// Keys from config.toml if both are set, else from `AWS_ACCESS_KEY_ID`,
    /// `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`. `None` means requests
    /// go out unsigned.
    pub fn resolve(cfg: &S3ccConfig) -> Option<Self> {
        Self::resolve_with(cfg, |name| std::env::var(name).ok())
    }

    fn resolve_with(cfg: &S3ccConfig, env: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        if let (Some(id), Some(secret)) = (
            non_empty(cfg.access_key_id.clone()),
            non_empty(cfg.secret_access_key.clone()),
        ) {
            return Some(Self {
                access_key_id: id,
                secret_access_key: secret,
                session_token: non_empty(cfg.session_token.clone()),
            });
        }
        let id = non_empty(env("AWS_ACCESS_KEY_ID"))?;
        let secret = non_empty(env("AWS_SECRET_ACCESS_KEY"))?;
        Some(Self {
            access_key_id: id,
            secret_access_key: secret,
            session_token: non_empty(env("AWS_SESSION_TOKEN")),
        })
    }
}

fn hmac(key: &[u8], data: &str) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|_| anyhow!("invalid HMAC key length"))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Key derived from the secret for one day, region and service.
fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date)?;
    let k_region = hmac(&k_date, region)?;
    let k_service = hmac(&k_region, service)?;
    hmac(&k_service, "aws4_request")
}

/// Headers to add to a request for `path` on `host` so that S3 accepts it.
///
/// `path` must already be URI-encoded exactly as sent. `extra` are headers
/// the caller sends anyway and wants covered by the signature.
pub(crate) fn sign_request(
    method: &str,
    host: &str,
    path: &str,
    extra: &[(&str, &str)],
    creds: &Credentials,
    region: &str,
    now: DateTime<Utc>,
) -> Result<Vec<(String, String)>> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut added = vec![
        ("x-amz-content-sha256".to_string(), EMPTY_PAYLOAD_SHA256.to_string()),
        ("x-amz-date".to_string(), amz_date.clone()),
    ];
    if let Some(token) = &creds.session_token {
        added.push(("x-amz-security-token".to_string(), token.clone()));
    }

    let mut signed: Vec<(String, String)> = vec![("host".to_string(), host.to_string())];
    signed.extend(added.iter().cloned());
    signed.extend(
        extra
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string())),
    );
    signed.sort();

    let canonical_headers: String = signed.iter().map(|(k, v)| format!("{k}:{v}\n")).collect();
    let signed_headers = signed
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let canonical_request = format!(
        "{method}\n{path}\n\n{canonical_headers}\n{signed_headers}\n{EMPTY_PAYLOAD_SHA256}"
    );

    let scope = format!("{date}/{region}/{SERVICE}/aws4_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );
    let key = signing_key(&creds.secret_access_key, &date, region, SERVICE)?;
    let signature = hex::encode(hmac(&key, &string_to_sign)?);

    added.push((
        "authorization".to_string(),
        format!(
            "{ALGORITHM} Credential={}/{scope},SignedHeaders={signed_headers},Signature={signature}",
            creds.access_key_id
        ),
    ));
    Ok(added)
}

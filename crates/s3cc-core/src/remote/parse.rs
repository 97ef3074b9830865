//! Parse HTTP response header lines into object metadata.

use anyhow::{anyhow, Result};

use super::RemoteMetadata;

/// Parse collected header lines of a HEAD response.
///
/// Only the last response counts when redirects were followed: every status
/// line resets what was collected so far.
pub(crate) fn parse_headers(lines: &[String]) -> Result<RemoteMetadata> {
    let mut content_length = None;
    let mut etag = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            content_length = None;
            etag = None;
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse::<u64>().ok();
            }
            if name.eq_ignore_ascii_case("etag") {
                etag = Some(value.to_string());
            }
        }
    }

    Ok(RemoteMetadata {
        size: content_length.ok_or_else(|| anyhow!("response has no Content-Length"))?,
        etag: etag.ok_or_else(|| anyhow!("response has no ETag"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_headers_size_and_etag() {
        let lines = [
            "HTTP/1.1 200 OK".to_string(),
            "Content-Length: 12345".to_string(),
            "ETag: \"abc-123\"".to_string(),
        ];
        let m = parse_headers(&lines).unwrap();
        assert_eq!(m.size, 12345);
        assert_eq!(m.etag, "\"abc-123\"");
        assert_eq!(m.etag_unquoted(), "abc-123");
    }

    #[test]
    fn parse_headers_case_insensitive() {
        let lines = [
            "content-length: 0".to_string(),
            "etag: d41d8cd98f00b204e9800998ecf8427e".to_string(),
        ];
        let m = parse_headers(&lines).unwrap();
        assert_eq!(m.size, 0);
        assert_eq!(m.etag, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn parse_headers_last_response_wins() {
        let lines = [
            "HTTP/1.1 301 Moved Permanently".to_string(),
            "Content-Length: 0".to_string(),
            "ETag: \"redirect\"".to_string(),
            "".to_string(),
            "HTTP/1.1 200 OK".to_string(),
            "Content-Length: 42".to_string(),
            "ETag: \"real\"".to_string(),
        ];
        let m = parse_headers(&lines).unwrap();
        assert_eq!(m.size, 42);
        assert_eq!(m.etag_unquoted(), "real");
    }

    #[test]
    fn parse_headers_missing_fields() {
        let no_etag = ["Content-Length: 5".to_string()];
        assert!(parse_headers(&no_etag)
            .unwrap_err()
            .to_string()
            .contains("ETag"));
        let no_length = ["ETag: \"x\"".to_string()];
        assert!(parse_headers(&no_length)
            .unwrap_err()
            .to_string()
            .contains("Content-Length"));
    }
}

//! Minimal HTTP/1.1 server answering HEAD requests for integration tests.
//!
//! Serves a fixed map of request paths (`/bucket/key`) to object metadata.
//! Known paths get 200 with Content-Length and a quoted ETag; anything else
//! gets 404. Every request is recorded, with its Authorization header, so
//! tests can check what was asked.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use s3cc_core::etag::{md5_bytes, multipart_etag};

#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub size: u64,
    pub etag: String,
}

impl ObjectMeta {
    /// Metadata S3 would report for `data` uploaded with `chunk_size` parts.
    pub fn for_upload(data: &[u8], chunk_size: usize) -> Self {
        let etag = if data.len() <= chunk_size {
            hex::encode(md5_bytes(data))
        } else {
            let digests: Vec<_> = data.chunks(chunk_size).map(md5_bytes).collect();
            multipart_etag(&digests)
        };
        Self {
            size: data.len() as u64,
            etag,
        }
    }
}

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct Request {
    pub path: String,
    pub authorization: Option<String>,
}

pub struct HeadServer {
    pub endpoint: String,
    pub requests: Arc<Mutex<Vec<Request>>>,
}

/// Starts a server in a background thread. Returns its endpoint
/// (e.g. "http://127.0.0.1:12345") and the request log.
pub fn start(objects: HashMap<String, ObjectMeta>) -> HeadServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let objects = Arc::new(objects);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let objects = Arc::clone(&objects);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &objects, &log));
        }
    });
    HeadServer {
        endpoint: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    objects: &HashMap<String, ObjectMeta>,
    log: &Mutex<Vec<Request>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut lines = request.lines();
    let mut parts = lines.next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");
    let authorization = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.trim().to_string());
    log.lock().unwrap().push(Request {
        path: path.to_string(),
        authorization,
    });

    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
        return;
    }
    let response = match objects.get(path) {
        Some(meta) => format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nETag: \"{}\"\r\nConnection: close\r\n\r\n",
            meta.size, meta.etag
        ),
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string(),
    };
    let _ = stream.write_all(response.as_bytes());
}

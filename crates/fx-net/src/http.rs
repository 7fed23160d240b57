//! Plain-HTTP fetch handler.
//!
//! One-shot HTTP/1.0 over a TCP stream: connect, write the request,
//! read to EOF, parse. Good enough for same-network hypermedia
//! backends; TLS termination belongs to a proxy in front of them.

use std::fmt::Write as _;
use std::net::Shutdown;

use async_trait::async_trait;
use smol::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

use crate::{FetchError, FetchHandler, FetchRequest, FetchResponse};

/// [`FetchHandler`] that performs real HTTP requests.
#[derive(Debug, Default)]
pub struct HttpFetch;

impl HttpFetch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl FetchHandler for HttpFetch {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let url =
            Url::parse(&request.url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl("missing host".to_string()))?;
        let port = url.port_or_known_default().unwrap_or(80);

        tracing::debug!("{} {} -> {}:{}", request.method, request.url, host, port);
        let mut stream = smol::net::TcpStream::connect((host, port))
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let wire = encode_request(&request, &url, host);
        stream
            .write_all(&wire)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        stream
            .shutdown(Shutdown::Write)
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let response = decode_response(&raw)?;
        tracing::debug!("{} {} -> {}", request.method, request.url, response.status);
        Ok(response)
    }
}

fn encode_request(request: &FetchRequest, url: &Url, host: &str) -> Vec<u8> {
    let mut target = url.path().to_string();
    if let Some(q) = url.query() {
        target.push('?');
        target.push_str(q);
    }

    let mut head = String::new();
    let _ = write!(head, "{} {} HTTP/1.0\r\n", request.method.as_str(), target);
    let _ = write!(head, "Host: {}\r\n", host);
    for (name, value) in &request.headers {
        let _ = write!(head, "{}: {}\r\n", name, value);
    }
    if let Some(body) = &request.body {
        let _ = write!(head, "Content-Length: {}\r\n", body.len());
    }
    head.push_str("Connection: close\r\n\r\n");

    let mut wire = head.into_bytes();
    if let Some(body) = &request.body {
        wire.extend_from_slice(body.as_bytes());
    }
    wire
}

fn decode_response(raw: &[u8]) -> Result<FetchResponse, FetchError> {
    let head_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| FetchError::Network("malformed response".to_string()))?;
    let head = String::from_utf8_lossy(&raw[..head_end]);
    let body = raw[head_end + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines
        .next()
        .ok_or_else(|| FetchError::Network("empty response".to_string()))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| FetchError::Network(format!("bad status line: {status_line}")))?;

    let headers = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    Ok(FetchResponse {
        status,
        headers,
        body,
    })
}

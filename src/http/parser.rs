use crate::http::request::{Method, Request};
use percent_encoding::percent_decode_str;

/// Header/body separator.
pub const HEADERS_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Reasons a request cannot be framed or parsed.
///
/// Every variant is a malformed request: the connection is closed without
/// sending a response.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("request head is not valid UTF-8")]
    InvalidEncoding,
    #[error("invalid request line: {0:?}")]
    InvalidRequestLine(String),
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),
    #[error("connection closed before the request was complete")]
    UnexpectedEof,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Request line and headers, before the body has been collected.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    /// Declared body length, 0 when the header is absent
    pub content_length: usize,
}

impl RequestHead {
    pub fn into_request(self, body: Vec<u8>) -> Request {
        Request {
            method: self.method,
            path: self.path,
            version: self.version,
            headers: self.headers,
            body,
        }
    }
}

/// Parses the bytes before the header terminator.
pub fn parse_head(header_bytes: &[u8]) -> Result<RequestHead, ParseError> {
    let headers_str = std::str::from_utf8(header_bytes)
        .map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();

    let (Some(method), Some(raw_path), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidRequestLine(request_line.to_string()));
    };

    let path = percent_decode_str(raw_path).decode_utf8_lossy().into_owned();

    // Headers
    let mut headers = Vec::new();
    let mut content_length = 0;

    for line in lines {
        if line.is_empty() {
            continue;
        }

        // Prefix match, as received; a repeated header overrides the earlier one.
        if line.starts_with("Content-Length") {
            content_length = parse_content_length(line)?;
        }

        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    Ok(RequestHead {
        method: Method::from_token(method),
        path,
        version: version.to_string(),
        headers,
        content_length,
    })
}

fn parse_content_length(line: &str) -> Result<usize, ParseError> {
    line.split_once(':')
        .and_then(|(_, value)| value.trim().parse().ok())
        .ok_or_else(|| ParseError::InvalidContentLength(line.to_string()))
}

/// Position of the header terminator, searching from `from`.
pub fn find_headers_end(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(HEADERS_TERMINATOR.len())
        .position(|w| w == HEADERS_TERMINATOR)
        .map(|pos| pos + from)
}

//! Assembles one request from a byte stream.
//!
//! Bytes are read in fixed-size chunks until the header terminator shows up,
//! then the body is completed up to the declared Content-Length. Bytes past
//! the declared length that arrived with the headers are kept in the body.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::parser::{find_headers_end, parse_head, ParseError, HEADERS_TERMINATOR};
use crate::http::request::Request;

/// Size of each read while looking for the end of the headers.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Reads a complete request (head plus declared body) from `stream`.
///
/// Neither the head nor the body is size-limited.
pub async fn read_request<S>(stream: &mut S) -> Result<Request, ParseError>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut searched = 0;

    let headers_end = loop {
        if let Some(end) = find_headers_end(&buffer, searched) {
            break end;
        }
        // The terminator may straddle two chunks.
        searched = buffer.len().saturating_sub(HEADERS_TERMINATOR.len() - 1);

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ParseError::UnexpectedEof);
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head_bytes = buffer.split_to(headers_end);
    buffer.advance(HEADERS_TERMINATOR.len());

    let head = parse_head(&head_bytes)?;
    let mut body = buffer.to_vec();

    // Body split across segments: keep reading the missing bytes. The body
    // only grows by what actually arrives, never by the declared length.
    let mut follow_up_reads = 0;
    while body.len() < head.content_length {
        let missing = (head.content_length - body.len()).min(READ_CHUNK_SIZE);

        let n = stream.read(&mut chunk[..missing]).await?;
        if n == 0 {
            return Err(ParseError::UnexpectedEof);
        }
        body.extend_from_slice(&chunk[..n]);
        follow_up_reads += 1;
    }

    if follow_up_reads > 1 {
        tracing::debug!(reads = follow_up_reads, "Request body arrived fragmented");
    }

    Ok(head.into_request(body))
}

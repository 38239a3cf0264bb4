//! Framework process wire codec
//!
//! Each message is a JSON document preceded by a Content-Length header:
//! ```text
//! Content-Length: <byte-length>\r\n
//! \r\n
//! <JSON body>
//! ```

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::Error;

/// Upper bound on a single frame; lifecycle payloads are small
const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

fn eof_as_crash(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::FrameworkCrashed
    } else {
        Error::Io(e)
    }
}

/// Read one frame body from the stream
///
/// Returns `Ok(None)` on a clean EOF between frames.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<String>, Error> {
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await.map_err(eof_as_crash)?;

        if bytes_read == 0 {
            return if saw_header {
                Err(Error::FrameworkCrashed)
            } else {
                Ok(None)
            };
        }

        if line == "\r\n" || line == "\n" {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;

        if let Some(value) = line.trim().strip_prefix("Content-Length:") {
            content_length = Some(value.trim().parse().map_err(|_| {
                Error::FrameworkProtocol(format!("Invalid Content-Length: {}", value.trim()))
            })?);
        }
    }

    let len = content_length
        .ok_or_else(|| Error::FrameworkProtocol("Missing Content-Length header".to_string()))?;

    if len > MAX_FRAME_BYTES {
        return Err(Error::FrameworkProtocol(format!(
            "Content-Length too large: {} bytes",
            len
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(eof_as_crash)?;

    String::from_utf8(body)
        .map(Some)
        .map_err(|e| Error::FrameworkProtocol(format!("Invalid UTF-8: {}", e)))
}

/// Read one frame and parse it as JSON
pub async fn read_value<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<Value>, Error> {
    match read_frame(reader).await? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| Error::FrameworkProtocol(format!("Invalid JSON: {}", e))),
        None => Ok(None),
    }
}

/// Write a pre-serialized frame body
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<(), Error> {
    let header = format!("Content-Length: {}\r\n\r\n", json.len());

    writer.write_all(header.as_bytes()).await?;
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}

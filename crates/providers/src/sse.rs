//! Shared SSE streaming infrastructure for the provider adapters.
//!
//! Both adapters receive a `reqwest::Response`, buffer body bytes, split on
//! blank lines, extract `data:` payloads, and feed each payload to a
//! provider-specific parser that returns the text chunks it carried.
//!
//! - [`drain_data_lines`] pulls complete event payloads from an SSE buffer
//! - [`sse_text_stream`] builds a [`ChunkStream`] from a response + parser
//!
//! The buffer holds raw bytes and is only decoded one complete event at a
//! time: a network read may end in the middle of a multi-byte character.

use crate::util::from_reqwest;
use sl_domain::error::Result;
use sl_domain::stream::ChunkStream;

/// Extract complete event payloads from an SSE buffer.
///
/// SSE events are delimited by `\n\n`. Each event block may contain
/// `event:`, `data:`, `id:`, or `retry:` lines; only `data:` lines are kept,
/// and the `data:` lines of one event are joined with `\n`.
///
/// The buffer is drained in-place: consumed bytes are removed and any
/// trailing partial event remains for the next call.
pub(crate) fn drain_data_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut payloads = Vec::new();

    while let Some(pos) = find_delimiter(buffer) {
        let block: Vec<u8> = buffer.drain(..pos + 2).take(pos).collect();
        let block = String::from_utf8_lossy(&block);

        let data: Vec<&str> = block
            .lines()
            .filter_map(|line| line.trim().strip_prefix("data:"))
            .map(str::trim)
            .collect();
        let payload = data.join("\n");
        if !payload.trim().is_empty() {
            payloads.push(payload);
        }
    }

    payloads
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Append body bytes to the buffer with CRLF line endings folded to LF.
///
/// A trailing `\r` is kept until the next read shows whether a `\n` follows.
fn push_normalized(buffer: &mut Vec<u8>, bytes: &[u8]) {
    buffer.extend_from_slice(bytes);
    if !buffer.contains(&b'\r') {
        return;
    }
    let mut folded = Vec::with_capacity(buffer.len());
    for (i, &b) in buffer.iter().enumerate() {
        if b == b'\r' && buffer.get(i + 1) == Some(&b'\n') {
            continue;
        }
        folded.push(b);
    }
    *buffer = folded;
}

/// Build a [`ChunkStream`] from an SSE `reqwest::Response` and a
/// provider-specific parser.
///
/// The parser receives each event payload and returns zero or more text
/// chunks. The stream ends after the first `Err`, whether it came from the
/// parser or from reading the body. The trailing partial event is flushed
/// when the body closes.
pub(crate) fn sse_text_stream<F>(response: reqwest::Response, mut parse_data: F) -> ChunkStream
where
    F: FnMut(&str) -> Vec<Result<String>> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut response = response;
        let mut buffer: Vec<u8> = Vec::new();

        'body: loop {
            let (payloads, at_end) = match response.chunk().await {
                Ok(Some(bytes)) => {
                    push_normalized(&mut buffer, &bytes);
                    (drain_data_lines(&mut buffer), false)
                }
                Ok(None) => {
                    if buffer.iter().all(u8::is_ascii_whitespace) {
                        break;
                    }
                    buffer.extend_from_slice(b"\n\n");
                    (drain_data_lines(&mut buffer), true)
                }
                Err(e) => {
                    yield Err(from_reqwest(e));
                    break;
                }
            };

            for data in payloads {
                for item in parse_data(&data) {
                    let failed = item.is_err();
                    yield item;
                    if failed {
                        break 'body;
                    }
                }
            }

            if at_end {
                break;
            }
        }
    };

    Box::pin(stream)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

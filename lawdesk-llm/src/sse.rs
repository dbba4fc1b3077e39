use bytes::BytesMut;
use futures::{
    future,
    stream::{self, StreamExt},
};
use lawdesk_core::{ChunkStream, CompletionChunk, LawdeskError};

use crate::openai_compatible::ChatCompletionChunk;

/// One decoded `data:` line of an event stream.
#[derive(Debug)]
pub enum SseLine {
    Done,
    Chunk(Result<CompletionChunk, LawdeskError>),
}

/// Returns the payload of a `data:` line; comments, event names and blank
/// keep-alive lines yield `None`.
pub fn parse_sse_line(line: &str) -> Option<&str> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() {
        None
    } else {
        Some(data)
    }
}

pub fn decode_sse_data(data: &str) -> SseLine {
    if data == "[DONE]" {
        return SseLine::Done;
    }
    SseLine::Chunk(
        serde_json::from_str::<ChatCompletionChunk>(data)
            .map(CompletionChunk::from)
            .map_err(|err| LawdeskError::ParseFailed {
                output: data.to_string(),
                reason: err.to_string(),
            }),
    )
}

fn drain_lines(
    buffer: &mut BytesMut,
    events: &mut Vec<Result<CompletionChunk, LawdeskError>>,
) -> bool {
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let line = buffer.split_to(pos + 1);
        let line_str = String::from_utf8_lossy(&line);
        let Some(data) = parse_sse_line(&line_str) else {
            continue;
        };
        match decode_sse_data(data) {
            SseLine::Done => return true,
            SseLine::Chunk(chunk) => events.push(chunk),
        }
    }
    false
}

/// Adapts an event-stream response body into completion chunks.
///
/// Ends at `data: [DONE]`, at end of body, or after the first transport error.
pub(crate) fn chunk_stream(response: reqwest::Response) -> ChunkStream {
    let mut buffer = BytesMut::new();
    let mut terminated = false;

    response
        .bytes_stream()
        .map(Some)
        .chain(stream::once(future::ready(None)))
        .flat_map(move |item| {
            if terminated {
                return stream::iter(Vec::new());
            }
            let mut events = Vec::new();
            match item {
                Some(Ok(bytes)) => {
                    buffer.extend_from_slice(&bytes);
                    terminated = drain_lines(&mut buffer, &mut events);
                }
                Some(Err(err)) => {
                    terminated = true;
                    events.push(Err(LawdeskError::Provider(err.to_string())));
                }
                None => {
                    // Trailing line without a newline.
                    if !buffer.is_empty() {
                        buffer.extend_from_slice(b"\n");
                        drain_lines(&mut buffer, &mut events);
                    }
                    terminated = true;
                }
            }
            stream::iter(events)
        })
        .boxed()
}

//! NDJSON stream decoding.
//!
//! The platform serves bulk data (game exports, tournament feeds) as
//! newline-delimited JSON over a chunked body. Chunk boundaries fall
//! anywhere, so a partial trailing line is carried between chunks, and the
//! server emits blank keep-alive lines on slow streams which must be
//! skipped.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::api::ApiError;

/// Collect up to `max` records from an NDJSON byte stream.
///
/// Stops early once `max` records are decoded and drops the rest of the
/// stream (the connection is closed on drop, which the server treats as a
/// normal client-side cutoff).
pub async fn collect<T, S>(mut stream: S, max: usize) -> Result<Vec<T>, ApiError>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    let mut out = Vec::new();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buf.extend_from_slice(&chunk);

        // Split complete lines off the front, keep the partial tail
        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buf.drain(..=pos).collect();
            let line = &line[..line.len() - 1]; // strip '\n'
            if push_line(line, &mut out)? && out.len() >= max {
                return Ok(out);
            }
        }
    }

    // Final line may lack a trailing newline
    if !buf.is_empty() {
        push_line(&buf, &mut out)?;
        out.truncate(max);
    }

    Ok(out)
}

/// Parse one line into `out`; returns whether a record was added.
fn push_line<T: DeserializeOwned>(line: &[u8], out: &mut Vec<T>) -> Result<bool, ApiError> {
    let trimmed = trim_ascii(line);
    if trimmed.is_empty() {
        return Ok(false); // keep-alive
    }
    out.push(serde_json::from_slice(trimmed)?);
    Ok(true)
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Rec {
        id: u32,
    }

    fn byte_stream(chunks: Vec<&'static str>) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Unpin {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))))
    }

    #[tokio::test]
    async fn test_collect_simple_lines() {
        let s = byte_stream(vec!["{\"id\":1}\n{\"id\":2}\n"]);
        let recs: Vec<Rec> = collect(s, 10).await.unwrap();
        assert_eq!(recs, vec![Rec { id: 1 }, Rec { id: 2 }]);
    }

    #[tokio::test]
    async fn test_collect_line_split_across_chunks() {
        let s = byte_stream(vec!["{\"id\"", ":1}\n{\"i", "d\":2}\n"]);
        let recs: Vec<Rec> = collect(s, 10).await.unwrap();
        assert_eq!(recs, vec![Rec { id: 1 }, Rec { id: 2 }]);
    }

    #[tokio::test]
    async fn test_collect_skips_keepalive_blank_lines() {
        let s = byte_stream(vec!["{\"id\":1}\n\n\n{\"id\":2}\n"]);
        let recs: Vec<Rec> = collect(s, 10).await.unwrap();
        assert_eq!(recs.len(), 2);
    }

    #[tokio::test]
    async fn test_collect_stops_at_max() {
        let s = byte_stream(vec!["{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n"]);
        let recs: Vec<Rec> = collect(s, 2).await.unwrap();
        assert_eq!(recs.len(), 2);
    }

    #[tokio::test]
    async fn test_collect_final_line_without_newline() {
        let s = byte_stream(vec!["{\"id\":1}\n{\"id\":2}"]);
        let recs: Vec<Rec> = collect(s, 10).await.unwrap();
        assert_eq!(recs.len(), 2);
    }

    #[tokio::test]
    async fn test_collect_bad_json_is_an_error() {
        let s = byte_stream(vec!["{\"id\":1}\nnot json\n"]);
        let result: Result<Vec<Rec>, _> = collect(s, 10).await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}

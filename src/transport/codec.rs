//! `Content-Length` framing codec for adapter streams.
//!
//! Each message on the wire is UTF-8 JSON preceded by a plain-text header
//! block terminated by two CRLF sequences. The only mandatory header is
//! `Content-Length: <N>`, where `N` is the exact byte length of the body.
//! Unknown headers are tolerated and ignored; header names are matched
//! case-insensitively.
//!
//! Use [`DapCodec`] as the codec parameter for
//! [`tokio_util::codec::FramedRead`] (inbound) and
//! [`tokio_util::codec::FramedWrite`] (outbound).

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::messages::ProtocolMessage;
use crate::{DapError, Result};

/// Maximum accepted message body: 16 MiB.
///
/// A header announcing a larger body causes [`DapCodec::decode`] to return
/// [`DapError::Protocol`] rather than buffering unbounded data from a
/// misbehaving adapter.
pub const MAX_BODY_BYTES: usize = 16 * 1_048_576;

/// Header-block terminator: two CRLF sequences.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// `Content-Length` framing codec for bidirectional adapter streams.
///
/// # Decoder
///
/// Yields each frame's raw JSON body as a `String`. JSON parsing is the
/// reader's concern, so a malformed body can never corrupt framing state.
/// Frames with an empty body are consumed and skipped. All decode errors
/// are recoverable: the offending bytes are discarded before the error is
/// returned, so decoding resumes at the next frame —
///
/// - a header block without a parseable `Content-Length`,
/// - an announced body length over [`MAX_BODY_BYTES`],
/// - a body that is not valid UTF-8.
///
/// Inbound chunks may be fragmented or batched arbitrarily; the decoder
/// buffers until a complete header and body are available and drains every
/// complete frame in the buffer before asking for more data.
///
/// # Encoder
///
/// Serializes a [`ProtocolMessage`] to JSON and writes
/// `Content-Length: <len>\r\n\r\n<json>` as one buffer extension, with the
/// length counted in UTF-8 bytes.
#[derive(Debug, Default)]
pub struct DapCodec {
    /// Body length parsed from the current header block. `None` while
    /// still waiting for a complete header.
    content_length: Option<usize>,
}

impl DapCodec {
    /// Create a codec awaiting its first header.
    #[must_use]
    pub fn new() -> Self {
        Self {
            content_length: None,
        }
    }
}

impl Decoder for DapCodec {
    type Item = String;
    type Error = DapError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        loop {
            match self.content_length {
                None => {
                    let Some(end) = find_terminator(src) else {
                        return Ok(None);
                    };

                    // Consume the header block and its terminator up front
                    // so an unparseable header still makes progress.
                    let header = src.split_to(end);
                    let _ = src.split_to(HEADER_TERMINATOR.len());

                    let length = parse_content_length(&header)?;
                    if length > MAX_BODY_BYTES {
                        return Err(DapError::Protocol(format!(
                            "announced body of {length} bytes exceeds maximum {MAX_BODY_BYTES}"
                        )));
                    }
                    self.content_length = Some(length);
                }
                Some(length) => {
                    if src.len() < length {
                        src.reserve(length - src.len());
                        return Ok(None);
                    }

                    let body = src.split_to(length);
                    self.content_length = None;

                    if length == 0 {
                        continue;
                    }

                    let text = String::from_utf8(body.to_vec()).map_err(|err| {
                        DapError::Protocol(format!("message body is not valid UTF-8: {err}"))
                    })?;
                    return Ok(Some(text));
                }
            }
        }
    }
}

impl Encoder<ProtocolMessage> for DapCodec {
    type Error = DapError;

    fn encode(&mut self, item: ProtocolMessage, dst: &mut BytesMut) -> Result<()> {
        let body = serde_json::to_vec(&item)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        dst.reserve(header.len() + body.len());
        dst.extend_from_slice(header.as_bytes());
        dst.extend_from_slice(&body);
        Ok(())
    }
}

/// Byte offset of the first header terminator in `src`, if present.
fn find_terminator(src: &BytesMut) -> Option<usize> {
    src.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Extract the `Content-Length` value from a raw header block.
///
/// Lines are split on CRLF, each line on the first colon with surrounding
/// whitespace trimmed. Unrecognized header lines are ignored.
fn parse_content_length(header: &[u8]) -> Result<usize> {
    let text = std::str::from_utf8(header)
        .map_err(|err| DapError::Protocol(format!("header block is not valid UTF-8: {err}")))?;

    for line in text.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            return value.trim().parse::<usize>().map_err(|err| {
                DapError::Protocol(format!(
                    "invalid Content-Length value '{}': {err}",
                    value.trim()
                ))
            });
        }
    }

    Err(DapError::Protocol(format!(
        "header block without Content-Length: {text:?}"
    )))
}

//! Newline-delimited line sources over async byte streams.

use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};

use crate::error::LineError;

/// Default upper bound for a single line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Splits a byte stream into lines.
///
/// Terminators (`\n` or `\r\n`) are stripped. A final line without a
/// terminator is still yielded at end of stream. Bytes that are not valid
/// UTF-8 are replaced with U+FFFD so the line still reaches the parser.
/// An I/O failure or a line longer than `max_line_length` yields an error,
/// after which the caller is expected to stop reading.
pub fn line_source<R>(reader: R, max_line_length: usize) -> impl Stream<Item = Result<String, LineError>>
where
    R: AsyncRead,
{
    let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), max_line_length);
    FramedRead::new(reader, codec).map(move |item| {
        item.map(|chunk| decode_line(&chunk))
            .map_err(|e| LineError::from_codec(e, max_line_length))
    })
}

fn decode_line(chunk: &[u8]) -> String {
    let line = chunk.strip_suffix(b"\r").unwrap_or(chunk);
    String::from_utf8_lossy(line).into_owned()
}

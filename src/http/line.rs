//! Line reader for the request head.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::http::error::ParseError;

/// Read one line, including its `\n` (or `\r\n`) terminator.
///
/// A final line without a terminator is returned as-is. Lines longer than
/// `max_len` bytes, terminator included, are rejected. Reading zero bytes
/// means the peer is done sending and yields [`ParseError::Eof`]; a clean
/// close between requests and a truncated head are not told apart.
pub async fn read_line<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    // One byte of lookahead tells an overlong line from one that fills the limit.
    let limit = u64::try_from(max_len.saturating_add(1)).unwrap_or(u64::MAX);
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut line).await?;

    if read == 0 {
        return Err(ParseError::Eof);
    }
    if read > max_len {
        return Err(ParseError::LineTooLong { limit: max_len });
    }
    Ok(line)
}

/// Strip a trailing `\r\n` or `\n`.
pub fn trim_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

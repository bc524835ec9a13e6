//! Chunked transfer-coding parser (§4.2): chunk-size line, chunk data, the
//! chunk-size line's trailing CRLF, and — on the zero-size chunk — a
//! trailer-part reusing the exact field-line grammar headers use.
//!
//! The zero-size chunk is the one irregular case: RFC 7230 describes it as
//! `chunk-size CRLF trailer-part CRLF`, a single unit with no framing of its
//! own between the chunk-size line and the trailers. This parser treats that
//! whole unit as one double-CRLF-delimited block, scanned fresh from the
//! unconsumed start each call, exactly as an ordinary header block is.

use crate::error::ParseError;
use crate::header::ParserConfig;
use crate::sink::{BodySink, HeaderSink};

/// The chunk parser needs both roles of the collaborator at once: chunk data
/// goes to the body sink, trailer fields go to the header sink. Most
/// collaborators implement both on the same type.
pub trait Collaborator: BodySink + HeaderSink {}
impl<T: BodySink + HeaderSink> Collaborator for T {}

/// Outcome of a [`ChunkParser::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    /// More input is required.
    NeedMore,
    /// The chunked body (final chunk and trailer-part included) is complete.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Awaiting a chunk-size line (and possible extension).
    AwaitSize,
    /// Copying `remaining` octets of chunk data into the body sink.
    InData { remaining: u64 },
    /// Awaiting the CRLF that terminates a non-final chunk's data.
    AwaitDataCrlf,
    /// Awaiting the combined final-chunk + trailer-part double-CRLF block.
    /// `size_line_end` is the offset (relative to the block's own start,
    /// i.e. `total` at the time the zero-size chunk-size line was seen) of
    /// the end of that line, so trailer fields are parsed only after it.
    AwaitFinal { size_line_end: usize },
    Done,
}

/// Incremental parser for `chunked` message bodies.
pub struct ChunkParser {
    state: State,
    skip: usize,
    body_size: u64,
    config: ParserConfig,
}

impl ChunkParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            state: State::AwaitSize,
            skip: 0,
            body_size: 0,
            config: config.clone(),
        }
    }

    /// Feed the driver's entire unconsumed readable buffer, delivering chunk
    /// octets and trailer fields to `sink`. Returns the number of leading
    /// bytes consumed and the resulting status.
    pub fn write(
        &mut self,
        data: &[u8],
        sink: &mut impl Collaborator,
    ) -> Result<(usize, ChunkStatus), ParseError> {
        let mut total = 0usize;
        loop {
            match self.state {
                State::Done => return Ok((total, ChunkStatus::Complete)),
                State::AwaitSize => {
                    let rest = &data[total..];
                    match find_crlf(rest, self.skip) {
                        None => {
                            self.skip = rest.len().saturating_sub(1);
                            return Ok((total, ChunkStatus::NeedMore));
                        }
                        Some(line_end) => {
                            self.skip = 0;
                            let line = &rest[..line_end - 2];
                            let size = parse_chunk_size_line(line, sink)?;
                            if size == 0 {
                                // Don't consume the size line's own CRLF yet:
                                // it is the first half of the combined
                                // final-chunk + trailer-part double-CRLF
                                // block that `AwaitFinal` scans for.
                                self.state = State::AwaitFinal {
                                    size_line_end: line_end,
                                };
                            } else {
                                total += line_end;
                                self.body_size = self
                                    .body_size
                                    .checked_add(size)
                                    .ok_or(ParseError::BodyTooLarge)?;
                                if self.body_size > self.config.max_body_size as u64 {
                                    return Err(ParseError::BodyTooLarge);
                                }
                                self.state = State::InData { remaining: size };
                            }
                        }
                    }
                }
                State::InData { remaining } => {
                    let rest = &data[total..];
                    if rest.is_empty() {
                        return Ok((total, ChunkStatus::NeedMore));
                    }
                    let n = (remaining as usize).min(rest.len());
                    let dst = sink.prepare(n);
                    let n = n.min(dst.len());
                    dst[..n].copy_from_slice(&rest[..n]);
                    sink.commit(n);
                    total += n;
                    let remaining = remaining - n as u64;
                    self.state = if remaining == 0 {
                        State::AwaitDataCrlf
                    } else {
                        State::InData { remaining }
                    };
                }
                State::AwaitDataCrlf => {
                    let rest = &data[total..];
                    if rest.len() < 2 {
                        return Ok((total, ChunkStatus::NeedMore));
                    }
                    if &rest[..2] != b"\r\n" {
                        return Err(ParseError::BadChunkData);
                    }
                    total += 2;
                    self.state = State::AwaitSize;
                }
                State::AwaitFinal { size_line_end } => {
                    let rest = &data[total..];
                    match crate::header::find_double_crlf(rest, self.skip) {
                        None => {
                            self.skip = rest.len().saturating_sub(3);
                            return Ok((total, ChunkStatus::NeedMore));
                        }
                        Some(block_end) => {
                            let trailer_block = &rest[..block_end];
                            let mut dummy_count = 0usize;
                            crate::header::parse_field_lines(
                                trailer_block,
                                size_line_end,
                                &self.config,
                                &mut dummy_count,
                                |name, value| sink.on_field(name, value),
                            )?;
                            total += block_end;
                            self.state = State::Done;
                            sink.finish();
                            return Ok((total, ChunkStatus::Complete));
                        }
                    }
                }
            }
        }
    }
}

/// Parses a chunk-size line's hex digits (and, if present, its extension),
/// reporting the extension through `sink.on_chunk_extension` verbatim.
fn parse_chunk_size_line(line: &[u8], sink: &mut impl HeaderSink) -> Result<u64, ParseError> {
    let ext_start = line.iter().position(|&b| b == b';').unwrap_or(line.len());
    let size_part = &line[..ext_start];
    if size_part.is_empty() {
        return Err(ParseError::BadChunkSize);
    }
    let size = parse_hex_u64(size_part).ok_or(ParseError::BadChunkSize)?;

    if ext_start < line.len() {
        let ext = &line[ext_start..];
        if !ext[1..].iter().all(|&b| crate::classify::is_value_char(b) || b == b';') {
            return Err(ParseError::BadChunkExtension);
        }
        sink.on_chunk_extension(ext)?;
    }
    Ok(size)
}

fn parse_hex_u64(value: &[u8]) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    let mut v: u64 = 0;
    for &b in value {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        v = v.checked_mul(16)?.checked_add(digit as u64)?;
    }
    Some(v)
}

/// Single-CRLF scan with a skip-resume hint, mirroring
/// [`crate::header::find_double_crlf`] but for the chunk-size line
/// terminator.
fn find_crlf(data: &[u8], from: usize) -> Option<usize> {
    if data.len() < 2 {
        return None;
    }
    let last_start = data.len() - 2;
    let mut i = from.min(last_start + 1);
    while i <= last_start {
        if data[i] == b'\r' && data[i + 1] == b'\n' {
            return Some(i + 2);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collector {
        body: Vec<u8>,
        prepared: usize,
        extensions: Vec<Vec<u8>>,
        trailers: Vec<(Vec<u8>, Vec<u8>)>,
        finished: bool,
    }

    impl BodySink for Collector {
        fn prepare(&mut self, n: usize) -> &mut [u8] {
            let start = self.body.len();
            self.body.resize(start + n, 0);
            self.prepared = n;
            &mut self.body[start..start + n]
        }
        fn commit(&mut self, k: usize) {
            let cur = self.body.len();
            self.body.truncate(cur - (self.prepared - k));
        }
        fn finish(&mut self) {
            self.finished = true;
        }
    }

    impl HeaderSink for Collector {
        fn on_field(&mut self, n: &[u8], v: &[u8]) -> Result<(), ParseError> {
            self.trailers.push((n.to_vec(), v.to_vec()));
            Ok(())
        }
        fn on_chunk_extension(&mut self, ext: &[u8]) -> Result<(), ParseError> {
            self.extensions.push(ext.to_vec());
            Ok(())
        }
    }

    fn run(data: &[u8]) -> (Collector, usize, ChunkStatus) {
        let config = ParserConfig::default();
        let mut parser = ChunkParser::new(&config);
        let mut sink = Collector::default();
        let (consumed, status) = parser.write(data, &mut sink).unwrap();
        (sink, consumed, status)
    }

    #[test]
    fn single_chunk_then_final() {
        let data = b"5\r\nhello\r\n0\r\n\r\n";
        let (sink, consumed, status) = run(data);
        assert_eq!(status, ChunkStatus::Complete);
        assert_eq!(consumed, data.len());
        assert_eq!(&sink.body[..5], b"hello");
        assert!(sink.finished);
    }

    #[test]
    fn multiple_chunks() {
        let data = b"3\r\nfoo\r\n3\r\nbar\r\n0\r\n\r\n";
        let (sink, _, status) = run(data);
        assert_eq!(status, ChunkStatus::Complete);
        assert_eq!(&sink.body[..6], b"foobar");
    }

    #[test]
    fn trailers_are_parsed() {
        let data = b"0\r\nX-Trailer: done\r\n\r\n";
        let (sink, _, status) = run(data);
        assert_eq!(status, ChunkStatus::Complete);
        assert_eq!(sink.trailers, vec![(b"X-Trailer".to_vec(), b"done".to_vec())]);
    }

    #[test]
    fn chunk_extension_is_surfaced() {
        let data = b"5;foo=bar\r\nhello\r\n0\r\n\r\n";
        let (sink, _, _) = run(data);
        assert_eq!(sink.extensions, vec![b";foo=bar".to_vec()]);
    }

    #[test]
    fn missing_data_crlf_is_rejected() {
        let data = b"3\r\nfooXX";
        let config = ParserConfig::default();
        let mut parser = ChunkParser::new(&config);
        let mut sink = Collector::default();
        let err = parser.write(data, &mut sink).unwrap_err();
        assert_eq!(err, ParseError::BadChunkData);
    }

    #[test]
    fn bad_hex_size_is_rejected() {
        let data = b"zz\r\n";
        let config = ParserConfig::default();
        let mut parser = ChunkParser::new(&config);
        let mut sink = Collector::default();
        let err = parser.write(data, &mut sink).unwrap_err();
        assert_eq!(err, ParseError::BadChunkSize);
    }

    #[test]
    fn fragmented_chunk_needs_more_then_completes() {
        let whole: &[u8] = b"4\r\nabcd\r\n0\r\n\r\n";
        let config = ParserConfig::default();
        let mut parser = ChunkParser::new(&config);
        let mut sink = Collector::default();
        let mut buf = Vec::new();
        let mut status = ChunkStatus::NeedMore;
        for &b in whole {
            buf.push(b);
            let (consumed, st) = parser.write(&buf, &mut sink).unwrap();
            status = st;
            if consumed > 0 {
                buf.drain(..consumed);
            }
            if status == ChunkStatus::Complete {
                break;
            }
        }
        assert_eq!(status, ChunkStatus::Complete);
        assert_eq!(&sink.body[..4], b"abcd");
    }
}

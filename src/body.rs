//! Body dispatcher (§4.3): routes message-body octets to the right framing
//! mode once [`crate::header::Framing`] is known, and exposes the
//! direct-read region a content-length body lets the driver write into
//! without an extra copy through the parse buffer.

use crate::chunk::{ChunkParser, ChunkStatus, Collaborator};
use crate::error::ParseError;
use crate::header::{Framing, ParserConfig};
use crate::sink::BodySink;

/// Outcome of a [`BodyDispatcher::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStatus {
    /// More input (or, for `UntilEof`, EOF) is required.
    NeedMore,
    /// The body has been fully delivered to the sink.
    Complete,
}

enum Mode {
    ContentLength { remaining: u64 },
    Chunked(ChunkParser),
    UntilEof,
}

/// Delivers message-body octets to a [`BodySink`] according to the framing a
/// header block declared.
pub struct BodyDispatcher {
    mode: Mode,
}

impl BodyDispatcher {
    pub fn new(framing: Framing, config: &ParserConfig) -> Self {
        let mode = match framing {
            Framing::ContentLength(n) => Mode::ContentLength { remaining: n },
            Framing::Chunked => Mode::Chunked(ChunkParser::new(config)),
            Framing::UntilEof => Mode::UntilEof,
        };
        Self { mode }
    }

    /// True for `Content-Length` framing with a nonzero remaining count: the
    /// driver may, instead of calling `write`, hand `body.prepare` directly
    /// to the octet source and call [`BodyDispatcher::direct_commit`] (§4.5).
    pub fn wants_direct_read(&self) -> Option<usize> {
        match self.mode {
            Mode::ContentLength { remaining } if remaining > 0 => {
                Some(remaining.min(usize::MAX as u64) as usize)
            }
            _ => None,
        }
    }

    /// Record `k` octets the driver wrote directly into the sink's last
    /// `prepare`d region, bypassing `write`.
    pub fn direct_commit(&mut self, sink: &mut impl BodySink, k: usize) -> BodyStatus {
        sink.commit(k);
        if let Mode::ContentLength { remaining } = &mut self.mode {
            *remaining -= k as u64;
            if *remaining == 0 {
                sink.finish();
                return BodyStatus::Complete;
            }
        }
        BodyStatus::NeedMore
    }

    /// Feed the driver's unconsumed readable buffer, delivering body octets
    /// (and, for chunked bodies, trailer fields) to `sink`. Returns the
    /// number of leading bytes consumed and the resulting status.
    pub fn write(
        &mut self,
        data: &[u8],
        sink: &mut impl Collaborator,
    ) -> Result<(usize, BodyStatus), ParseError> {
        match &mut self.mode {
            Mode::ContentLength { remaining } => {
                if *remaining == 0 {
                    sink.finish();
                    return Ok((0, BodyStatus::Complete));
                }
                let n = (*remaining as usize).min(data.len());
                if n == 0 {
                    return Ok((0, BodyStatus::NeedMore));
                }
                let dst = sink.prepare(n);
                let n = n.min(dst.len());
                dst[..n].copy_from_slice(&data[..n]);
                sink.commit(n);
                *remaining -= n as u64;
                if *remaining == 0 {
                    sink.finish();
                    Ok((n, BodyStatus::Complete))
                } else {
                    Ok((n, BodyStatus::NeedMore))
                }
            }
            Mode::Chunked(chunk) => {
                let (consumed, status) = chunk.write(data, sink)?;
                let status = match status {
                    ChunkStatus::NeedMore => BodyStatus::NeedMore,
                    ChunkStatus::Complete => BodyStatus::Complete,
                };
                Ok((consumed, status))
            }
            Mode::UntilEof => {
                if data.is_empty() {
                    return Ok((0, BodyStatus::NeedMore));
                }
                let dst = sink.prepare(data.len());
                let n = data.len().min(dst.len());
                dst[..n].copy_from_slice(&data[..n]);
                sink.commit(n);
                Ok((n, BodyStatus::NeedMore))
            }
        }
    }

    /// Signal end of input. `UntilEof` framing completes here; the other
    /// two framings treat EOF before completion as truncation.
    pub fn write_eof(&mut self, sink: &mut impl BodySink) -> Result<(), ParseError> {
        match &self.mode {
            Mode::UntilEof => {
                sink.finish();
                Ok(())
            }
            Mode::ContentLength { remaining } if *remaining == 0 => Ok(()),
            _ => Err(ParseError::ShortRead),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::HeaderSink;

    #[derive(Default)]
    struct Collector {
        body: Vec<u8>,
        prepared: usize,
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

    impl HeaderSink for Collector {}

    #[test]
    fn content_length_completes_exactly() {
        let config = ParserConfig::default();
        let mut dispatcher = BodyDispatcher::new(Framing::ContentLength(5), &config);
        let mut sink = Collector::default();
        let (consumed, status) = dispatcher.write(b"helloXX", &mut sink).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(status, BodyStatus::Complete);
        assert_eq!(sink.body, b"hello");
        assert!(sink.finished);
    }

    #[test]
    fn content_length_zero_completes_immediately() {
        let config = ParserConfig::default();
        let mut dispatcher = BodyDispatcher::new(Framing::ContentLength(0), &config);
        let mut sink = Collector::default();
        let (consumed, status) = dispatcher.write(b"", &mut sink).unwrap();
        assert_eq!(consumed, 0);
        assert_eq!(status, BodyStatus::Complete);
        assert!(sink.finished);
    }

    #[test]
    fn until_eof_never_completes_from_write() {
        let config = ParserConfig::default();
        let mut dispatcher = BodyDispatcher::new(Framing::UntilEof, &config);
        let mut sink = Collector::default();
        let (consumed, status) = dispatcher.write(b"abc", &mut sink).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(status, BodyStatus::NeedMore);
        dispatcher.write_eof(&mut sink).unwrap();
        assert!(sink.finished);
    }

    #[test]
    fn content_length_eof_before_complete_is_short_read() {
        let config = ParserConfig::default();
        let mut dispatcher = BodyDispatcher::new(Framing::ContentLength(5), &config);
        let mut sink = Collector::default();
        dispatcher.write(b"ab", &mut sink).unwrap();
        let err = dispatcher.write_eof(&mut sink).unwrap_err();
        assert_eq!(err, ParseError::ShortRead);
    }

    #[test]
    fn direct_read_path_tracks_remaining() {
        let config = ParserConfig::default();
        let mut dispatcher = BodyDispatcher::new(Framing::ContentLength(10), &config);
        assert_eq!(dispatcher.wants_direct_read(), Some(10));
        let mut sink = Collector::default();
        sink.prepare(10);
        let status = dispatcher.direct_commit(&mut sink, 10);
        assert_eq!(status, BodyStatus::Complete);
        assert!(sink.finished);
    }
}

//! Read-loop driver (§4.5): pumps bytes from an octet source into a
//! [`MessageParser`], handling buffer growth, EOF, and the direct-read
//! optimization. Two source shapes exist — blocking and poll-style — both
//! driven by the same algorithm.

use crate::buffer::ParseBuffer;
use crate::chunk::Collaborator;
use crate::error::DriverError;
use crate::message::{MessageParser, ParseStatus};

/// A blocking octet source (§6): `read_some` blocks until at least one byte
/// is available, returns `Ok(0)` at end of input.
pub trait Source {
    fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

impl<T: std::io::Read> Source for T {
    fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.read(buf)
    }
}

/// Poll result for [`TryReadSource`]: either bytes were read (possibly
/// zero, meaning EOF), or the source would block and must be retried later.
pub enum Poll<T> {
    Ready(T),
    Pending,
}

/// A non-blocking, poll-style octet source (§6). The crate carries no async
/// runtime dependency, so this models readiness directly rather than via a
/// `Future`.
pub trait TryReadSource {
    fn try_read_some(&mut self, buf: &mut [u8]) -> Poll<std::io::Result<usize>>;
}

/// How far [`BlockingDriver::run`] advances before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Return as soon as the parser reports any non-`need-more` progress.
    ParseSome,
    /// Loop until `message-complete` or a terminal error.
    ParseAll,
}

/// Couples a [`MessageParser`] to a blocking [`Source`] and a
/// [`ParseBuffer`], implementing the read-loop algorithm from §4.5.
pub struct BlockingDriver<S> {
    source: S,
    buffer: ParseBuffer,
    read_hint: usize,
    buffer_cap: usize,
}

impl<S: Source> BlockingDriver<S> {
    pub fn new(source: S, read_hint: usize, buffer_cap: usize) -> Self {
        Self {
            source,
            buffer: ParseBuffer::new(),
            read_hint,
            buffer_cap,
        }
    }

    /// Build a driver whose per-iteration growth bound is taken from
    /// `parser`'s own [`ParserConfig::read_hint`], rather than specified
    /// separately.
    pub fn from_config(source: S, parser: &MessageParser, buffer_cap: usize) -> Self {
        Self::new(source, parser.config().read_hint, buffer_cap)
    }

    /// Drive `parser` according to `mode`, delivering callbacks to `sink`.
    pub fn run(
        &mut self,
        parser: &mut MessageParser,
        sink: &mut impl Collaborator,
        mode: DriveMode,
    ) -> Result<ParseStatus, DriverError> {
        loop {
            if let Some(hint) = parser.wants_direct_read()
                && self.buffer.is_empty()
            {
                let n = hint.min(self.read_hint).max(1);
                let region = sink_direct_region(sink, n);
                let k = self.source.read_some(region)?;
                if k == 0 {
                    #[cfg(feature = "std")]
                    log::debug!("direct-read saw eof with body still pending");
                    return Err(DriverError::Parse(crate::error::ParseError::ShortRead));
                }
                let status = parser.direct_commit(sink, k);
                #[cfg(feature = "std")]
                log::trace!("direct-read committed {k} bytes");
                if status == ParseStatus::MessageComplete || mode == DriveMode::ParseSome {
                    return Ok(status);
                }
                continue;
            }

            let (consumed, status) = parser.write(self.buffer.readable(), sink)?;
            self.buffer.consume(consumed);

            match status {
                ParseStatus::MessageComplete => return Ok(status),
                ParseStatus::NeedMore if mode == DriveMode::ParseSome && consumed > 0 => {
                    return Ok(status);
                }
                ParseStatus::NeedMore => {
                    let region = self
                        .buffer
                        .prepare(self.read_hint, self.buffer_cap)
                        .ok_or(DriverError::BufferOverflow)?;
                    let k = self.source.read_some(region)?;
                    if k == 0 {
                        if parser.is_fresh() {
                            #[cfg(feature = "std")]
                            log::trace!("eof with no bytes observed yet");
                            return Ok(ParseStatus::NeedMore);
                        }
                        parser.write_eof(sink)?;
                        return Ok(ParseStatus::MessageComplete);
                    }
                    #[cfg(feature = "std")]
                    log::trace!("read {k} bytes into parse buffer");
                    self.buffer.commit(k);
                }
            }
        }
    }
}

fn sink_direct_region(sink: &mut impl Collaborator, n: usize) -> &mut [u8] {
    crate::sink::BodySink::prepare(sink, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{BodySink, HeaderSink};
    use crate::types::Direction;

    struct SliceSource<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl<'a> Source for SliceSource<'a> {
        fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = (self.data.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[derive(Default)]
    struct Collector {
        method: Vec<u8>,
        body: Vec<u8>,
        prepared: usize,
        finished: bool,
    }

    impl HeaderSink for Collector {
        fn on_method(&mut self, m: &[u8]) -> Result<(), crate::error::ParseError> {
            self.method = m.to_vec();
            Ok(())
        }
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

    #[test]
    fn drives_a_request_to_completion_in_small_reads() {
        let data = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";
        let source = SliceSource { data, pos: 0 };
        let mut driver = BlockingDriver::new(source, 4, usize::MAX);
        let mut parser = MessageParser::new(Direction::Request);
        let mut sink = Collector::default();
        let status = driver.run(&mut parser, &mut sink, DriveMode::ParseAll).unwrap();
        assert_eq!(status, ParseStatus::MessageComplete);
        assert_eq!(sink.method, b"GET");
    }

    #[test]
    fn drives_content_length_body_via_direct_read() {
        let data = b"GET / HTTP/1.1\r\nContent-Length: 20\r\n\r\n01234567890123456789";
        let source = SliceSource { data, pos: 0 };
        let mut driver = BlockingDriver::new(source, 64, usize::MAX);
        let mut parser = MessageParser::new(Direction::Request);
        let mut sink = Collector::default();
        let status = driver.run(&mut parser, &mut sink, DriveMode::ParseAll).unwrap();
        assert_eq!(status, ParseStatus::MessageComplete);
        assert_eq!(sink.body, b"01234567890123456789");
        assert!(sink.finished);
    }

    #[test]
    fn empty_source_with_no_bytes_is_not_an_error() {
        let source = SliceSource { data: b"", pos: 0 };
        let mut driver = BlockingDriver::new(source, 16, usize::MAX);
        let mut parser = MessageParser::new(Direction::Request);
        let mut sink = Collector::default();
        let status = driver.run(&mut parser, &mut sink, DriveMode::ParseAll).unwrap();
        assert_eq!(status, ParseStatus::NeedMore);
    }

    #[test]
    fn from_config_derives_read_hint_from_parser_config() {
        let data = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";
        let source = SliceSource { data, pos: 0 };
        let config = crate::header::ParserConfig {
            read_hint: 4,
            ..Default::default()
        };
        let mut parser = MessageParser::with_config(Direction::Request, config);
        let mut driver = BlockingDriver::from_config(source, &parser, usize::MAX);
        assert_eq!(driver.read_hint, 4);
        let mut sink = Collector::default();
        let status = driver.run(&mut parser, &mut sink, DriveMode::ParseAll).unwrap();
        assert_eq!(status, ParseStatus::MessageComplete);
        assert_eq!(sink.method, b"GET");
    }

    #[test]
    fn truncated_content_length_body_is_short_read() {
        let data = b"GET / HTTP/1.1\r\nContent-Length: 20\r\n\r\nonly ten";
        let source = SliceSource { data, pos: 0 };
        let mut driver = BlockingDriver::new(source, 64, usize::MAX);
        let mut parser = MessageParser::new(Direction::Request);
        let mut sink = Collector::default();
        let err = driver.run(&mut parser, &mut sink, DriveMode::ParseAll).unwrap_err();
        assert!(matches!(err, DriverError::Parse(crate::error::ParseError::ShortRead)));
    }
}

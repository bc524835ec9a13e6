//! Glues the header parser (§4.1) and body dispatcher (§4.3) into the single
//! state machine a driver actually drives: header block, then body, then
//! done. This is "the wire-format parser state machine" and "the framing
//! decoder" from the top-level design, fused into the one object a caller
//! holds per message.

use crate::body::{BodyDispatcher, BodyStatus};
use crate::chunk::Collaborator;
use crate::error::ParseError;
use crate::header::{Framing, HeaderParser, HeaderStatus, ParserConfig};
use crate::sink::BodySink;
use crate::types::Direction;

/// Outcome of a [`MessageParser::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// More input is required.
    NeedMore,
    /// The message (header and body) is fully parsed.
    MessageComplete,
}

enum Phase {
    Header(HeaderParser),
    Body(BodyDispatcher, Framing),
    Done(Framing),
}

/// A single request or response, parsed incrementally from header through
/// body. Single-use: construct one per message, drive it to
/// [`ParseStatus::MessageComplete`] or a terminal error, then discard it.
pub struct MessageParser {
    phase: Phase,
    config: ParserConfig,
    any_byte_consumed: bool,
}

impl MessageParser {
    pub fn new(direction: Direction) -> Self {
        Self::with_config(direction, ParserConfig::default())
    }

    pub fn with_config(direction: Direction, config: ParserConfig) -> Self {
        Self {
            phase: Phase::Header(HeaderParser::with_config(direction, config.clone())),
            config,
            any_byte_consumed: false,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// True as long as no bytes of this message have yet been observed —
    /// used by the driver to decide whether an immediate EOF means "no
    /// message here" rather than a truncated one (§4.5).
    pub fn is_fresh(&self) -> bool {
        !self.any_byte_consumed
    }

    /// Feed the driver's entire unconsumed readable buffer. Returns the
    /// number of leading bytes consumed this call and the resulting status.
    pub fn write(
        &mut self,
        data: &[u8],
        sink: &mut impl Collaborator,
    ) -> Result<(usize, ParseStatus), ParseError> {
        if !data.is_empty() {
            self.any_byte_consumed = true;
        }
        match &mut self.phase {
            Phase::Header(parser) => {
                let (consumed, status) = parser.write(data, sink)?;
                match status {
                    HeaderStatus::NeedMore => Ok((consumed, ParseStatus::NeedMore)),
                    HeaderStatus::HeaderComplete => {
                        let framing = parser.take_framing();
                        self.phase =
                            Phase::Body(BodyDispatcher::new(framing, &self.config), framing);
                        let (body_consumed, status) = self.write(&data[consumed..], sink)?;
                        Ok((consumed + body_consumed, status))
                    }
                }
            }
            Phase::Body(dispatcher, framing) => {
                let framing = *framing;
                let (consumed, status) = dispatcher.write(data, sink)?;
                match status {
                    BodyStatus::NeedMore => Ok((consumed, ParseStatus::NeedMore)),
                    BodyStatus::Complete => {
                        self.phase = Phase::Done(framing);
                        Ok((consumed, ParseStatus::MessageComplete))
                    }
                }
            }
            Phase::Done(_) => Ok((0, ParseStatus::MessageComplete)),
        }
    }

    /// `Some(n)` only right after the header block completes, for
    /// `Content-Length` bodies with bytes still owed: the point at which the
    /// driver may opt into the direct-read optimization (§4.5).
    pub fn wants_direct_read(&self) -> Option<usize> {
        match &self.phase {
            Phase::Body(dispatcher, _) => dispatcher.wants_direct_read(),
            _ => None,
        }
    }

    /// Record `k` octets written directly into the body sink's last
    /// `prepare`d region (§4.3, §4.5).
    pub fn direct_commit(&mut self, sink: &mut impl BodySink, k: usize) -> ParseStatus {
        match &mut self.phase {
            Phase::Body(dispatcher, framing) => {
                let framing = *framing;
                match dispatcher.direct_commit(sink, k) {
                    BodyStatus::NeedMore => ParseStatus::NeedMore,
                    BodyStatus::Complete => {
                        self.phase = Phase::Done(framing);
                        ParseStatus::MessageComplete
                    }
                }
            }
            _ => ParseStatus::NeedMore,
        }
    }

    /// Signal end of input.
    pub fn write_eof(&mut self, sink: &mut impl BodySink) -> Result<(), ParseError> {
        match &mut self.phase {
            Phase::Header(parser) => parser.write_eof(),
            Phase::Body(dispatcher, _) => dispatcher.write_eof(sink),
            Phase::Done(_) => Ok(()),
        }
    }

    /// The framing this message declared. Only meaningful once the header
    /// block has completed.
    pub fn take_framing(&self) -> Option<Framing> {
        match &self.phase {
            Phase::Header(_) => None,
            Phase::Body(_, framing) | Phase::Done(framing) => Some(*framing),
        }
    }
}

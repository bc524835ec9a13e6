//! # httpcore
//!
//! A **strict, incremental HTTP/1.x message parser** (RFC 7230) built as
//! three tightly coupled subsystems: a wire-format state machine, a framing
//! decoder (`Content-Length` / chunked / connection-close), and a read-loop
//! driver that couples the parser to a blocking or non-blocking octet
//! source. The parser never owns a message container — it calls out to a
//! [`HeaderSink`]/[`BodySink`] collaborator supplied by the caller.
//!
//! ## Quick start — one-shot parsing
//!
//! ```rust
//! use httpcore::parse_request;
//!
//! let raw = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let request = parse_request(raw).expect("valid request");
//! assert_eq!(request.method.as_str(), "GET");
//! assert_eq!(request.uri, "/hello");
//! ```
//!
//! ## Quick start — incremental parsing
//!
//! Each call must be given the *entire* unconsumed buffer — bytes the
//! parser didn't consume stay at the front for the next call.
//!
//! ```rust
//! use httpcore::{MessageParser, ParseStatus, RequestCollector, Direction};
//!
//! let mut parser = MessageParser::new(Direction::Request);
//! let mut collector = RequestCollector::new();
//! let mut buf = Vec::new();
//!
//! buf.extend_from_slice(b"GET / HTTP/1.1\r\n");
//! let (consumed, status) = parser.write(&buf, &mut collector).unwrap();
//! buf.drain(..consumed);
//! assert_eq!(status, ParseStatus::NeedMore);
//!
//! buf.extend_from_slice(b"Host: example.com\r\n\r\n");
//! let (_, status) = parser.write(&buf, &mut collector).unwrap();
//! assert_eq!(status, ParseStatus::MessageComplete);
//!
//! let request = collector.into_request().unwrap();
//! assert_eq!(request.uri, "/");
//! ```

mod body;
mod buffer;
mod chunk;
mod classify;
mod collector;
mod driver;
mod error;
mod header;
mod message;
mod output;
mod sink;
mod types;

pub use body::{BodyDispatcher, BodyStatus};
pub use buffer::ParseBuffer;
pub use chunk::{ChunkParser, ChunkStatus, Collaborator};
pub use collector::{HttpMethod, HttpRequest, HttpResponse, RequestCollector, ResponseCollector};
pub use driver::{BlockingDriver, DriveMode, Poll, Source, TryReadSource};
pub use error::{DriverError, ParseError};
pub use header::{Framing, HeaderParser, HeaderStatus, ParserConfig};
pub use message::{MessageParser, ParseStatus};
pub use output::{
    format_json, format_request_debug, format_request_headers_only, format_response_debug,
    format_response_headers_only,
};
pub use sink::{BodySink, HeaderSink};
pub use types::{Direction, Header};

/// Parse a **complete** HTTP request from a byte slice in one call.
///
/// This is a convenience wrapper around [`MessageParser`] and
/// [`RequestCollector`]. For incremental / streaming use, drive a
/// `MessageParser` directly, or use [`BlockingDriver`] over a byte source.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed, or [`ParseError::ShortRead`]
/// if it is incomplete.
pub fn parse_request(data: &[u8]) -> Result<HttpRequest, ParseError> {
    parse_request_with_config(data, ParserConfig::default())
}

/// Parse a **complete** HTTP request using custom [`ParserConfig`] limits.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed, incomplete, or exceeds
/// the configured limits.
pub fn parse_request_with_config(
    data: &[u8],
    config: ParserConfig,
) -> Result<HttpRequest, ParseError> {
    let mut parser = MessageParser::with_config(Direction::Request, config);
    let mut collector = RequestCollector::new();
    let (_, status) = parser.write(data, &mut collector)?;
    match status {
        ParseStatus::MessageComplete => collector.into_request(),
        ParseStatus::NeedMore => {
            parser.write_eof(&mut collector)?;
            collector.into_request()
        }
    }
}

/// Parse a **complete** HTTP response from a byte slice in one call.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed or incomplete.
pub fn parse_response(data: &[u8]) -> Result<HttpResponse, ParseError> {
    parse_response_with_config(data, ParserConfig::default())
}

/// Parse a **complete** HTTP response using custom [`ParserConfig`] limits.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed, incomplete, or exceeds
/// the configured limits.
pub fn parse_response_with_config(
    data: &[u8],
    config: ParserConfig,
) -> Result<HttpResponse, ParseError> {
    let mut parser = MessageParser::with_config(Direction::Response, config);
    let mut collector = ResponseCollector::new();
    let (_, status) = parser.write(data, &mut collector)?;
    match status {
        ParseStatus::MessageComplete => collector.into_response(),
        ParseStatus::NeedMore => {
            parser.write_eof(&mut collector)?;
            collector.into_response()
        }
    }
}

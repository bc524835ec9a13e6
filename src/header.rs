//! Start-line + header-field state machine and framing-header interpretation
//! (§4.1). This is "the wire-format parser" and "the framing decoder" halves
//! of the core, fused into one pass as RFC 7230 intends: a message's framing
//! can only be decided once every header field has been seen.

use crate::classify::{is_digit, is_pathchar, is_tchar, is_value_char};
use crate::error::ParseError;
use crate::sink::HeaderSink;
use crate::types::Direction;

/// Configurable limits for the parser. All sizes are in bytes unless noted.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum length of the HTTP method token (default: 16).
    pub max_method_len: usize,
    /// Maximum length of the request-target (default: 8 192).
    pub max_uri_len: usize,
    /// Maximum length of a single header (or trailer) field name (default: 256).
    pub max_header_name_len: usize,
    /// Maximum length of a single header (or trailer) field value (default: 8 192).
    pub max_header_value_len: usize,
    /// Maximum number of header fields, trailers included (default: 128).
    pub max_headers_count: usize,
    /// Maximum total size of the header block, start-line included, while
    /// the terminating CRLF CRLF has not yet been found (default: 64 KiB).
    /// Bounds unbounded growth from a client that never sends the blank line.
    pub max_header_section_len: usize,
    /// Maximum body size, whether declared by Content-Length or accumulated
    /// from chunks (default: 10 MiB).
    pub max_body_size: usize,
    /// Per-iteration growth bound for the read-loop driver (default: 64 KiB).
    pub read_hint: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_method_len: 16,
            max_uri_len: 8_192,
            max_header_name_len: 256,
            max_header_value_len: 8_192,
            max_headers_count: 128,
            max_header_section_len: 64 * 1024,
            max_body_size: 10 * 1024 * 1024,
            read_hint: 64 * 1024,
        }
    }
}

/// Outcome of a [`HeaderParser::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStatus {
    /// More input is required before the header block can be tokenized.
    NeedMore,
    /// The header block (start-line, fields, and terminating blank line) has
    /// been fully consumed and dispatched to the sink.
    HeaderComplete,
}

/// The body-length framing a message declares, decided once header parsing
/// completes (§4.1 `take_framing`, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `Content-Length: N` — exactly `N` octets of body follow.
    ContentLength(u64),
    /// `Transfer-Encoding: chunked` — body is chunk-encoded (§4.2).
    Chunked,
    /// Neither header present — body runs until the source signals EOF.
    UntilEof,
}

/// Incremental start-line + header-field parser for one direction (request
/// or response), sharing field tokenization and framing interpretation
/// between both.
pub struct HeaderParser {
    direction: Direction,
    config: ParserConfig,
    skip: usize,
    header_count: usize,
    content_length: Option<u64>,
    is_chunked: bool,
    complete: bool,
}

impl HeaderParser {
    pub fn new(direction: Direction) -> Self {
        Self::with_config(direction, ParserConfig::default())
    }

    pub fn with_config(direction: Direction, config: ParserConfig) -> Self {
        Self {
            direction,
            config,
            skip: 0,
            header_count: 0,
            content_length: None,
            is_chunked: false,
            complete: false,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Feed the driver's entire unconsumed readable buffer. Returns the
    /// number of leading bytes that belong to the header block (0 until
    /// `HeaderComplete`) and the resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on any grammar violation, configured-limit
    /// breach, or framing conflict.
    pub fn write(
        &mut self,
        data: &[u8],
        sink: &mut impl HeaderSink,
    ) -> Result<(usize, HeaderStatus), ParseError> {
        if self.complete {
            return Ok((0, HeaderStatus::HeaderComplete));
        }

        let scan_from = self.skip;
        match find_double_crlf(data, scan_from) {
            None => {
                if data.len() > self.config.max_header_section_len {
                    return Err(ParseError::HeaderTooLarge);
                }
                self.skip = data.len().saturating_sub(3);
                Ok((0, HeaderStatus::NeedMore))
            }
            Some(block_end) => {
                if block_end > self.config.max_header_section_len {
                    return Err(ParseError::HeaderTooLarge);
                }
                self.parse_block(&data[..block_end], sink)?;
                sink.on_header()?;
                self.complete = true;
                Ok((block_end, HeaderStatus::HeaderComplete))
            }
        }
    }

    /// Signal end of input. A no-op once the header block is already
    /// complete; otherwise the message was truncated mid-header.
    pub fn write_eof(&self) -> Result<(), ParseError> {
        if self.complete {
            Ok(())
        } else {
            Err(ParseError::ShortRead)
        }
    }

    /// The framing this message declared. Only meaningful once
    /// [`HeaderStatus::HeaderComplete`] has been returned.
    pub fn take_framing(&self) -> Framing {
        if self.is_chunked {
            Framing::Chunked
        } else if let Some(n) = self.content_length {
            Framing::ContentLength(n)
        } else if self.direction == Direction::Request {
            // A request with neither header has no body (RFC 7230 §3.3.3
            // rule 6); only a response may fall back to read-until-close.
            Framing::ContentLength(0)
        } else {
            Framing::UntilEof
        }
    }

    fn parse_block(
        &mut self,
        data: &[u8],
        sink: &mut impl HeaderSink,
    ) -> Result<(), ParseError> {
        let mut i = match self.direction {
            Direction::Request => self.parse_request_line(data, sink)?,
            Direction::Response => self.parse_status_line(data, sink)?,
        };
        i = self.parse_fields(data, i, sink)?;
        if i != data.len() {
            return Err(ParseError::BadValue);
        }
        Ok(())
    }

    fn parse_request_line(
        &self,
        data: &[u8],
        sink: &mut impl HeaderSink,
    ) -> Result<usize, ParseError> {
        let (method, mut i) = take_token(data, 0, is_tchar);
        if method.is_empty() || data.get(i) != Some(&b' ') {
            return Err(ParseError::BadMethod);
        }
        if method.len() > self.config.max_method_len {
            return Err(ParseError::HeaderTooLarge);
        }
        sink.on_method(method)?;
        i += 1;

        let (path, mut i2) = take_token(data, i, is_pathchar);
        if path.is_empty() || data.get(i2) != Some(&b' ') {
            return Err(ParseError::BadPath);
        }
        if path.len() > self.config.max_uri_len {
            return Err(ParseError::HeaderTooLarge);
        }
        sink.on_path(path)?;
        i2 += 1;

        let (version, mut i3) = parse_version(data, i2).ok_or(ParseError::BadVersion)?;
        if data.get(i3) != Some(&b'\r') || data.get(i3 + 1) != Some(&b'\n') {
            return Err(ParseError::BadVersion);
        }
        sink.on_version(version)?;
        i3 += 2;
        Ok(i3)
    }

    fn parse_status_line(
        &self,
        data: &[u8],
        sink: &mut impl HeaderSink,
    ) -> Result<usize, ParseError> {
        let (version, mut i) = parse_version(data, 0).ok_or(ParseError::BadVersion)?;
        if data.get(i) != Some(&b' ') {
            return Err(ParseError::BadVersion);
        }
        sink.on_version(version)?;
        i += 1;

        if data.len() < i + 3
            || !is_digit(data[i])
            || !is_digit(data[i + 1])
            || !is_digit(data[i + 2])
        {
            return Err(ParseError::BadStatus);
        }
        let status = (data[i] - b'0') as u16 * 100
            + (data[i + 1] - b'0') as u16 * 10
            + (data[i + 2] - b'0') as u16;
        i += 3;
        if data.get(i) != Some(&b' ') {
            return Err(ParseError::BadStatus);
        }
        sink.on_status(status)?;
        i += 1;

        let start = i;
        while i < data.len() && data[i] != b'\r' {
            if !crate::classify::is_text_char(data[i]) {
                return Err(ParseError::BadReason);
            }
            i += 1;
        }
        if i == start || data.get(i) != Some(&b'\r') || data.get(i + 1) != Some(&b'\n') {
            return Err(ParseError::BadReason);
        }
        sink.on_reason(&data[start..i])?;
        i += 2;
        Ok(i)
    }

    fn parse_fields(
        &mut self,
        data: &[u8],
        i: usize,
        sink: &mut impl HeaderSink,
    ) -> Result<usize, ParseError> {
        let content_length = &mut self.content_length;
        let is_chunked = &mut self.is_chunked;
        let max_body_size = self.config.max_body_size;
        parse_field_lines(data, i, &self.config, &mut self.header_count, |name, value| {
            handle_framing_field(content_length, is_chunked, max_body_size, name, value)?;
            sink.on_field(name, value)
        })
    }
}

/// Interprets a recognized framing header (`Content-Length`,
/// `Transfer-Encoding`) as it is parsed, shared between header-block and
/// chunked-trailer field parsing.
fn handle_framing_field(
    content_length: &mut Option<u64>,
    is_chunked: &mut bool,
    max_body_size: usize,
    name: &[u8],
    value: &[u8],
) -> Result<(), ParseError> {
    if name.eq_ignore_ascii_case(b"content-length") {
        if *is_chunked {
            return Err(ParseError::BadContentLength);
        }
        if content_length.is_some() {
            return Err(ParseError::BadContentLength);
        }
        let v = parse_u64_decimal(value).ok_or(ParseError::BadContentLength)?;
        if v > max_body_size as u64 {
            return Err(ParseError::BodyTooLarge);
        }
        *content_length = Some(v);
        return Ok(());
    }

    if name.eq_ignore_ascii_case(b"transfer-encoding") {
        if content_length.is_some() {
            return Err(ParseError::BadTransferEncoding);
        }
        if *is_chunked {
            return Err(ParseError::BadTransferEncoding);
        }
        let mut any = false;
        let mut saw_chunked = false;
        for token in split_comma_list(value) {
            any = true;
            if saw_chunked {
                // chunked must be the last coding in the list
                return Err(ParseError::BadTransferEncoding);
            }
            if token.eq_ignore_ascii_case(b"chunked") {
                saw_chunked = true;
            }
        }
        if !any {
            return Err(ParseError::BadTransferEncoding);
        }
        if saw_chunked {
            *is_chunked = true;
        }
        return Ok(());
    }

    // Connection, Upgrade, Proxy-Connection: recognized, no fatal validation.
    Ok(())
}

/// Tokenizes zero or more field-lines followed by a terminating blank line,
/// starting at `i`. Shared verbatim between the header block (§4.1) and
/// chunked trailers (§4.2), which use identical field-line grammar.
/// Returns the index just past the terminating CRLF.
pub(crate) fn parse_field_lines(
    data: &[u8],
    mut i: usize,
    config: &ParserConfig,
    header_count: &mut usize,
    mut on_field: impl FnMut(&[u8], &[u8]) -> Result<(), ParseError>,
) -> Result<usize, ParseError> {
    loop {
        if data.get(i) == Some(&b'\r') {
            if data.get(i + 1) != Some(&b'\n') {
                return Err(ParseError::BadField);
            }
            return Ok(i + 2);
        }

        let (name, next) = take_token(data, i, is_tchar);
        if name.is_empty() || data.get(next) != Some(&b':') {
            return Err(ParseError::BadField);
        }
        if name.len() > config.max_header_name_len {
            return Err(ParseError::HeaderTooLarge);
        }
        i = next + 1;

        while matches!(data.get(i), Some(&b' ') | Some(&b'\t')) {
            i += 1;
        }
        let value_start = i;
        let mut value_end = i;
        loop {
            match data.get(i) {
                Some(&b'\r') => {
                    if data.get(i + 1) != Some(&b'\n') {
                        return Err(ParseError::BadValue);
                    }
                    // Obsolete line folding: CRLF followed by SP/HTAB.
                    if matches!(data.get(i + 2), Some(&b' ') | Some(&b'\t')) {
                        return Err(ParseError::BadValue);
                    }
                    i += 2;
                    break;
                }
                Some(&b) if is_value_char(b) => {
                    i += 1;
                    value_end = i;
                }
                Some(&b' ') | Some(&b'\t') => i += 1,
                _ => return Err(ParseError::BadValue),
            }
        }
        let value = &data[value_start..value_end];
        if value.len() > config.max_header_value_len {
            return Err(ParseError::HeaderTooLarge);
        }

        *header_count += 1;
        if *header_count > config.max_headers_count {
            return Err(ParseError::TooManyHeaders);
        }

        on_field(name, value)?;
    }
}

pub(crate) fn find_double_crlf(data: &[u8], from: usize) -> Option<usize> {
    if data.len() < 4 {
        return None;
    }
    let last_start = data.len() - 4;
    let mut i = from.min(last_start + 1);
    while i <= last_start {
        if &data[i..i + 4] == b"\r\n\r\n" {
            return Some(i + 4);
        }
        i += 1;
    }
    None
}

fn take_token(data: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> (&[u8], usize) {
    let mut i = start;
    while i < data.len() && pred(data[i]) {
        i += 1;
    }
    (&data[start..i], i)
}

/// Parses `HTTP/d.d` at `start`, returning `(10*major + minor, index after)`.
fn parse_version(data: &[u8], start: usize) -> Option<(u16, usize)> {
    const LIT: &[u8] = b"HTTP/";
    if data.len() < start + LIT.len() || &data[start..start + LIT.len()] != LIT {
        return None;
    }
    let mut i = start + LIT.len();
    let major = *data.get(i)?;
    if !is_digit(major) {
        return None;
    }
    i += 1;
    if data.get(i) != Some(&b'.') {
        return None;
    }
    i += 1;
    let minor = *data.get(i)?;
    if !is_digit(minor) {
        return None;
    }
    i += 1;
    Some((10 * (major - b'0') as u16 + (minor - b'0') as u16, i))
}

fn parse_u64_decimal(value: &[u8]) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    let mut v: u64 = 0;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        v = v.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    }
    Some(v)
}

fn split_comma_list(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value.split(|&b| b == b',').filter_map(|tok| {
        let trimmed = trim_ows(tok);
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn trim_ows(mut s: &[u8]) -> &[u8] {
    while matches!(s.first(), Some(&b' ') | Some(&b'\t')) {
        s = &s[1..];
    }
    while matches!(s.last(), Some(&b' ') | Some(&b'\t')) {
        s = &s[..s.len() - 1];
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collected {
        method: Vec<u8>,
        path: Vec<u8>,
        version: u16,
        status: u16,
        reason: Vec<u8>,
        fields: Vec<(Vec<u8>, Vec<u8>)>,
        header_called: bool,
    }

    impl HeaderSink for Collected {
        fn on_method(&mut self, m: &[u8]) -> Result<(), ParseError> {
            self.method = m.to_vec();
            Ok(())
        }
        fn on_path(&mut self, p: &[u8]) -> Result<(), ParseError> {
            self.path = p.to_vec();
            Ok(())
        }
        fn on_version(&mut self, v: u16) -> Result<(), ParseError> {
            self.version = v;
            Ok(())
        }
        fn on_status(&mut self, s: u16) -> Result<(), ParseError> {
            self.status = s;
            Ok(())
        }
        fn on_reason(&mut self, r: &[u8]) -> Result<(), ParseError> {
            self.reason = r.to_vec();
            Ok(())
        }
        fn on_field(&mut self, n: &[u8], v: &[u8]) -> Result<(), ParseError> {
            self.fields.push((n.to_vec(), v.to_vec()));
            Ok(())
        }
        fn on_header(&mut self) -> Result<(), ParseError> {
            self.header_called = true;
            Ok(())
        }
    }

    #[test]
    fn simple_get() {
        let mut p = HeaderParser::new(Direction::Request);
        let mut sink = Collected::default();
        let data = b"GET / HTTP/1.1\r\nUser-Agent: Beast\r\n\r\n";
        let (consumed, status) = p.write(data, &mut sink).unwrap();
        assert_eq!(status, HeaderStatus::HeaderComplete);
        assert_eq!(consumed, data.len());
        assert_eq!(sink.method, b"GET");
        assert_eq!(sink.path, b"/");
        assert_eq!(sink.version, 11);
        assert_eq!(sink.fields, vec![(b"User-Agent".to_vec(), b"Beast".to_vec())]);
        assert!(sink.header_called);
        assert!(matches!(p.take_framing(), Framing::ContentLength(0)));
    }

    #[test]
    fn response_status_line() {
        let mut p = HeaderParser::new(Direction::Response);
        let mut sink = Collected::default();
        let data = b"HTTP/1.0 200 OK\r\nServer: test\r\nContent-Length: 5\r\n\r\n";
        let (consumed, status) = p.write(data, &mut sink).unwrap();
        assert_eq!(status, HeaderStatus::HeaderComplete);
        assert_eq!(consumed, data.len());
        assert_eq!(sink.version, 10);
        assert_eq!(sink.status, 200);
        assert_eq!(sink.reason, b"OK");
        assert_eq!(p.take_framing(), Framing::ContentLength(5));
    }

    #[test]
    fn response_without_framing_reads_until_eof() {
        let mut p = HeaderParser::new(Direction::Response);
        let mut sink = Collected::default();
        let data = b"HTTP/1.0 200 OK\r\nServer: test\r\n\r\n";
        p.write(data, &mut sink).unwrap();
        assert!(matches!(p.take_framing(), Framing::UntilEof));
    }

    #[test]
    fn needs_more_before_double_crlf() {
        let mut p = HeaderParser::new(Direction::Request);
        let mut sink = Collected::default();
        let (consumed, status) = p.write(b"GET / HTTP/1.1\r\n", &mut sink).unwrap();
        assert_eq!(consumed, 0);
        assert_eq!(status, HeaderStatus::NeedMore);
    }

    #[test]
    fn byte_by_byte_matches_whole() {
        let whole = b"HTTP/1.0 200 OK\r\nServer: test\r\nTransfer-Encoding: chunked\r\n\r\n";
        let mut p = HeaderParser::new(Direction::Response);
        let mut sink = Collected::default();
        let mut buf = Vec::new();
        let mut status = HeaderStatus::NeedMore;
        for &b in whole {
            buf.push(b);
            let (consumed, st) = p.write(&buf, &mut sink).unwrap();
            status = st;
            if consumed > 0 {
                buf.drain(..consumed);
            }
            if status == HeaderStatus::HeaderComplete {
                break;
            }
        }
        assert_eq!(status, HeaderStatus::HeaderComplete);
        assert_eq!(sink.status, 200);
        assert!(matches!(p.take_framing(), Framing::Chunked));
    }

    #[test]
    fn bare_lf_is_rejected() {
        let mut p = HeaderParser::new(Direction::Request);
        let mut sink = Collected::default();
        let err = p.write(b"GET / HTTP/1.1\nHost: x\r\n\r\n", &mut sink);
        assert!(err.is_err());
    }

    #[test]
    fn conflicting_framing_is_rejected() {
        let mut p = HeaderParser::new(Direction::Request);
        let mut sink = Collected::default();
        let data = b"POST / HTTP/1.1\r\nContent-Length: 5\r\nTransfer-Encoding: chunked\r\n\r\n";
        let err = p.write(data, &mut sink).unwrap_err();
        assert_eq!(err, ParseError::BadTransferEncoding);
    }

    #[test]
    fn value_ows_is_trimmed() {
        let mut p = HeaderParser::new(Direction::Request);
        let mut sink = Collected::default();
        let data = b"GET / HTTP/1.1\r\nX: \t x \t \r\n\r\n";
        p.write(data, &mut sink).unwrap();
        assert_eq!(sink.fields[0].1, b"x");
    }

    #[test]
    fn obsolete_folding_is_rejected() {
        let mut p = HeaderParser::new(Direction::Request);
        let mut sink = Collected::default();
        let data = b"GET / HTTP/1.1\r\nX-Long: a\r\n b\r\n\r\n";
        let err = p.write(data, &mut sink).unwrap_err();
        assert_eq!(err, ParseError::BadValue);
    }
}

//! Reference collaborator (ambient scaffolding, not part of the core's
//! contract — see §6, §10): buffers a complete request or response into
//! owned data by implementing [`HeaderSink`] and [`BodySink`].

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::ParseError;
use crate::sink::{BodySink, HeaderSink};
use crate::types::Header;

/// The HTTP request method. `Extension` covers any token outside the
/// standard set — the wire grammar (§4.1) accepts any token character
/// sequence, not just the nine RFC 9110 methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    Extension(String),
}

impl HttpMethod {
    fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            b"GET" => Self::Get,
            b"HEAD" => Self::Head,
            b"POST" => Self::Post,
            b"PUT" => Self::Put,
            b"DELETE" => Self::Delete,
            b"CONNECT" => Self::Connect,
            b"OPTIONS" => Self::Options,
            b"TRACE" => Self::Trace,
            b"PATCH" => Self::Patch,
            _ => Self::Extension(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Patch => "PATCH",
            Self::Extension(s) => s.as_str(),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `10*major + minor`, as surfaced by [`HeaderSink::on_version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpVersion(pub u16);

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for HttpVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Serialize body bytes as a UTF-8 string (lossy) for JSON output.
fn serialize_body<S: Serializer>(body: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match body {
        None => s.serialize_none(),
        Some(bytes) => s.serialize_str(&String::from_utf8_lossy(bytes)),
    }
}

/// A fully parsed HTTP request.
#[derive(Debug, Clone, Serialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub version: HttpVersion,
    pub headers: Vec<Header>,
    #[serde(serialize_with = "serialize_body")]
    pub body: Option<Vec<u8>>,
}

/// A fully parsed HTTP response.
#[derive(Debug, Clone, Serialize)]
pub struct HttpResponse {
    pub version: HttpVersion,
    pub status: u16,
    pub reason: String,
    pub headers: Vec<Header>,
    #[serde(serialize_with = "serialize_body")]
    pub body: Option<Vec<u8>>,
}

macro_rules! header_accessors {
    () => {
        /// Look up the first header value by name (case-insensitive).
        pub fn header_value(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        }

        /// Return all values for headers matching `name` (case-insensitive).
        pub fn header_values(&self, name: &str) -> Vec<&str> {
            self.headers
                .iter()
                .filter(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
                .collect()
        }

        /// Return the body as a UTF-8 `&str` if it is valid UTF-8.
        pub fn body_as_str(&self) -> Option<&str> {
            self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
        }

        /// Return the raw body bytes.
        pub fn body_bytes(&self) -> Option<&[u8]> {
            self.body.as_deref()
        }
    };
}

impl HttpRequest {
    header_accessors!();
}

impl HttpResponse {
    header_accessors!();
}

/// Accumulates callbacks for one message (request or response) into owned
/// buffers, regardless of direction; [`RequestCollector`]/
/// [`ResponseCollector`] wrap this with the direction-specific output type.
#[derive(Default)]
struct Accumulator {
    method: Option<HttpMethod>,
    uri: Option<String>,
    version: Option<u16>,
    status: Option<u16>,
    reason: Option<String>,
    headers: Vec<Header>,
    body: Vec<u8>,
    body_prepared: usize,
    body_seen: bool,
}

impl HeaderSink for Accumulator {
    fn on_version(&mut self, version: u16) -> Result<(), ParseError> {
        self.version = Some(version);
        Ok(())
    }

    fn on_method(&mut self, method: &[u8]) -> Result<(), ParseError> {
        self.method = Some(HttpMethod::from_bytes(method));
        Ok(())
    }

    fn on_path(&mut self, path: &[u8]) -> Result<(), ParseError> {
        self.uri = Some(String::from_utf8_lossy(path).into_owned());
        Ok(())
    }

    fn on_status(&mut self, status: u16) -> Result<(), ParseError> {
        self.status = Some(status);
        Ok(())
    }

    fn on_reason(&mut self, reason: &[u8]) -> Result<(), ParseError> {
        self.reason = Some(String::from_utf8_lossy(reason).into_owned());
        Ok(())
    }

    fn on_field(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError> {
        self.headers.push(Header::new(
            String::from_utf8_lossy(name).into_owned(),
            String::from_utf8_lossy(value).into_owned(),
        ));
        Ok(())
    }
}

impl BodySink for Accumulator {
    fn prepare(&mut self, n: usize) -> &mut [u8] {
        let start = self.body.len();
        self.body.resize(start + n, 0);
        self.body_prepared = n;
        &mut self.body[start..start + n]
    }

    fn commit(&mut self, k: usize) {
        let current = self.body.len();
        self.body.truncate(current - (self.body_prepared - k));
    }

    fn finish(&mut self) {
        self.body_seen = true;
    }
}

impl Accumulator {
    fn take_body(&mut self) -> Option<Vec<u8>> {
        if self.body_seen {
            Some(std::mem::take(&mut self.body))
        } else {
            None
        }
    }
}

/// Reference [`HeaderSink`]/[`BodySink`] implementation that buffers a
/// request into an owned [`HttpRequest`].
#[derive(Default)]
pub struct RequestCollector(Accumulator);

impl HeaderSink for RequestCollector {
    fn on_version(&mut self, v: u16) -> Result<(), ParseError> {
        self.0.on_version(v)
    }
    fn on_method(&mut self, m: &[u8]) -> Result<(), ParseError> {
        self.0.on_method(m)
    }
    fn on_path(&mut self, p: &[u8]) -> Result<(), ParseError> {
        self.0.on_path(p)
    }
    fn on_field(&mut self, n: &[u8], v: &[u8]) -> Result<(), ParseError> {
        self.0.on_field(n, v)
    }
}

impl BodySink for RequestCollector {
    fn prepare(&mut self, n: usize) -> &mut [u8] {
        self.0.prepare(n)
    }
    fn commit(&mut self, k: usize) {
        self.0.commit(k)
    }
    fn finish(&mut self) {
        self.0.finish()
    }
}

impl RequestCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the collector, producing the finished request.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if called before the header block completed.
    pub fn into_request(mut self) -> Result<HttpRequest, ParseError> {
        Ok(HttpRequest {
            method: self.0.method.take().ok_or(ParseError::BadMethod)?,
            uri: self.0.uri.take().ok_or(ParseError::BadPath)?,
            version: HttpVersion(self.0.version.ok_or(ParseError::BadVersion)?),
            headers: std::mem::take(&mut self.0.headers),
            body: self.0.take_body(),
        })
    }
}

/// Reference [`HeaderSink`]/[`BodySink`] implementation that buffers a
/// response into an owned [`HttpResponse`].
#[derive(Default)]
pub struct ResponseCollector(Accumulator);

impl HeaderSink for ResponseCollector {
    fn on_version(&mut self, v: u16) -> Result<(), ParseError> {
        self.0.on_version(v)
    }
    fn on_status(&mut self, s: u16) -> Result<(), ParseError> {
        self.0.on_status(s)
    }
    fn on_reason(&mut self, r: &[u8]) -> Result<(), ParseError> {
        self.0.on_reason(r)
    }
    fn on_field(&mut self, n: &[u8], v: &[u8]) -> Result<(), ParseError> {
        self.0.on_field(n, v)
    }
}

impl BodySink for ResponseCollector {
    fn prepare(&mut self, n: usize) -> &mut [u8] {
        self.0.prepare(n)
    }
    fn commit(&mut self, k: usize) {
        self.0.commit(k)
    }
    fn finish(&mut self) {
        self.0.finish()
    }
}

impl ResponseCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the collector, producing the finished response.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if called before the header block completed.
    pub fn into_response(mut self) -> Result<HttpResponse, ParseError> {
        Ok(HttpResponse {
            version: HttpVersion(self.0.version.ok_or(ParseError::BadVersion)?),
            status: self.0.status.take().ok_or(ParseError::BadStatus)?,
            reason: self.0.reason.take().ok_or(ParseError::BadReason)?,
            headers: std::mem::take(&mut self.0.headers),
            body: self.0.take_body(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageParser;
    use crate::types::Direction;

    #[test]
    fn collects_a_simple_request() {
        let mut parser = MessageParser::new(Direction::Request);
        let mut collector = RequestCollector::new();
        let data = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
        parser.write(data, &mut collector).unwrap();
        let request = collector.into_request().unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.uri, "/hello");
        assert_eq!(request.version, HttpVersion(11));
        assert_eq!(request.header_value("host"), Some("example.com"));
        assert_eq!(request.body_as_str(), Some(""));
    }

    #[test]
    fn collects_a_response_with_body() {
        let mut parser = MessageParser::new(Direction::Response);
        let mut collector = ResponseCollector::new();
        let data = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi";
        parser.write(data, &mut collector).unwrap();
        let response = collector.into_response().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.reason, "OK");
        assert_eq!(response.body_as_str(), Some("hi"));
    }

    #[test]
    fn extension_method_is_preserved() {
        let mut parser = MessageParser::new(Direction::Request);
        let mut collector = RequestCollector::new();
        let data = b"PROPFIND / HTTP/1.1\r\n\r\n";
        parser.write(data, &mut collector).unwrap();
        let request = collector.into_request().unwrap();
        assert_eq!(request.method, HttpMethod::Extension("PROPFIND".into()));
        assert_eq!(request.method.as_str(), "PROPFIND");
    }
}

use std::fmt;

/// Terminal parser errors (RFC 7230 grammar/framing violations), plus the
/// configured-limit violations from [`crate::header::ParserConfig`].
///
/// `need-more` from §7 of the design is not a member of this enum: it is a
/// control-flow signal folded into [`crate::header::HeaderStatus`] and
/// [`crate::body::BodyStatus`], never surfaced as a terminal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The request method is not a valid token.
    BadMethod,
    /// The request-target is empty or contains a disallowed byte.
    BadPath,
    /// The HTTP-version is not `HTTP/d.d`.
    BadVersion,
    /// The status-code is not exactly three decimal digits.
    BadStatus,
    /// The reason-phrase is empty or contains a disallowed byte.
    BadReason,
    /// A header (or trailer) field name is empty or not a valid token.
    BadField,
    /// A header (or trailer) field value contains a disallowed byte, or
    /// obsolete line folding was encountered.
    BadValue,
    /// `Content-Length` failed to parse, overflowed `u64`, conflicted with a
    /// prior differing `Content-Length`, or co-occurred with chunked framing.
    BadContentLength,
    /// `Transfer-Encoding` named `chunked` somewhere other than last, or
    /// co-occurred with `Content-Length`.
    BadTransferEncoding,
    /// A chunk-size line was not valid hex, overflowed, or missing its CRLF.
    BadChunkSize,
    /// A chunk extension was malformed.
    BadChunkExtension,
    /// Chunk data was not followed by the required CRLF.
    BadChunkData,
    /// End of input arrived before a content-length or chunked body finished.
    ShortRead,
    /// A header name, value, method, or request-target exceeded a configured
    /// length limit.
    HeaderTooLarge,
    /// The declared or accumulated body size exceeded `max_body_size`.
    BodyTooLarge,
    /// The number of header fields exceeded `max_headers_count`.
    TooManyHeaders,
}

impl ParseError {
    /// A short, stable machine-readable identifier, matching §7 of the design.
    pub fn code(self) -> &'static str {
        match self {
            Self::BadMethod => "bad-method",
            Self::BadPath => "bad-path",
            Self::BadVersion => "bad-version",
            Self::BadStatus => "bad-status",
            Self::BadReason => "bad-reason",
            Self::BadField => "bad-field",
            Self::BadValue => "bad-value",
            Self::BadContentLength => "bad-content-length",
            Self::BadTransferEncoding => "bad-transfer-encoding",
            Self::BadChunkSize => "bad-chunk-size",
            Self::BadChunkExtension => "bad-chunk-extension",
            Self::BadChunkData => "bad-chunk-data",
            Self::ShortRead => "short-read",
            Self::HeaderTooLarge => "header-too-large",
            Self::BodyTooLarge => "body-too-large",
            Self::TooManyHeaders => "too-many-headers",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMethod => write!(f, "invalid HTTP method"),
            Self::BadPath => write!(f, "invalid request-target"),
            Self::BadVersion => write!(f, "invalid HTTP version"),
            Self::BadStatus => write!(f, "invalid status code"),
            Self::BadReason => write!(f, "invalid reason phrase"),
            Self::BadField => write!(f, "invalid header field name"),
            Self::BadValue => write!(f, "invalid header field value"),
            Self::BadContentLength => write!(f, "invalid or conflicting Content-Length"),
            Self::BadTransferEncoding => write!(f, "invalid or conflicting Transfer-Encoding"),
            Self::BadChunkSize => write!(f, "invalid chunk size"),
            Self::BadChunkExtension => write!(f, "invalid chunk extension"),
            Self::BadChunkData => write!(f, "chunk data missing trailing CRLF"),
            Self::ShortRead => write!(f, "unexpected end of message"),
            Self::HeaderTooLarge => write!(f, "header exceeds maximum allowed size"),
            Self::BodyTooLarge => write!(f, "body exceeds maximum allowed size"),
            Self::TooManyHeaders => write!(f, "number of headers exceeds maximum"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors surfaced by the read-loop driver (§4.5): a superset of
/// [`ParseError`] that also accounts for I/O failure and the driver's own
/// buffer-growth policy.
#[derive(Debug)]
pub enum DriverError {
    /// The parser rejected the message; see the wrapped [`ParseError`].
    Parse(ParseError),
    /// The underlying source failed.
    Io(std::io::Error),
    /// The driver's buffer could not grow to satisfy a `prepare` request
    /// (capacity limit reached, or the allocation itself failed).
    BufferOverflow,
}

impl From<ParseError> for DriverError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::BufferOverflow => write!(f, "parse buffer exceeded its capacity limit"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::BufferOverflow => None,
        }
    }
}

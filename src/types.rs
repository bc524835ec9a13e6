use serde::Serialize;

/// Which start-line grammar a [`crate::header::HeaderParser`] applies:
/// `Method SP target SP version` for requests, `version SP status SP reason`
/// for responses. Both directions share field-line tokenization verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Response,
}

/// A single header (or chunked-trailer) field, in the casing and order it
/// was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Field name, original casing preserved.
    pub name: String,
    /// Field value, with leading/trailing OWS trimmed.
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

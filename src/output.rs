//! Output formatting for the demonstration collector types (§10 ambient
//! scaffolding, not part of the core's contract).

use serde::Serialize;

use crate::collector::{HttpRequest, HttpResponse};
use crate::types::Header;

/// Serialize any `Serialize` value (an [`HttpRequest`] or [`HttpResponse`])
/// to a JSON string. When `pretty` is `true` the output is indented.
pub fn format_json<T: Serialize>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    } else {
        serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

fn format_headers_and_body(out: &mut String, headers: &[Header], body: Option<&[u8]>) {
    out.push_str(&format!("\n--- Headers ({}) ---\n", headers.len()));
    for header in headers {
        out.push_str(&format!("  {}: {}\n", header.name, header.value));
    }

    match body {
        Some(body) => {
            out.push_str(&format!("\n--- Body ({} bytes) ---\n", body.len()));
            match std::str::from_utf8(body) {
                Ok(s) => out.push_str(s),
                Err(_) => out.push_str(&format!("<binary data: {} bytes>", body.len())),
            }
            out.push('\n');
        }
        None => out.push_str("\n--- No Body ---\n"),
    }
}

/// Render an [`HttpRequest`] in a human-readable debug format.
pub fn format_request_debug(request: &HttpRequest) -> String {
    let mut out = String::with_capacity(256);
    out.push_str("=== HTTP Request ===\n");
    out.push_str(&format!("Method:  {}\n", request.method));
    out.push_str(&format!("URI:     {}\n", request.uri));
    out.push_str(&format!("Version: {}\n", request.version));
    format_headers_and_body(&mut out, &request.headers, request.body.as_deref());
    out.push_str("====================\n");
    out
}

/// Render an [`HttpResponse`] in a human-readable debug format.
pub fn format_response_debug(response: &HttpResponse) -> String {
    let mut out = String::with_capacity(256);
    out.push_str("=== HTTP Response ===\n");
    out.push_str(&format!("Version: {}\n", response.version));
    out.push_str(&format!("Status:  {}\n", response.status));
    out.push_str(&format!("Reason:  {}\n", response.reason));
    format_headers_and_body(&mut out, &response.headers, response.body.as_deref());
    out.push_str("=====================\n");
    out
}

/// Render only the request line and headers (no body).
pub fn format_request_headers_only(request: &HttpRequest) -> String {
    let mut out = String::with_capacity(64 + request.headers.len() * 40);
    out.push_str(&format!(
        "{} {} {}\n",
        request.method, request.uri, request.version
    ));
    for header in &request.headers {
        out.push_str(&format!("{}: {}\n", header.name, header.value));
    }
    out
}

/// Render only the status line and headers (no body).
pub fn format_response_headers_only(response: &HttpResponse) -> String {
    let mut out = String::with_capacity(64 + response.headers.len() * 40);
    out.push_str(&format!(
        "{} {} {}\n",
        response.version, response.status, response.reason
    ));
    for header in &response.headers {
        out.push_str(&format!("{}: {}\n", header.name, header.value));
    }
    out
}

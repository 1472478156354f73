// src/server/inject.rs

//! Adds the live-reload client to served HTML pages.

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::CLIENT_PATH;

/// Insert the client `<script>` before the last `</body>`, or append it when
/// the document has none.
pub fn inject_script_tag(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_PATH}"></script>"#);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..at]);
            out.push_str(&tag);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

/// Pages larger than this are served without the client.
pub const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

fn declared_length(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Response middleware: rewrite successful `text/html` bodies. Oversized
/// pages and bodies that are not UTF-8 pass through untouched.
pub async fn inject_client(response: Response) -> Response {
    if response.status() != StatusCode::OK || !is_html(&response) {
        return response;
    }
    if declared_length(&response).is_some_and(|len| len > MAX_INJECT_BYTES) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to buffer html response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = match std::str::from_utf8(&bytes) {
        Ok(text) => inject_script_tag(text),
        Err(_) => {
            debug!("html response is not utf-8; serving without live reload");
            return Response::from_parts(parts, Body::from(bytes));
        }
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

//! CloudEvents HTTP binary-mode binding: attributes in `ce-*` headers, payload in the body.

use crate::error::{EventError, Result};
use crate::models::Event;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use chrono::DateTime;
use serde_json::Value;

const HEADER_PREFIX: &str = "ce-";

/// Headers mapped to attributes rather than extensions.
const ATTRIBUTE_HEADERS: [&str; 6] = [
    "ce-id",
    "ce-source",
    "ce-type",
    "ce-specversion",
    "ce-time",
    "ce-schemaurl",
];

/// Distributed-tracing headers carried as extensions without a `ce-` prefix.
const TRACING_HEADERS: [&str; 2] = ["traceparent", "tracestate"];

/// Event field names an extension may not shadow in the flat listing form.
const RESERVED_NAMES: [&str; 8] = [
    "id",
    "source",
    "type",
    "specversion",
    "time",
    "contenttype",
    "schemaurl",
    "data",
];

const JSON_MEDIA_TYPE: &str = "application/json";

/// Whether a request should be stored: `content-type` absent or `application/json`.
///
/// Parameters such as `charset` are ignored and the media type is compared
/// case-insensitively.
pub fn accepts_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return true;
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

/// Build an [`Event`] from a binary-mode request.
pub fn from_binary_request(headers: &HeaderMap, body: &[u8]) -> Result<Event> {
    let mut event = Event::new(
        required(headers, "ce-id")?,
        required(headers, "ce-source")?,
        required(headers, "ce-type")?,
    )
    .with_spec_version(required(headers, "ce-specversion")?);

    if let Some(time) = optional(headers, "ce-time")? {
        let time = DateTime::parse_from_rfc3339(&time)
            .map_err(|e| EventError::invalid(format!("invalid ce-time '{}': {}", time, e)))?;
        event = event.with_time(time);
    }
    if let Some(schemaurl) = optional(headers, "ce-schemaurl")? {
        event = event.with_schemaurl(schemaurl);
    }
    if let Some(contenttype) = optional(headers, CONTENT_TYPE.as_str())? {
        event = event.with_contenttype(contenttype);
    }

    for (name, value) in headers {
        let name = name.as_str();
        let extension = match name.strip_prefix(HEADER_PREFIX) {
            Some(_) if ATTRIBUTE_HEADERS.contains(&name) => continue,
            Some(stripped) => stripped,
            None if TRACING_HEADERS.contains(&name) => name,
            None => continue,
        };
        if RESERVED_NAMES.contains(&extension) {
            return Err(EventError::invalid(format!(
                "header {} collides with the {} attribute",
                name, extension
            )));
        }
        let value = value
            .to_str()
            .map_err(|_| EventError::invalid(format!("header {} is not valid text", name)))?;
        event = event.with_extension(extension, value);
    }

    if let Some(data) = decode_body(body)? {
        event = event.with_data(data);
    }

    Ok(event)
}

fn optional(headers: &HeaderMap, name: &str) -> Result<Option<String>> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::to_string)
                .map_err(|_| EventError::invalid(format!("header {} is not valid text", name)))
        })
        .transpose()
}

fn required(headers: &HeaderMap, name: &str) -> Result<String> {
    optional(headers, name)?
        .ok_or_else(|| EventError::invalid(format!("missing required attribute {}", name)))
}

fn decode_body(body: &[u8]) -> Result<Option<serde_json::Map<String, Value>>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match serde_json::from_slice(body)? {
        Value::Object(map) => Ok(Some(map)),
        other => Err(EventError::invalid(format!(
            "event data must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

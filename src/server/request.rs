use std::collections::HashMap;

use axum::body::{self, Body};
use axum::http::{HeaderMap, Request};
use serde_json::{Map, Value};

/// Requests larger than this are treated as having no body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Canonical form of an inbound request, as seen by resource handlers.
#[derive(Debug)]
pub struct RequestData {
    /// Path with leading and trailing slashes stripped.
    pub path: String,
    /// Method case-folded to lowercase.
    pub method: String,
    /// Query parameters; a repeated key resolves to its last occurrence.
    pub query: HashMap<String, String>,
    /// Headers as received.
    pub headers: HeaderMap,
    /// Parsed JSON body. Always an object: a malformed, empty or non-object
    /// body becomes `{}` rather than failing the request.
    pub payload: Value,
}

impl RequestData {
    pub async fn from_request(req: Request<Body>) -> Self {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().trim_matches('/').to_string();
        let method = parts.method.as_str().to_lowercase();
        let query = parse_query(parts.uri.query().unwrap_or(""));
        let bytes = body::to_bytes(body, MAX_BODY_BYTES).await.unwrap_or_default();
        let payload = parse_json_object(&bytes);

        Self {
            path,
            method,
            query,
            headers: parts.headers,
            payload,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Trimmed, non-empty string field from the payload.
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Boolean payload field; anything that is not a JSON `true` is false.
    pub fn payload_bool(&self, field: &str) -> bool {
        self.payload
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    // Collecting into a map makes later occurrences of a key win
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn parse_json_object(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => Value::Object(Map::new()),
    }
}

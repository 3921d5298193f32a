use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

/// Response encoding discriminator selected by a handler. The encoder never
/// infers the kind from the payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    #[default]
    Json,
    Html,
    Favicon,
    Css,
    Png,
    Jpg,
    Plain,
}

impl ContentKind {
    pub fn mime(self) -> &'static str {
        match self {
            ContentKind::Json => "application/json",
            ContentKind::Html => "text/html",
            ContentKind::Favicon => "image/x-icon",
            ContentKind::Css => "text/css",
            ContentKind::Png => "image/png",
            ContentKind::Jpg => "image/jpeg",
            ContentKind::Plain => "text/plain",
        }
    }
}

/// What a handler completes with: a status code, a payload and the content
/// kind the payload should be encoded as.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub kind: ContentKind,
    pub body: ReplyBody,
}

#[derive(Debug)]
pub enum ReplyBody {
    Json(Value),
    Raw(Vec<u8>),
}

impl Reply {
    pub fn json(status: u16, payload: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
            kind: ContentKind::Json,
            body: ReplyBody::Json(payload),
        }
    }

    /// 200 with a JSON payload.
    pub fn ok(payload: Value) -> Self {
        Self::json(200, payload)
    }

    /// Bare status; encodes as an empty JSON object.
    pub fn status(status: u16) -> Self {
        Self::json(status, Value::Null)
    }

    pub fn raw(status: u16, kind: ContentKind, bytes: Vec<u8>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
            kind,
            body: ReplyBody::Raw(bytes),
        }
    }
}

/// Encode a reply into a wire response. For `json`, a non-object payload is
/// replaced by an empty object before serialization; every other kind passes
/// its bytes through verbatim. Exactly one `Content-Type` header is set,
/// chosen from the kind alone.
pub fn encode(reply: Reply) -> Response {
    let bytes = match (reply.kind, reply.body) {
        (ContentKind::Json, ReplyBody::Json(Value::Object(map))) => serialize_object(map),
        (ContentKind::Json, ReplyBody::Json(_)) => serialize_object(Map::new()),
        (_, ReplyBody::Raw(bytes)) => bytes,
        // A JSON payload under a non-JSON kind is passed through as-is
        (_, ReplyBody::Json(value)) => value.to_string().into_bytes(),
    };

    (
        reply.status,
        [(header::CONTENT_TYPE, reply.kind.mime())],
        bytes,
    )
        .into_response()
}

fn serialize_object(map: Map<String, Value>) -> Vec<u8> {
    serde_json::to_vec(&Value::Object(map)).unwrap_or_else(|_| b"{}".to_vec())
}

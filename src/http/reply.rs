//! Handler results and their coercion into responses.
//!
//! A handler returns anything convertible into [`Reply`]; the connection loop
//! turns the reply into a [`Response`]:
//!
//! | Reply              | Body                               |
//! |--------------------|------------------------------------|
//! | `()` / `None`      | empty, `text/plain`                |
//! | `Vec<u8>`          | bytes, `text/plain`                |
//! | `String` / `&str`  | UTF-8 text, `text/html`            |
//! | `serde_json::Value`| JSON, `application/json`           |
//! | [`Body`]           | passed through (e.g. chunked file) |
//! | [`Response`]       | passed through                     |

use serde::Serialize;

use crate::http::body::Body;
use crate::http::response::Response;

/// The value produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Empty,
    Bytes(Vec<u8>),
    Text(String),
    Json(serde_json::Value),
    Body(Body),
    Response(Response),
}

impl Reply {
    /// Serialize any value as a JSON reply.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Reply::Json)
    }

    /// Coerce into a body. A full response yields its body only.
    pub fn into_body(self) -> Body {
        match self {
            Reply::Empty => Body::empty(),
            Reply::Bytes(data) => Body::bytes(data),
            Reply::Text(text) => Body::text(text),
            // Encoding a `Value` cannot fail: its map keys are always strings.
            Reply::Json(value) => Body::json(&value).unwrap_or_default(),
            Reply::Body(body) => body,
            Reply::Response(response) => response.body().clone(),
        }
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}

impl<T: Into<Reply>> From<Option<T>> for Reply {
    fn from(value: Option<T>) -> Self {
        value.map_or(Reply::Empty, Into::into)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(data: Vec<u8>) -> Self {
        Reply::Bytes(data)
    }
}

impl From<&'static [u8]> for Reply {
    fn from(data: &'static [u8]) -> Self {
        Reply::Bytes(data.to_vec())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        Reply::Json(value)
    }
}

impl From<Body> for Reply {
    fn from(body: Body) -> Self {
        Reply::Body(body)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

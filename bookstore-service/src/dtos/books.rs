use mongodb::bson::{Bson, Document};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Render a stored book as JSON. `_id` becomes its 24-hex string and every
/// other field passes through.
pub fn serialize_book(document: Document) -> Value {
    bson_to_json(Bson::Document(document))
}

/// Plain JSON view of a BSON value.
///
/// ObjectIds render as hex strings and datetimes as HTTP-dates
/// (`Fri, 01 Mar 2024 12:30:00 GMT`). Non-finite doubles become `null`.
/// Types with no natural JSON form fall back to relaxed extended JSON.
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().format(HTTP_DATE_FORMAT).to_string()),
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Null => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            database: Some("connected"),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            database: None,
            error: Some(error.into()),
        }
    }
}

/// Static body of `GET /`.
#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

impl ApiInfo {
    pub fn new() -> Self {
        Self {
            message: "Bookstore API",
            version: env!("CARGO_PKG_VERSION"),
            endpoints: BTreeMap::from([
                ("health", "/health"),
                ("list_books", "GET /books"),
                ("create_book", "POST /books"),
                ("get_book", "GET /books/<id>"),
                ("update_book", "PUT /books/<id>"),
                ("delete_book", "DELETE /books/<id>"),
            ]),
        }
    }
}

impl Default for ApiInfo {
    fn default() -> Self {
        Self::new()
    }
}

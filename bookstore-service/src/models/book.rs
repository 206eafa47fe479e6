use chrono::{DateTime, Utc};
use mongodb::bson::{self, Document};
use serde_json::{Map, Value};
use service_core::error::AppError;

/// Fields a create request must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 3] = ["title", "author", "isbn"];

/// Stored `stock` when the request omits it.
pub const DEFAULT_STOCK: i64 = 0;

/// A book as accepted by `POST /books`, before the store assigns `_id`.
///
/// Field values are kept exactly as the client sent them: no coercion and
/// no range checks. Only the model fields are retained; any other keys in
/// the request body are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: Value,
    pub author: Value,
    pub isbn: Value,
    pub price: Value,
    pub stock: Value,
    pub description: Value,
}

impl NewBook {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, AppError> {
        if let Some(missing) = REQUIRED_FIELDS
            .iter()
            .find(|field| !payload.contains_key(**field))
        {
            return Err(AppError::bad_request(format!(
                "Missing required field: {}",
                missing
            )));
        }

        let optional = |key: &str| payload.get(key).cloned().unwrap_or(Value::Null);
        let stock = payload
            .get("stock")
            .cloned()
            .unwrap_or_else(|| Value::from(DEFAULT_STOCK));

        Ok(Self {
            title: payload["title"].clone(),
            author: payload["author"].clone(),
            isbn: payload["isbn"].clone(),
            price: optional("price"),
            stock,
            description: optional("description"),
        })
    }

    /// Build the stored document, stamping `created_at`.
    pub fn into_document(self, created_at: DateTime<Utc>) -> Result<Document, AppError> {
        let mut document = Document::new();
        for (key, value) in [
            ("title", self.title),
            ("author", self.author),
            ("isbn", self.isbn),
            ("price", self.price),
            ("stock", self.stock),
            ("description", self.description),
        ] {
            document.insert(key, to_bson(key, &value)?);
        }
        document.insert("created_at", bson::DateTime::from_chrono(created_at));
        Ok(document)
    }
}

/// The `$set` payload of `PUT /books/:id`: every body key except `_id`.
///
/// This is a permissive merge; `created_at` and unknown keys are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookUpdate {
    fields: Document,
}

impl BookUpdate {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, AppError> {
        let mut fields = Document::new();
        for (key, value) in payload.iter().filter(|(key, _)| key.as_str() != "_id") {
            fields.insert(key.as_str(), to_bson(key, value)?);
        }
        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn into_fields(self) -> Document {
        self.fields
    }
}

pub(crate) fn to_bson(key: &str, value: &Value) -> Result<bson::Bson, AppError> {
    bson::to_bson(value)
        .map_err(|e| AppError::bad_request(format!("Invalid value for field '{}': {}", key, e)))
}

use crate::services::store::{BookStore, UpdateOutcome};
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use service_core::error::AppError;
use tokio::sync::RwLock;

/// Process-local books collection with the same observable semantics as
/// the MongoDB store: insertion order, `$set` merges, and a modified count
/// of zero when nothing changed.
#[derive(Default)]
pub struct InMemoryBookStore {
    books: RwLock<Vec<Document>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

fn has_id(book: &Document, id: &ObjectId) -> bool {
    matches!(book.get("_id"), Some(Bson::ObjectId(stored)) if stored == id)
}

/// Byte-level equality as the server judges a `$set` no-op: subdocument
/// field order and numeric type both matter.
fn same_bson(stored: &Bson, incoming: &Bson) -> bool {
    match (stored, incoming) {
        (Bson::Document(a), Bson::Document(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && same_bson(va, vb))
        }
        (Bson::Array(a), Bson::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| same_bson(x, y))
        }
        _ => stored == incoming,
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        Ok(self.books.read().await.clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError> {
        Ok(self
            .books
            .read()
            .await
            .iter()
            .find(|book| has_id(book, &id))
            .cloned())
    }

    async fn insert(&self, book: Document) -> Result<ObjectId, AppError> {
        let id = book.get_object_id("_id").unwrap_or_else(|_| ObjectId::new());

        let mut books = self.books.write().await;
        if books.iter().any(|existing| has_id(existing, &id)) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "duplicate key error: _id {}",
                id
            )));
        }

        let mut stored = Document::new();
        stored.insert("_id", id);
        for (key, value) in book {
            if key != "_id" {
                stored.insert(key, value);
            }
        }
        books.push(stored);

        Ok(id)
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let mut books = self.books.write().await;
        let Some(book) = books.iter_mut().find(|book| has_id(book, &id)) else {
            return Ok(UpdateOutcome::default());
        };

        let mut changed = false;
        for (key, value) in fields {
            if !book.get(&key).is_some_and(|stored| same_bson(stored, &value)) {
                book.insert(key, value);
                changed = true;
            }
        }

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(changed),
        })
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<u64, AppError> {
        let mut books = self.books.write().await;
        match books.iter().position(|book| has_id(book, &id)) {
            Some(index) => {
                books.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

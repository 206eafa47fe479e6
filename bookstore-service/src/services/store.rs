use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use service_core::error::AppError;

/// Result of a field-level merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    /// Zero when every `$set` value already equalled the stored value.
    pub modified: u64,
}

/// Access to the books collection, keyed by ObjectId.
///
/// Implementations report failures as `AppError::DatabaseError`; the HTTP
/// layer decides which status each operation maps them to.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every book in store-native order.
    async fn find_all(&self) -> Result<Vec<Document>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError>;

    /// Insert and return the identifier the store assigned.
    async fn insert(&self, book: Document) -> Result<ObjectId, AppError>;

    /// Apply `fields` as a `$set` merge.
    async fn update_fields(&self, id: ObjectId, fields: Document)
        -> Result<UpdateOutcome, AppError>;

    /// Number of documents removed (0 or 1).
    async fn delete_by_id(&self, id: ObjectId) -> Result<u64, AppError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), AppError>;
}

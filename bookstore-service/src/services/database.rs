use crate::config::MongoConfig;
use crate::services::store::{BookStore, UpdateOutcome};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Client as MongoClient, Collection, Database,
};
use service_core::error::AppError;
use tokio::sync::OnceCell;

/// MongoDB-backed books collection.
///
/// The client is created on first use and shared for the life of the
/// process. A failed initialisation is not cached, so the next request
/// retries it.
pub struct MongoDb {
    uri: String,
    database_name: String,
    collection_name: String,
    database: OnceCell<Database>,
}

impl MongoDb {
    pub fn new(config: &MongoConfig) -> Self {
        Self {
            uri: config.uri.clone(),
            database_name: config.database.clone(),
            collection_name: config.collection.clone(),
            database: OnceCell::new(),
        }
    }

    pub async fn database(&self) -> Result<&Database, AppError> {
        self.database
            .get_or_try_init(|| async {
                tracing::info!(database = %self.database_name, "Connecting to MongoDB");
                let client = MongoClient::with_uri_str(&self.uri).await.map_err(|e| {
                    tracing::error!("Failed to create MongoDB client: {}", e);
                    AppError::from(e)
                })?;
                tracing::info!(
                    database = %self.database_name,
                    collection = %self.collection_name,
                    "MongoDB client initialized"
                );
                Ok::<Database, AppError>(client.database(&self.database_name))
            })
            .await
    }

    pub async fn books(&self) -> Result<Collection<Document>, AppError> {
        Ok(self.database().await?.collection(&self.collection_name))
    }
}

#[async_trait]
impl BookStore for MongoDb {
    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        let cursor = self.books().await?.find(None, None).await.map_err(|e| {
            tracing::error!("Failed to query books collection: {}", e);
            AppError::from(e)
        })?;
        Ok(cursor.try_collect::<Vec<Document>>().await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError> {
        Ok(self
            .books()
            .await?
            .find_one(doc! { "_id": id }, None)
            .await?)
    }

    async fn insert(&self, book: Document) -> Result<ObjectId, AppError> {
        let result = self
            .books()
            .await?
            .insert_one(book, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert book: {}", e);
                AppError::from(e)
            })?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Store assigned a non-ObjectId identifier: {}",
                result.inserted_id
            ))
        })
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let result = self
            .books()
            .await?
            .update_one(doc! { "_id": id }, doc! { "$set": fields }, None)
            .await
            .map_err(|e| {
                tracing::error!(book_id = %id, "Failed to update book: {}", e);
                AppError::from(e)
            })?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<u64, AppError> {
        let result = self
            .books()
            .await?
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(book_id = %id, "Failed to delete book: {}", e);
                AppError::from(e)
            })?;
        Ok(result.deleted_count)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.database()
            .await?
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}

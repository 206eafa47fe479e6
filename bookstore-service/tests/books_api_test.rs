mod common;

use axum::http::{Method, StatusCode};
use async_trait::async_trait;
use bookstore_service::services::{BookStore, InMemoryBookStore, UpdateOutcome};
use common::{memory_router, router_with, send};
use mongodb::bson::{oid::ObjectId, Document};
use serde_json::{json, Value};
use service_core::error::AppError;
use std::sync::Arc;

const ORWELL: &str = r#"{"title":"1984","author":"George Orwell","isbn":"9780451524935","price":12.99,"stock":50}"#;

async fn create(router: &axum::Router, body: &str) -> Value {
    let (status, book) = send(router, Method::POST, "/books", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", book);
    book
}

#[tokio::test]
async fn create_fetch_update_delete_round() {
    let router = memory_router();

    let created = create(&router, ORWELL).await;
    let id = created["_id"].as_str().expect("_id is a string").to_string();
    assert_eq!(id.len(), 24);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(created["title"], "1984");
    assert_eq!(created["author"], "George Orwell");
    assert_eq!(created["isbn"], "9780451524935");
    assert_eq!(created["price"], 12.99);
    assert_eq!(created["stock"], 50);
    assert_eq!(created["description"], Value::Null);
    assert!(created["created_at"].is_string());

    let (status, fetched) = send(&router, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &router,
        Method::PUT,
        &format!("/books/{}", id),
        Some(r#"{"price":9.99,"stock":45}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 9.99);
    assert_eq!(updated["stock"], 45);
    assert_eq!(updated["title"], "1984");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, body) = send(&router, Method::DELETE, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted successfully" }));

    let (status, body) = send(&router, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Book not found" }));

    let (status, body) = send(&router, Method::DELETE, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Book not found");
}

#[tokio::test]
async fn optional_fields_get_defaults() {
    let router = memory_router();

    let created = create(
        &router,
        r#"{"title":"Dune","author":"Frank Herbert","isbn":"9780441172719"}"#,
    )
    .await;

    assert_eq!(created["price"], Value::Null);
    assert_eq!(created["stock"], 0);
    assert_eq!(created["description"], Value::Null);
}

#[tokio::test]
async fn extra_create_fields_are_not_stored() {
    let router = memory_router();

    let created = create(
        &router,
        r#"{"title":"Dune","author":"Frank Herbert","isbn":"9780441172719","genre":"sci-fi"}"#,
    )
    .await;

    assert!(created.get("genre").is_none());
}

#[tokio::test]
async fn missing_required_field_is_rejected() {
    let router = memory_router();

    let (status, body) = send(
        &router,
        Method::POST,
        "/books",
        Some(r#"{"title":"X","isbn":"1"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing required field: author" }));

    let (_, books) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(books, json!([]));
}

#[tokio::test]
async fn first_missing_field_is_reported() {
    let router = memory_router();

    let (status, body) = send(&router, Method::POST, "/books", Some(r#"{"isbn":"1"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: title");
}

#[tokio::test]
async fn create_without_json_body_is_rejected() {
    let router = memory_router();

    for body in [None, Some("not json"), Some("null"), Some("{}")] {
        let (status, response) = send(&router, Method::POST, "/books", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "No JSON data provided");
    }
}

#[tokio::test]
async fn invalid_ids_are_rejected_before_lookup() {
    let router = memory_router();

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&router, method, "/books/not-a-valid-id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid book ID format" }));
    }

    let (status, body) = send(
        &router,
        Method::PUT,
        "/books/not-a-valid-id",
        Some(r#"{"price":1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid book ID format");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let router = memory_router();
    let uri = "/books/65f1c0ffee0000000000beef";

    let (status, body) = send(&router, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Book not found");

    let (status, body) = send(&router, Method::PUT, uri, Some(r#"{"price":1}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Book not found");
}

#[tokio::test]
async fn update_rejects_empty_and_identical_payloads() {
    let router = memory_router();
    let created = create(&router, ORWELL).await;
    let uri = format!("/books/{}", created["_id"].as_str().expect("_id"));

    let (status, body) = send(&router, Method::PUT, &uri, Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");

    let (status, body) = send(&router, Method::PUT, &uri, Some(r#"{"_id":"abc"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");

    let (status, body) = send(&router, Method::PUT, &uri, Some(r#"{"price":12.99}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No changes made");

    let (status, body) = send(&router, Method::PUT, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON data provided");

    let (_, unchanged) = send(&router, Method::GET, &uri, None).await;
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn update_can_add_new_fields() {
    let router = memory_router();
    let created = create(&router, ORWELL).await;
    let uri = format!("/books/{}", created["_id"].as_str().expect("_id"));

    let (status, updated) = send(
        &router,
        Method::PUT,
        &uri,
        Some(r#"{"genre":"dystopia","description":"A novel"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["genre"], "dystopia");
    assert_eq!(updated["description"], "A novel");
    assert_eq!(updated["_id"], created["_id"]);
}

#[tokio::test]
async fn list_returns_books_in_insertion_order() {
    let router = memory_router();

    let first = create(&router, ORWELL).await;
    let second = create(
        &router,
        r#"{"title":"Dune","author":"Frank Herbert","isbn":"9780441172719"}"#,
    )
    .await;

    let (status, books) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books, json!([first, second]));
}

#[tokio::test]
async fn index_describes_the_api() {
    let router = memory_router();

    let (status, body) = send(&router, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Bookstore API");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["endpoints"]["list_books"], "GET /books");
    assert_eq!(body["endpoints"]["health"], "/health");
}

#[tokio::test]
async fn stock_update_scenario() {
    let router = memory_router();

    let created = create(
        &router,
        r#"{"title":"1984","author":"G. Orwell","isbn":"123"}"#,
    )
    .await;
    assert_eq!(created["stock"], 0);
    assert_eq!(created["price"], Value::Null);
    assert_eq!(created["description"], Value::Null);
    let uri = format!("/books/{}", created["_id"].as_str().expect("_id"));

    let (_, books) = send(&router, Method::GET, "/books", None).await;
    assert!(books
        .as_array()
        .expect("list is an array")
        .contains(&created));

    let (status, updated) = send(&router, Method::PUT, &uri, Some(r#"{"stock":5}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stock"], 5);
    assert_eq!(updated["title"], "1984");

    let (status, _) = send(&router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn isbn_is_not_unique() {
    let router = memory_router();
    let body = r#"{"title":"1984","author":"George Orwell","isbn":"9780451524935"}"#;

    let first = create(&router, body).await;
    let second = create(&router, body).await;
    assert_ne!(first["_id"], second["_id"]);
    assert_eq!(first["isbn"], second["isbn"]);

    let (status, books) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books, json!([first, second]));
}

#[tokio::test]
async fn reordered_subdocument_counts_as_a_change() {
    let router = memory_router();
    let created = create(&router, ORWELL).await;
    let uri = format!("/books/{}", created["_id"].as_str().expect("_id"));

    let (status, _) = send(&router, Method::PUT, &uri, Some(r#"{"meta":{"x":1,"y":2}}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, updated) =
        send(&router, Method::PUT, &uri, Some(r#"{"meta":{"y":2,"x":1}}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&String> = updated["meta"]
        .as_object()
        .expect("meta is an object")
        .keys()
        .collect();
    assert_eq!(keys, vec!["y", "x"]);

    let (status, body) =
        send(&router, Method::PUT, &uri, Some(r#"{"meta":{"y":2,"x":1}}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No changes made");
}

/// Removes the target book just before applying an update, as a concurrent
/// DELETE would.
struct DeletedBeforeUpdate(InMemoryBookStore);

#[async_trait]
impl BookStore for DeletedBeforeUpdate {
    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        self.0.find_all().await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError> {
        self.0.find_by_id(id).await
    }

    async fn insert(&self, book: Document) -> Result<ObjectId, AppError> {
        self.0.insert(book).await
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateOutcome, AppError> {
        self.0.delete_by_id(id).await?;
        self.0.update_fields(id, fields).await
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<u64, AppError> {
        self.0.delete_by_id(id).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.0.ping().await
    }
}

#[tokio::test]
async fn update_of_concurrently_deleted_book_is_not_found() {
    let router = router_with(Arc::new(DeletedBeforeUpdate(InMemoryBookStore::new())));
    let created = create(&router, ORWELL).await;
    let uri = format!("/books/{}", created["_id"].as_str().expect("_id"));

    let (status, body) = send(&router, Method::PUT, &uri, Some(r#"{"stock":5}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Book not found" }));
}

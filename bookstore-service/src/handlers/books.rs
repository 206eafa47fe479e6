use crate::dtos::{serialize_book, DeleteResponse};
use crate::models::{BookUpdate, NewBook};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde_json::{Map, Value};
use service_core::error::AppError;

const BOOK_NOT_FOUND: &str = "Book not found";
const NO_JSON_DATA: &str = "No JSON data provided";

/// Parse a path segment as an ObjectId (24 hex characters).
pub fn parse_book_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::bad_request("Invalid book ID format"))
}

/// The request body as a JSON object. Empty, malformed, `null` and
/// non-object bodies are all rejected the same way. An empty object is
/// accepted here; create rejects it, update reports it as having no fields.
fn json_object(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(payload)) => Ok(payload),
        _ => Err(AppError::bad_request(NO_JSON_DATA)),
    }
}

pub async fn list_books(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let books = state.store.find_all().await?;
    tracing::debug!(count = books.len(), "Listed books");

    Ok(Json(
        books.into_iter().map(serialize_book).collect::<Vec<_>>(),
    ))
}

/// `POST /books`. Every failure on this path, store errors included, is
/// reported as 400.
pub async fn create_book(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let created = insert_book(&state, &body)
        .await
        .map_err(AppError::into_client_error)?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn insert_book(state: &AppState, body: &[u8]) -> Result<Value, AppError> {
    let payload = json_object(body)?;
    if payload.is_empty() {
        return Err(AppError::bad_request(NO_JSON_DATA));
    }
    let document = NewBook::from_payload(&payload)?.into_document(Utc::now())?;

    let id = state.store.insert(document).await?;
    tracing::info!(book_id = %id, "Book created");

    let created = state.store.find_by_id(id).await?.ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Created book {} could not be read back",
            id
        ))
    })?;

    Ok(serialize_book(created))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_book_id(&book_id)?;

    let book = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    Ok(Json(serialize_book(book)))
}

/// `PUT /books/:id`. Store errors are reported as 400, like create.
pub async fn update_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_book_id(&book_id)?;

    let updated = apply_update(&state, id, &body)
        .await
        .map_err(AppError::into_client_error)?;

    Ok(Json(updated))
}

async fn apply_update(state: &AppState, id: ObjectId, body: &[u8]) -> Result<Value, AppError> {
    let payload = json_object(body)?;

    if state.store.find_by_id(id).await?.is_none() {
        return Err(AppError::not_found(BOOK_NOT_FOUND));
    }

    let update = BookUpdate::from_payload(&payload)?;
    if update.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }

    let outcome = state.store.update_fields(id, update.into_fields()).await?;
    if outcome.matched == 0 {
        return Err(AppError::not_found(BOOK_NOT_FOUND));
    }
    if outcome.modified == 0 {
        return Err(AppError::bad_request("No changes made"));
    }
    tracing::info!(book_id = %id, "Book updated");

    let updated = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    Ok(serialize_book(updated))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_book_id(&book_id)?;

    if state.store.delete_by_id(id).await? == 0 {
        return Err(AppError::not_found(BOOK_NOT_FOUND));
    }
    tracing::info!(book_id = %id, "Book deleted");

    Ok(Json(DeleteResponse {
        message: "Book deleted successfully".to_string(),
    }))
}

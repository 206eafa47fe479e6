pub mod books;

pub use books::{bson_to_json, serialize_book, ApiInfo, DeleteResponse, HealthResponse};

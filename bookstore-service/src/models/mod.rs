pub mod book;

pub use book::{BookUpdate, NewBook, DEFAULT_STOCK, REQUIRED_FIELDS};

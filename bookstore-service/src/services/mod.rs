pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::MongoDb;
pub use memory::InMemoryBookStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::{BookStore, UpdateOutcome};

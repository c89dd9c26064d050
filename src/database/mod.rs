pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod seed;
pub mod storage;

pub use manager::{Backends, DatabaseManager};
pub use memory::MemoryStorage;
pub use postgres::PgStorage;
pub use storage::{SessionStore, Storage, StorageError};

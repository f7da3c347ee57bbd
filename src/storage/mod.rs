// Backing-store collaborators
//
// The engine persists through a plain get/set blob store. The in-memory
// implementation backs development and tests; the Postgres one backs
// deployments that share the store between redundant processes.

pub use kv::{InMemoryKvStore, KvStore, StorageError};
pub use postgres::PostgresKvStore;

mod kv;
mod postgres;

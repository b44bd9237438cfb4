use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod io;
pub mod json_kv;

pub use json_kv::{JsonKvStore, JsonKvStoreConfig};

pub type StorageResult<T> = Result<T>;

/// Key-value seam shared by the API and worker processes. Implementations
/// must be safe for concurrent use from separate processes.
#[async_trait]
pub trait KvStorage: Send + Sync {
    async fn initialize(&self) -> StorageResult<()>;

    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> StorageResult<()>;
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

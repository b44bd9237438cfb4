use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use super::io::{ensure_dir, read_json_file, write_json_file};
use super::{KvStorage, StorageResult};

#[derive(Clone, Debug)]
pub struct JsonKvStoreConfig {
    pub working_dir: PathBuf,
    pub namespace: String,
}

/// One JSON document per key on a shared directory.
///
/// Reads and writes go straight to disk so the API and worker processes
/// pointed at the same directory observe each other's updates; every write
/// is an atomic rename.
pub struct JsonKvStore {
    namespace: String,
    dir: PathBuf,
}

impl JsonKvStore {
    pub fn new(config: JsonKvStoreConfig) -> Self {
        let JsonKvStoreConfig {
            working_dir,
            namespace,
        } = config;

        let dir = working_dir.join(&namespace);
        Self { namespace, dir }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

#[async_trait]
impl KvStorage for JsonKvStore {
    async fn initialize(&self) -> StorageResult<()> {
        ensure_dir(&self.dir)
            .await
            .with_context(|| format!("failed to create directory for kv store {}", self.namespace))
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        read_json_file(&self.record_path(key))
            .await
            .with_context(|| format!("failed to read key {key} in kv store {}", self.namespace))
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        write_json_file(&self.record_path(key), &value)
            .await
            .with_context(|| format!("failed to write key {key} in kv store {}", self.namespace))
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("failed to remove key {key} in kv store {}", self.namespace)
            }),
        }
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

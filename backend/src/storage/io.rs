use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::StorageResult;

pub async fn ensure_dir(path: &Path) -> StorageResult<()> {
    fs::create_dir_all(path).await?;
    Ok(())
}

/// Read and deserialize a JSON file; `None` when missing or empty.
pub async fn read_json_file<T>(path: &Path) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
{
    match fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Ok(None),
        Ok(bytes) => Ok(Some(serde_json::from_slice::<T>(&bytes)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write JSON through a uniquely named temp file and rename it into place,
/// fsync'd, so concurrent readers in other processes never see a torn file.
pub async fn write_json_file<T>(path: &Path, value: &T) -> StorageResult<()>
where
    T: Serialize,
{
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }

    let tmp_path = temp_path(path);

    let mut file = fs::File::create(&tmp_path).await?;
    file.write_all(&serde_json::to_vec_pretty(value)?).await?;
    file.sync_all().await?;

    fs::rename(&tmp_path, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "record".to_string());
    tmp.set_file_name(format!(
        "{}.{}.tmp",
        file_name,
        Uuid::new_v4().simple()
    ));
    tmp
}

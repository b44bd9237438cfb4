use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upload_dir: PathBuf,
    pub broker_dir: PathBuf,
    pub result_backend_dir: PathBuf,
    pub status_store_dir: PathBuf,
    pub extraction: ExtractionConfig,
    pub worker: WorkerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upload_dir: PathBuf::from("data/uploads"),
            broker_dir: PathBuf::from("data/broker"),
            result_backend_dir: PathBuf::from("data/results"),
            status_store_dir: PathBuf::from("data/status"),
            extraction: ExtractionConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9998/tika".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

impl AppConfig {
    fn apply_env_overrides(&mut self) {
        if let Some(dir) = env_path("UPLOAD_DIR") {
            self.upload_dir = dir;
        }
        if let Some(dir) = env_path("BROKER_DIR") {
            self.broker_dir = dir;
        }
        if let Some(dir) = env_path("RESULT_BACKEND_DIR") {
            self.result_backend_dir = dir;
        }
        if let Some(dir) = env_path("STATUS_STORE_DIR") {
            self.status_store_dir = dir;
        }
        if let Some(endpoint) = env_value("EXTRACTOR_ENDPOINT") {
            self.extraction.endpoint = endpoint;
        }
    }
}

pub async fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()).await
}

/// Load the YAML config at `path`, falling back to defaults when the file
/// does not exist. Environment overrides win over the file in either case.
pub async fn load_config_from(path: &Path) -> Result<AppConfig> {
    let mut config = match fs::read_to_string(path).await {
        Ok(contents) => serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No config file found, using defaults");
            AppConfig::default()
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read config file at {}", path.display()));
        }
    };

    config.apply_env_overrides();
    Ok(config)
}

pub fn config_path() -> PathBuf {
    env::var("APP_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_value(key).map(PathBuf::from)
}

use std::env;
use std::path::PathBuf;

use crate::storage::StorageMode;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub huggingface_api_key: Option<String>,
    pub storage_mode: StorageMode,
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let storage_mode = match env::var("STORAGE_MODE").as_deref() {
            Ok("buffer") => StorageMode::Buffer,
            _ => StorageMode::Disk,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT").ok().and_then(|port| port.parse().ok()).unwrap_or(3000),
            huggingface_api_key: env::var("HUGGINGFACE_API_KEY").ok().filter(|key| !key.is_empty()),
            storage_mode,
            upload_dir: env::var("UPLOAD_DIR").map_or_else(|_| "uploads".into(), PathBuf::from),
        }
    }
}

//! 原始报文转储
//!
//! 无法解析、厂商未知或首次出现设备的报文原样落盘，便于补充解码规则。

use crate::error::StorageError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 同一毫秒内文件名冲突时的最大重试次数。
const MAX_NAME_ATTEMPTS: usize = 100;

/// 原始报文存储抽象。
#[async_trait]
pub trait RawPayloadStore: Send + Sync {
    /// 保存原始报文，返回存储位置。
    async fn persist(&self, body: &[u8]) -> Result<String, StorageError>;
}

/// 基于目录的转储存储：`<folder>/<YYYYMMDD-HHMMSS.mmm>.dump`（UTC）。
#[derive(Debug, Clone)]
pub struct FileDumpStore {
    folder: PathBuf,
}

impl FileDumpStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl RawPayloadStore for FileDumpStore {
    async fn persist(&self, body: &[u8]) -> Result<String, StorageError> {
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S%.3f").to_string();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{}.dump", stamp)
            } else {
                format!("{}-{}.dump", stamp, attempt)
            };
            let path = self.folder.join(name);
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            };
            file.write_all(body).await?;
            file.flush().await?;
            let location = path.display().to_string();
            debug!(target: "lora.storage", filename = %location, bytes = body.len(), "raw_payload_dumped");
            return Ok(location);
        }
        Err(StorageError::NameExhausted {
            stamp,
            folder: self.folder.display().to_string(),
        })
    }
}

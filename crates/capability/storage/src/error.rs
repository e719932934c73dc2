//! 存储层错误类型

/// 存储错误。
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// 同一时间戳下的候选文件名已全部被占用。
    #[error("no free dump file name for {stamp} in {folder}")]
    NameExhausted { stamp: String, folder: String },
}

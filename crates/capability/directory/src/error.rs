/// 设备目录查询错误。
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unreachable: {0}")]
    Unreachable(String),
    #[error("device not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status} for {dev_eui}")]
    Status { dev_eui: String, status: u16 },
    #[error("invalid directory response: {0}")]
    Decode(String),
}

impl DirectoryError {
    /// 网络层失败（连接、超时），区别于目录给出的明确应答。
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

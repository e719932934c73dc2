/// 规范化错误。
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// Webhook 报文体不是合法的上行报文 JSON。
    #[error("invalid envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    /// 厂商载荷形状无法解析。
    #[error("invalid {vendor} payload: {source}")]
    Payload {
        vendor: &'static str,
        source: serde_json::Error,
    },
}

//! HTTP 处理器
//!
//! - webhook：上行报文接收与转储
//! - metrics：Prometheus 文本导出与健康检查

pub mod metrics;
pub mod webhook;

pub use metrics::{health, metrics};
pub use webhook::{dump, lost_soul, webhook};

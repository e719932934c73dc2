//! # LoRa Storage 模块
//!
//! 进程内状态与原始报文落盘：
//!
//! - [`registry`]：设备注册表（首次出现检测 + 指标身份标签）
//!   - 使用 `RwLock<HashMap>` 提供线程安全的内存存储
//!   - 仅为非权威缓存，进程重启后由设备下一次上行自动重建
//! - [`dump`]：原始报文转储（`RawPayloadStore` 接口 + 文件实现）
//! - [`error`]：存储错误类型定义

pub mod dump;
pub mod error;
pub mod registry;

pub use dump::{FileDumpStore, RawPayloadStore};
pub use error::StorageError;
pub use registry::DeviceRegistry;

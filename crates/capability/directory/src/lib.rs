//! # LoRa Directory 模块
//!
//! 设备目录（网络服务器）状态查询：
//!
//! - [`DeviceDirectory`]：按 devEui 查询电量与外部供电状态
//! - [`ChirpstackDirectory`]：基于 ChirpStack REST API 的实现
//! - [`StatusPoller`]：定时遍历设备注册表，写入状态指标；查询失败的设备从注册表移除

pub mod chirpstack;
pub mod error;
pub mod poller;

pub use chirpstack::{ChirpstackDirectory, DirectorySettings};
pub use error::DirectoryError;
pub use poller::{PollSummary, StatusPoller};

use async_trait::async_trait;

/// 设备状态快照。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceStatus {
    pub battery_level: Option<f64>,
    pub external_power: Option<bool>,
}

/// 设备目录抽象。
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn lookup_status(&self, dev_eui: &str) -> Result<DeviceStatus, DirectoryError>;
}

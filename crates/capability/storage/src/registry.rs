//! 设备注册表
//!
//! 记录进程启动以来见过的每个设备（devEui -> 设备名称），用于：
//! - 首次出现检测（首次出现的设备需要转储原始报文）
//! - 为每条设备指标提供身份标签
//! - 为设备状态轮询提供待查询的设备列表
//!
//! 键为小写 devEui；标签中保留网络服务器上报的原始写法。

use domain::{DeviceLabels, DeviceRecord};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// 设备注册表
///
/// 单把 RwLock 保护整张表；对外只返回副本，不暴露内部引用。
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, DeviceRecord>>,
}

fn registry_key(dev_eui: &str) -> String {
    dev_eui.to_ascii_lowercase()
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建或刷新设备记录，仅在该设备首次记录（或被移除后再次记录）时返回 true。
    pub fn upsert(&self, dev_eui: &str, device_name: &str) -> bool {
        let mut map = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let record = DeviceRecord {
            dev_eui: dev_eui.to_string(),
            device_name: device_name.to_string(),
        };
        map.insert(registry_key(dev_eui), record).is_none()
    }

    /// 返回设备当前的身份标签副本。
    pub fn labels_for(&self, dev_eui: &str) -> Option<DeviceLabels> {
        let map = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&registry_key(dev_eui)).map(DeviceLabels::from)
    }

    /// 移除设备记录（上游确认设备不存在时调用），返回是否存在过。
    pub fn evict(&self, dev_eui: &str) -> bool {
        let mut map = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(&registry_key(dev_eui)).is_some()
    }

    /// 当前已知设备的 devEui 快照。
    pub fn all_known_ids(&self) -> Vec<String> {
        let map = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        map.values().map(|record| record.dev_eui.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

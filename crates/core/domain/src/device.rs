/// 设备注册表中的单条记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub dev_eui: String,
    pub device_name: String,
}

/// 附加到设备指标上的身份标签快照。
///
/// 每次读取都是独立副本，调用方可以自由扩展而不影响注册表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLabels {
    pub device_name: String,
    pub device_eui: String,
}

impl DeviceLabels {
    pub fn new(device_name: impl Into<String>, device_eui: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            device_eui: device_eui.into(),
        }
    }
}

impl From<&DeviceRecord> for DeviceLabels {
    fn from(record: &DeviceRecord) -> Self {
        Self::new(record.device_name.clone(), record.dev_eui.clone())
    }
}

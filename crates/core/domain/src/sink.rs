//! 指标输出接口（Gauge / Counter）与标签集。

use crate::data::GeoPoint;
use crate::device::DeviceLabels;
use std::collections::BTreeMap;

pub const LABEL_DEVICE_NAME: &str = "deviceName";
pub const LABEL_DEVICE_EUI: &str = "deviceEui";
pub const LABEL_GATEWAY_ID: &str = "gatewayId";
pub const LABEL_TYPE: &str = "type";
pub const LABEL_LAT: &str = "lat";
pub const LABEL_LON: &str = "lon";
pub const LABEL_LEVEL: &str = "level";
pub const LABEL_CODE: &str = "code";
pub const LABEL_URL: &str = "url";

/// 单次输出使用的不可变标签集。
///
/// 每次输出都从设备标签快照重新构建，不与其他调用共享可变状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<&'static str, String>);

impl LabelSet {
    /// deviceName, deviceEui
    pub fn device(labels: &DeviceLabels) -> Self {
        let mut map = BTreeMap::new();
        map.insert(LABEL_DEVICE_NAME, labels.device_name.clone());
        map.insert(LABEL_DEVICE_EUI, labels.device_eui.clone());
        Self(map)
    }

    /// gatewayId, deviceName, deviceEui
    pub fn gateway(labels: &DeviceLabels, gateway_id: &str) -> Self {
        Self::device(labels).with(LABEL_GATEWAY_ID, gateway_id)
    }

    /// deviceName, deviceEui, type
    pub fn metric(labels: &DeviceLabels, metric_type: &str) -> Self {
        Self::device(labels).with(LABEL_TYPE, metric_type)
    }

    /// deviceName, deviceEui, type, lat, lon
    pub fn geo_metric(labels: &DeviceLabels, metric_type: &str, geo: &GeoPoint) -> Self {
        Self::metric(labels, metric_type)
            .with(LABEL_LAT, geo.lat_label())
            .with(LABEL_LON, geo.lon_label())
    }

    /// deviceName, deviceEui, level, code
    pub fn message_level(labels: &DeviceLabels, level: &str, code: &str) -> Self {
        Self::device(labels)
            .with(LABEL_LEVEL, level)
            .with(LABEL_CODE, code)
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 设备级 Gauge。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceGauge {
    FrameCount,
    LastSeen,
    RxRssi,
    RxSnr,
    BatteryPercent,
    ExternalPower,
    /// 厂商指标，类型由 `type` 标签区分。
    Metric,
    /// 带经纬度标签的厂商指标。
    GeoMetric,
}

/// 设备级 Counter。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCounter {
    Confirmed,
    Unconfirmed,
    MessageLevel,
}

/// 导出器自身的处理计数（无标签）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExporterCounter {
    Webhook,
    WebhookError,
    Api,
    ApiError,
    ApiConnection,
    ApiConnectionError,
}

/// Webhook 转发结果计数，按目标 URL 区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardCounter {
    Forwarded,
    ForwardError,
}

/// 只写指标输出端。
pub trait MetricsSink: Send + Sync {
    fn set_gauge(&self, gauge: DeviceGauge, labels: &LabelSet, value: f64);

    fn inc_counter(&self, counter: DeviceCounter, labels: &LabelSet);

    fn inc_exporter(&self, counter: ExporterCounter);

    fn inc_forward(&self, counter: ForwardCounter, url: &str);
}

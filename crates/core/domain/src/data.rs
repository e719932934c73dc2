use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::borrow::Cow;

/// 网络服务器推送的上行报文（ChirpStack "up" 事件）。
///
/// 只解析标准化所需字段；厂商载荷保留为原始 JSON，由对应厂商解码器解析。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkEnvelope {
    #[serde(default)]
    pub device_info: DeviceInfo,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub f_cnt: u32,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub rx_info: Vec<ReceptionReport>,
    /// 厂商载荷（形状由厂商决定）。
    #[serde(default)]
    pub object: serde_json::Value,
}

impl UplinkEnvelope {
    /// 从 Webhook 报文体解析。
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn dev_eui(&self) -> &str {
        &self.device_info.dev_eui
    }

    pub fn device_name(&self) -> &str {
        &self.device_info.device_name
    }

    /// 网络服务器上报的投递问题（level 非空时才存在）。
    pub fn delivery_error(&self) -> Option<DeliveryError> {
        let level = self.level.as_deref().filter(|level| !level.is_empty())?;
        Some(DeliveryError {
            level: level.to_string(),
            code: self.code.clone().unwrap_or_default(),
        })
    }
}

/// 设备身份信息。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub dev_eui: String,
    #[serde(default)]
    pub device_name: String,
}

/// 单个网关的接收报告。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceptionReport {
    #[serde(default)]
    pub gateway_id: String,
    #[serde(default)]
    pub rssi: i32,
    #[serde(default)]
    pub snr: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    pub level: String,
    pub code: String,
}

/// 经纬度对。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// 纬度标签值（十进制字符串）。
    pub fn lat_label(&self) -> String {
        format_coordinate(self.latitude)
    }

    /// 经度标签值（十进制字符串）。
    pub fn lon_label(&self) -> String {
        format_coordinate(self.longitude)
    }
}

/// 保留至多 6 位小数，至少 1 位小数（20 -> "20.0"）。
fn format_coordinate(value: f64) -> String {
    let text = format!("{:.6}", value);
    let trimmed = text.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// 一次上行中解析出的单个指标观测。
#[derive(Debug, Clone, PartialEq)]
pub struct MetricObservation {
    pub dev_eui: String,
    pub metric_type: Cow<'static, str>,
    pub value: f64,
    pub geo: Option<GeoPoint>,
}

impl MetricObservation {
    pub fn new(
        dev_eui: impl Into<String>,
        metric_type: impl Into<Cow<'static, str>>,
        value: f64,
    ) -> Self {
        Self {
            dev_eui: dev_eui.into(),
            metric_type: metric_type.into(),
            value,
            geo: None,
        }
    }

    /// 复制为带地理标签的观测。
    pub fn with_geo(&self, geo: GeoPoint) -> Self {
        Self {
            geo: Some(geo),
            ..self.clone()
        }
    }
}

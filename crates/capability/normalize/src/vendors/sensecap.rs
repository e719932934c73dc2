//! SenseCAP（Seeed）传感器：`object.messages` 为测量记录列表。
//!
//! 列表可能是扁平数组，也可能是数组的数组（现场观测到，原因未知）。
//! 先按扁平数组解析，失败后展开一层嵌套；两者都失败则解码失败。

use crate::decoder::{DecodedBatch, VendorDecoder};
use crate::error::NormalizeError;
use crate::geo::{LATITUDE, LONGITUDE};
use crate::reading::{measurement_id, reading, text};
use domain::{MetricObservation, UplinkEnvelope};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const OUI: &str = "2c:f7:f1";
const VENDOR: &str = "sensecap";

/// 测量 ID -> 指标类型（https://sensecap-docs.seeed.cc/measurement_list.html）。
const MEASUREMENTS: &[(u32, &str)] = &[
    (4097, "airTemperature"),
    (4098, "airHumidity"),
    (4099, "lightIntensity"),
    (4100, "co2"),
    (4101, "barometricPressure"),
    (4102, "soilTemperature"),
    (4103, "soilMoisture"),
    (4104, "windDirection"),
    (4105, "windSpeed"),
    (4106, "ph"),
    (4108, "soilConductivity"),
    (4110, "soilVolumetricWaterContent"),
    (4113, "rainfallHourly"),
    (4115, "distance"),
    (4116, "waterLeak"),
    (4117, "liquidLevel"),
    (4124, "waterTemperature"),
    (4197, LONGITUDE),
    (4198, LATITUDE),
    (4199, "lightPercent"),
];

pub fn measurement_type(id: u32) -> Option<&'static str> {
    MEASUREMENTS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, metric_type)| *metric_type)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SenseCapMessage {
    #[serde(rename = "type", default, deserialize_with = "text")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "measurement_id")]
    measurement_id: Option<u32>,
    #[serde(default, deserialize_with = "reading")]
    measurement_value: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    battery: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    interval: Option<f64>,
}

type MessageRecord = Map<String, Value>;

/// 扁平数组优先，其次按顺序拼接内层数组。
fn message_records(messages: &Value) -> Result<Vec<MessageRecord>, serde_json::Error> {
    match Vec::<MessageRecord>::deserialize(messages) {
        Ok(records) => Ok(records),
        Err(_) => Vec::<Vec<MessageRecord>>::deserialize(messages)
            .map(|nested| nested.into_iter().flatten().collect()),
    }
}

#[derive(Debug, Default)]
pub struct SenseCapDecoder;

impl SenseCapDecoder {
    fn observation(&self, dev_eui: &str, message: SenseCapMessage) -> Option<MetricObservation> {
        match message.kind.as_deref() {
            Some("report_telemetry") => {
                let Some(id) = message.measurement_id else {
                    warn!(target: "lora.normalize", dev_eui = %dev_eui, "measurement_id_missing");
                    return None;
                };
                let Some(metric_type) = measurement_type(id) else {
                    warn!(
                        target: "lora.normalize",
                        dev_eui = %dev_eui,
                        measurement_id = id,
                        "measurement_unsupported"
                    );
                    return None;
                };
                let value = message.measurement_value?;
                Some(MetricObservation::new(dev_eui, metric_type, value))
            }
            Some("upload_battery") => message
                .battery
                .map(|value| MetricObservation::new(dev_eui, "battery", value)),
            Some("upload_interval") => message
                .interval
                .map(|value| MetricObservation::new(dev_eui, "interval", value)),
            other => {
                debug!(target: "lora.normalize", dev_eui = %dev_eui, kind = ?other, "message_type_ignored");
                None
            }
        }
    }
}

impl VendorDecoder for SenseCapDecoder {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    fn decode(&self, envelope: &UplinkEnvelope) -> Result<DecodedBatch, NormalizeError> {
        let dev_eui = envelope.dev_eui();
        let messages = match envelope.object.get("messages") {
            None | Some(Value::Null) => return Ok(DecodedBatch::default()),
            Some(messages) => messages,
        };
        let records = message_records(messages).map_err(|source| NormalizeError::Payload {
            vendor: VENDOR,
            source,
        })?;

        let mut observations = Vec::with_capacity(records.len());
        for record in records {
            let message = SenseCapMessage::deserialize(&Value::Object(record)).map_err(|source| {
                NormalizeError::Payload {
                    vendor: VENDOR,
                    source,
                }
            })?;
            observations.extend(self.observation(dev_eui, message));
        }
        Ok(DecodedBatch::new(observations))
    }

    fn geo_tagging(&self) -> bool {
        true
    }
}

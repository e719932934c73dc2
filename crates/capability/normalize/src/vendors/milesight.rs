//! Milesight 倾角 / 测距传感器。
//!
//! 温湿度与电量既可能出现在 `decoded` 子对象中，也可能出现在顶层字段；
//! 两处读数相互独立，同时存在时都输出（先 `decoded`，后顶层）。

use super::mapped_observations;
use crate::decoder::{DecodedBatch, VendorDecoder};
use crate::error::NormalizeError;
use crate::reading::{reading, text, vendor_fields};
use domain::{MetricObservation, UplinkEnvelope};
use serde::Deserialize;
use serde_json::Value;

pub const OUI: &str = "24:e1:24";
const VENDOR: &str = "milesight";

/// `position` 为 normal 时输出 0，其余取值输出 1。
const POSITION_NORMAL: &str = "normal";

#[derive(Debug, Default, Deserialize)]
struct MilesightFields {
    #[serde(default)]
    decoded: Value,
    #[serde(default, deserialize_with = "reading")]
    temperature: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    battery: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    distance: Option<f64>,
    #[serde(default, deserialize_with = "text")]
    position: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MilesightDecoded {
    #[serde(default, deserialize_with = "reading")]
    temperature: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    battery: Option<f64>,
}

fn position_value(position: Option<&str>) -> Option<f64> {
    match position {
        None | Some("") => None,
        Some(POSITION_NORMAL) => Some(0.0),
        Some(_) => Some(1.0),
    }
}

#[derive(Debug, Default)]
pub struct MilesightDecoder;

impl VendorDecoder for MilesightDecoder {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    fn decode(&self, envelope: &UplinkEnvelope) -> Result<DecodedBatch, NormalizeError> {
        let dev_eui = envelope.dev_eui();
        let fields: MilesightFields = vendor_fields(VENDOR, dev_eui, &envelope.object);
        let decoded: MilesightDecoded = vendor_fields(VENDOR, dev_eui, &fields.decoded);

        let mut observations = mapped_observations(
            dev_eui,
            &[
                (decoded.temperature, "airTemperature"),
                (decoded.humidity, "airHumidity"),
                (fields.temperature, "airTemperature"),
                (fields.humidity, "airHumidity"),
                (fields.distance, "distance"),
            ],
        );
        if let Some(value) = position_value(fields.position.as_deref()) {
            observations.push(MetricObservation::new(dev_eui, "position", value));
        }
        observations.extend(mapped_observations(
            dev_eui,
            &[(decoded.battery, "battery"), (fields.battery, "battery")],
        ));
        Ok(DecodedBatch::new(observations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(object: Value) -> Vec<(String, f64)> {
        let envelope: UplinkEnvelope = serde_json::from_value(json!({
            "deviceInfo": {"devEui": "24E124000000000A", "deviceName": "tilt-1"},
            "object": object,
        }))
        .expect("envelope");
        MilesightDecoder
            .decode(&envelope)
            .expect("decode")
            .observations
            .into_iter()
            .map(|obs| (obs.metric_type.into_owned(), obs.value))
            .collect()
    }

    #[test]
    fn both_battery_readings_are_kept() {
        let pairs = decode(json!({"decoded": {"battery": 98}, "battery": 97}));
        assert_eq!(
            pairs,
            vec![("battery".to_string(), 98.0), ("battery".to_string(), 97.0)]
        );
    }

    #[test]
    fn decoded_readings_come_first() {
        let pairs = decode(json!({
            "temperature": 19.0,
            "decoded": {"temperature": 18.5, "humidity": 40},
            "distance": 1200,
        }));
        assert_eq!(
            pairs,
            vec![
                ("airTemperature".to_string(), 18.5),
                ("airHumidity".to_string(), 40.0),
                ("airTemperature".to_string(), 19.0),
                ("distance".to_string(), 1200.0),
            ]
        );
    }

    #[test]
    fn position_is_binary() {
        assert_eq!(decode(json!({"position": "normal"})), vec![("position".to_string(), 0.0)]);
        assert_eq!(decode(json!({"position": "tilt"})), vec![("position".to_string(), 1.0)]);
        assert!(decode(json!({"position": ""})).is_empty());
        assert!(decode(json!({"position": 1})).is_empty());
    }

    #[test]
    fn malformed_decoded_object_is_ignored() {
        let pairs = decode(json!({"decoded": [1, 2, 3], "humidity": 55.5}));
        assert_eq!(pairs, vec![("airHumidity".to_string(), 55.5)]);
    }
}

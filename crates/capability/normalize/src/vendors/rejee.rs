//! Rejee 紧凑型多合一传感器，扁平字段。

use super::mapped_observations;
use crate::decoder::{DecodedBatch, VendorDecoder};
use crate::error::NormalizeError;
use crate::reading::{reading, vendor_fields};
use domain::UplinkEnvelope;
use serde::Deserialize;

pub const OUI: &str = "ca:cb:b8";
const VENDOR: &str = "rejee";

#[derive(Debug, Default, Deserialize)]
struct RejeeFields {
    #[serde(default, deserialize_with = "reading")]
    battery: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    temperature: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "reading")]
    vol: Option<f64>,
}

#[derive(Debug, Default)]
pub struct RejeeDecoder;

impl VendorDecoder for RejeeDecoder {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    fn decode(&self, envelope: &UplinkEnvelope) -> Result<DecodedBatch, NormalizeError> {
        let fields: RejeeFields = vendor_fields(VENDOR, envelope.dev_eui(), &envelope.object);
        Ok(DecodedBatch::new(mapped_observations(
            envelope.dev_eui(),
            &[
                (fields.battery, "battery"),
                (fields.temperature, "airTemperature"),
                (fields.humidity, "airHumidity"),
                (fields.vol, "vol"),
            ],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn present_fields_are_emitted() {
        let envelope: UplinkEnvelope = serde_json::from_value(json!({
            "deviceInfo": {"devEui": "CACBB80000000001", "deviceName": "rejee-1"},
            "object": {"battery": 0, "temperature": -4.5, "humidity": null, "vol": 12},
        }))
        .expect("envelope");
        let batch = RejeeDecoder.decode(&envelope).expect("decode");
        let types: Vec<_> = batch
            .observations
            .iter()
            .map(|obs| (obs.metric_type.as_ref(), obs.value))
            .collect();
        assert_eq!(
            types,
            vec![("battery", 0.0), ("airTemperature", -4.5), ("vol", 12.0)]
        );
    }
}

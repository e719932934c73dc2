//! Dragino 温湿度 / 门磁传感器（LHT52、LDS02 等），扁平字段。

use super::mapped_observations;
use crate::decoder::{DecodedBatch, VendorDecoder};
use crate::error::NormalizeError;
use crate::reading::{reading, vendor_fields};
use domain::UplinkEnvelope;
use serde::Deserialize;

pub const OUI: &str = "a8:40:41";
const VENDOR: &str = "dragino";

#[derive(Debug, Default, Deserialize)]
struct DraginoFields {
    #[serde(rename = "TempC_SHT", default, deserialize_with = "reading")]
    temp_c_sht: Option<f64>,
    #[serde(rename = "TempC_DS", default, deserialize_with = "reading")]
    temp_c_ds: Option<f64>,
    #[serde(rename = "Hum_SHT", default, deserialize_with = "reading")]
    hum_sht: Option<f64>,
    #[serde(rename = "LAST_DOOR_OPEN_DURATION", default, deserialize_with = "reading")]
    last_door_open_duration: Option<f64>,
    #[serde(rename = "ALARM", default, deserialize_with = "reading")]
    alarm: Option<f64>,
    #[serde(rename = "DOOR_OPEN_TIMES", default, deserialize_with = "reading")]
    door_open_times: Option<f64>,
    #[serde(rename = "BAT_V", default, deserialize_with = "reading")]
    bat_v: Option<f64>,
    #[serde(rename = "MOD", default, deserialize_with = "reading")]
    mode: Option<f64>,
    #[serde(rename = "DOOR_OPEN_STATUS", default, deserialize_with = "reading")]
    door_open_status: Option<f64>,
}

#[derive(Debug, Default)]
pub struct DraginoDecoder;

impl VendorDecoder for DraginoDecoder {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    fn decode(&self, envelope: &UplinkEnvelope) -> Result<DecodedBatch, NormalizeError> {
        let fields: DraginoFields = vendor_fields(VENDOR, envelope.dev_eui(), &envelope.object);
        Ok(DecodedBatch::new(mapped_observations(
            envelope.dev_eui(),
            &[
                (fields.temp_c_sht, "airTemperature"),
                (fields.temp_c_ds, "externalTemperature"),
                (fields.hum_sht, "airHumidity"),
                (fields.last_door_open_duration, "lastOpenDuration"),
                (fields.alarm, "alarm"),
                (fields.door_open_times, "openCount"),
                (fields.bat_v, "batteryVolts"),
                (fields.mode, "mod"),
                (fields.door_open_status, "openStatus"),
            ],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(object: serde_json::Value) -> DecodedBatch {
        let envelope: UplinkEnvelope = serde_json::from_value(json!({
            "deviceInfo": {"devEui": "A840410000000001", "deviceName": "door-1"},
            "object": object,
        }))
        .expect("envelope");
        DraginoDecoder.decode(&envelope).expect("decode")
    }

    #[test]
    fn door_sensor_fields_map_one_to_one() {
        let batch = decode(json!({
            "LAST_DOOR_OPEN_DURATION": 12,
            "ALARM": 0,
            "DOOR_OPEN_TIMES": 431,
            "BAT_V": 3.05,
            "MOD": 1,
            "DOOR_OPEN_STATUS": 0,
        }));
        let types: Vec<_> = batch
            .observations
            .iter()
            .map(|obs| (obs.metric_type.as_ref(), obs.value))
            .collect();
        assert_eq!(
            types,
            vec![
                ("lastOpenDuration", 12.0),
                ("alarm", 0.0),
                ("openCount", 431.0),
                ("batteryVolts", 3.05),
                ("mod", 1.0),
                ("openStatus", 0.0),
            ]
        );
    }

    #[test]
    fn climate_fields_skip_invalid_readings() {
        let batch = decode(json!({
            "TempC_SHT": 22.4,
            "TempC_DS": null,
            "Hum_SHT": "n/a",
            "Ext": 9,
        }));
        assert_eq!(batch.observations.len(), 1);
        assert_eq!(batch.observations[0].metric_type, "airTemperature");
        assert_eq!(batch.observations[0].value, 22.4);
    }
}

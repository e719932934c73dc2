//! 厂商载荷字段的宽松解析：字段缺失或取值无效时记为 None，绝不以 0 代替。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

/// 数值读数：仅接受 JSON 数字；null、字符串、布尔、对象均视为无效。
pub(crate) fn reading<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

/// 文本字段：仅接受 JSON 字符串。
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// 测量 ID：接受整数或数字字符串（"4097"）。
pub(crate) fn measurement_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.fract() == 0.0 && *value >= 0.0)
                .map(|value| value as u64)
        }),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(id.and_then(|id| u32::try_from(id).ok()))
}

/// 将厂商载荷解析为扁平字段结构；载荷不是 JSON 对象时返回全空字段。
pub(crate) fn vendor_fields<T>(vendor: &'static str, dev_eui: &str, object: &Value) -> T
where
    T: DeserializeOwned + Default,
{
    if !object.is_object() {
        if !object.is_null() {
            debug!(target: "lora.normalize", dev_eui = %dev_eui, vendor, "vendor_payload_not_object");
        }
        return T::default();
    }
    T::deserialize(object).unwrap_or_else(|err| {
        warn!(target: "lora.normalize", dev_eui = %dev_eui, vendor, error = %err, "vendor_payload_ignored");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "reading")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "measurement_id")]
        id: Option<u32>,
    }

    fn parse(object: Value) -> Fields {
        vendor_fields("test", "0000000000000000", &object)
    }

    #[test]
    fn zero_is_a_valid_reading() {
        assert_eq!(parse(json!({"value": 0})).value, Some(0.0));
        assert_eq!(parse(json!({"value": 0.0})).value, Some(0.0));
    }

    #[test]
    fn invalid_readings_are_absent() {
        assert_eq!(parse(json!({"value": null})).value, None);
        assert_eq!(parse(json!({"value": "21.5"})).value, None);
        assert_eq!(parse(json!({"value": true})).value, None);
        assert_eq!(parse(json!({"value": {"v": 1}})).value, None);
        assert_eq!(parse(json!({})).value, None);
    }

    #[test]
    fn measurement_ids_accept_numbers_and_strings() {
        assert_eq!(parse(json!({"id": 4097})).id, Some(4097));
        assert_eq!(parse(json!({"id": 4098.0})).id, Some(4098));
        assert_eq!(parse(json!({"id": "4197"})).id, Some(4197));
        assert_eq!(parse(json!({"id": 4097.5})).id, None);
        assert_eq!(parse(json!({"id": "temp"})).id, None);
    }

    #[test]
    fn non_object_payload_yields_empty_fields() {
        assert_eq!(parse(json!([1, 2])).value, None);
        assert_eq!(parse(Value::Null).value, None);
    }
}

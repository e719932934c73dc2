//! 地理关联：同一批次内的经纬度读数与其余读数配对。
//!
//! 单次遍历取批次中最后出现的经度与纬度（后写覆盖），随后为批次内
//! 每个非坐标观测生成一份带经纬度的副本。原始观测保持不变。
//!
//! 注意：坐标对会套用到整个批次，包括出现在坐标之前的读数。

use domain::{GeoPoint, MetricObservation};

pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";

fn is_coordinate(metric_type: &str) -> bool {
    metric_type == LONGITUDE || metric_type == LATITUDE
}

/// 返回新增的带地理标签观测；批次中缺少经度或纬度时返回空。
pub fn correlate(observations: &[MetricObservation]) -> Vec<MetricObservation> {
    let mut longitude = None;
    let mut latitude = None;
    for obs in observations {
        match obs.metric_type.as_ref() {
            LONGITUDE => longitude = Some(obs.value),
            LATITUDE => latitude = Some(obs.value),
            _ => {}
        }
    }
    let (Some(longitude), Some(latitude)) = (longitude, latitude) else {
        return Vec::new();
    };

    let point = GeoPoint::new(latitude, longitude);
    observations
        .iter()
        .filter(|obs| obs.geo.is_none() && !is_coordinate(&obs.metric_type))
        .map(|obs| obs.with_geo(point))
        .collect()
}

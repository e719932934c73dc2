//! 厂商载荷解码器，每个厂商一个模块，键为设备 EUI 的 OUI。

pub mod dragino;
pub mod milesight;
pub mod rejee;
pub mod sensecap;

use domain::MetricObservation;

/// 按 (读数, 指标类型) 映射表输出观测，跳过缺失或无效的读数。
pub(crate) fn mapped_observations(
    dev_eui: &str,
    mapping: &[(Option<f64>, &'static str)],
) -> Vec<MetricObservation> {
    mapping
        .iter()
        .filter_map(|(value, metric_type)| {
            value.map(|value| MetricObservation::new(dev_eui, *metric_type, value))
        })
        .collect()
}

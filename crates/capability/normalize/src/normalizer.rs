use crate::decoder::DecoderRegistry;
use crate::error::NormalizeError;
use crate::geo::correlate;
use crate::vendor::identify;
use domain::{
    DeviceCounter, DeviceGauge, DeviceLabels, LabelSet, MetricObservation, MetricsSink,
    UplinkEnvelope, VendorKey,
};
use lora_storage::DeviceRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

/// 标准化开关。
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizerConfig {
    /// 对支持的厂商批次做经纬度关联（METRICS_GEO）。
    pub geo_tagging: bool,
}

/// 单条上行的标准化结果。
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedUplink {
    pub dev_eui: String,
    pub vendor: VendorKey,
    pub first_seen: bool,
    /// 厂商未知或设备首次出现时为 true，调用方据此转储原始报文。
    pub needs_raw_dump: bool,
    /// 已输出的厂商观测（含地理关联副本）。
    pub observations: Vec<MetricObservation>,
}

/// 上行报文标准化编排。
///
/// 厂商解码是纯内存转换，先于任何指标输出执行；解码失败时
/// 不输出指标，也不改动设备注册表。
#[derive(Clone)]
pub struct Normalizer {
    decoders: DecoderRegistry,
    registry: Arc<DeviceRegistry>,
    sink: Arc<dyn MetricsSink>,
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(
        decoders: DecoderRegistry,
        registry: Arc<DeviceRegistry>,
        sink: Arc<dyn MetricsSink>,
        config: NormalizerConfig,
    ) -> Self {
        Self {
            decoders,
            registry,
            sink,
            config,
        }
    }

    pub fn normalize(&self, body: &[u8]) -> Result<NormalizedUplink, NormalizeError> {
        let envelope = UplinkEnvelope::from_slice(body)?;
        let dev_eui = envelope.dev_eui();
        let vendor = identify(dev_eui);

        let batch = self.decoders.decode(&envelope, &vendor)?;
        let mut observations = batch.observations;
        if self.config.geo_tagging && self.decoders.geo_tagging(&vendor) {
            let tagged = correlate(&observations);
            observations.extend(tagged);
        }

        let envelope_labels = DeviceLabels::new(envelope.device_name(), dev_eui);
        self.record_reception(&envelope, &envelope_labels);

        let first_seen = self.registry.upsert(dev_eui, envelope.device_name());
        let needs_raw_dump = batch.needs_raw_dump || first_seen;
        let labels = self.registry.labels_for(dev_eui).unwrap_or(envelope_labels);
        let device = LabelSet::device(&labels);

        if let Some(battery) = envelope.battery_level.filter(|level| *level > 0.0) {
            self.sink
                .set_gauge(DeviceGauge::BatteryPercent, &device, battery);
        }
        self.sink
            .set_gauge(DeviceGauge::FrameCount, &device, f64::from(envelope.f_cnt));
        let frame_counter = if envelope.confirmed {
            DeviceCounter::Confirmed
        } else {
            DeviceCounter::Unconfirmed
        };
        self.sink.inc_counter(frame_counter, &device);

        if let Some(delivery) = envelope.delivery_error() {
            warn!(
                target: "lora.normalize",
                dev_eui = %dev_eui,
                oui = %vendor,
                level = %delivery.level,
                code = %delivery.code,
                description = envelope.description.as_deref().unwrap_or_default(),
                "uplink_delivery_error"
            );
            self.sink.inc_counter(
                DeviceCounter::MessageLevel,
                &LabelSet::message_level(&labels, &delivery.level, &delivery.code),
            );
        }

        for obs in &observations {
            match &obs.geo {
                Some(geo) => self.sink.set_gauge(
                    DeviceGauge::GeoMetric,
                    &LabelSet::geo_metric(&labels, &obs.metric_type, geo),
                    obs.value,
                ),
                None => self.sink.set_gauge(
                    DeviceGauge::Metric,
                    &LabelSet::metric(&labels, &obs.metric_type),
                    obs.value,
                ),
            }
        }

        debug!(
            target: "lora.normalize",
            dev_eui = %dev_eui,
            oui = %vendor,
            vendor = self.decoders.vendor_name(&vendor).unwrap_or("unknown"),
            first_seen,
            needs_raw_dump,
            observations = observations.len(),
            "uplink_normalized"
        );

        Ok(NormalizedUplink {
            dev_eui: dev_eui.to_string(),
            vendor,
            first_seen,
            needs_raw_dump,
            observations,
        })
    }

    /// 每个网关接收报告输出 lastSeen / RSSI / SNR。
    fn record_reception(&self, envelope: &UplinkEnvelope, labels: &DeviceLabels) {
        let seen_at = envelope
            .time
            .unwrap_or_else(chrono::Utc::now)
            .timestamp() as f64;
        for report in &envelope.rx_info {
            let gateway = LabelSet::gateway(labels, &report.gateway_id);
            self.sink.set_gauge(DeviceGauge::LastSeen, &gateway, seen_at);
            self.sink
                .set_gauge(DeviceGauge::RxRssi, &gateway, f64::from(report.rssi));
            self.sink.set_gauge(DeviceGauge::RxSnr, &gateway, report.snr);
        }
    }
}

//! Prometheus 指标输出端。
//!
//! 所有指标注册到实例自有的 `Registry`（不使用全局默认注册表），
//! `/metrics` 通过 [`ExporterMetrics::render`] 输出文本格式。

use domain::sink::{
    LABEL_CODE, LABEL_DEVICE_EUI, LABEL_DEVICE_NAME, LABEL_GATEWAY_ID, LABEL_LAT, LABEL_LEVEL,
    LABEL_LON, LABEL_TYPE, LABEL_URL,
};
use domain::{DeviceCounter, DeviceGauge, ExporterCounter, ForwardCounter, LabelSet, MetricsSink};
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TEXT_FORMAT, TextEncoder,
};
use std::collections::HashMap;
use tracing::warn;

/// `/metrics` 响应的 Content-Type。
pub const CONTENT_TYPE: &str = TEXT_FORMAT;

const PREFIX: &str = "lora";
const APP_NAME: &str = "loraExporter";

const DEVICE_LABELS: &[&str] = &[LABEL_DEVICE_NAME, LABEL_DEVICE_EUI];
const GATEWAY_LABELS: &[&str] = &[LABEL_GATEWAY_ID, LABEL_DEVICE_NAME, LABEL_DEVICE_EUI];
const MSG_LEVEL_LABELS: &[&str] = &[LABEL_DEVICE_NAME, LABEL_DEVICE_EUI, LABEL_LEVEL, LABEL_CODE];
const FORWARD_LABELS: &[&str] = &[LABEL_URL];
const METRIC_LABELS: &[&str] = &[LABEL_DEVICE_NAME, LABEL_DEVICE_EUI, LABEL_TYPE];
const GEO_METRIC_LABELS: &[&str] = &[
    LABEL_DEVICE_NAME,
    LABEL_DEVICE_EUI,
    LABEL_TYPE,
    LABEL_LAT,
    LABEL_LON,
];

/// 指标注册与导出错误。
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("metrics encoding error: {0}")]
    Encoding(String),
}

/// 基于 Prometheus 的指标输出端。
#[derive(Clone)]
pub struct ExporterMetrics {
    registry: Registry,

    webhook_total: Counter,
    webhook_error_total: Counter,
    api_total: Counter,
    api_error_total: Counter,
    api_connection_total: Counter,
    api_connection_error_total: Counter,
    forward_total: CounterVec,
    forward_error_total: CounterVec,

    device_fcnt: GaugeVec,
    device_confirmed: CounterVec,
    device_unconfirmed: CounterVec,
    device_msg_level: CounterVec,
    device_battery: GaugeVec,
    device_external_power: GaugeVec,
    device_metric: GaugeVec,
    device_metric_geo: GaugeVec,
    device_lastseen: GaugeVec,
    device_rssi: GaugeVec,
    device_snr: GaugeVec,
}

fn name(suffix: &str) -> String {
    format!("{}_{}", PREFIX, suffix)
}

fn counter(registry: &Registry, suffix: &str, help: &str) -> Result<Counter, TelemetryError> {
    let counter = Counter::with_opts(Opts::new(name(suffix), help))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn counter_vec(
    registry: &Registry,
    suffix: &str,
    help: &str,
    labels: &[&str],
) -> Result<CounterVec, TelemetryError> {
    let counter = CounterVec::new(Opts::new(name(suffix), help), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn gauge_vec(
    registry: &Registry,
    suffix: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec, TelemetryError> {
    let gauge = GaugeVec::new(Opts::new(name(suffix), help), labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn label_values(labels: &LabelSet) -> HashMap<&str, &str> {
    labels.iter().collect()
}

impl ExporterMetrics {
    pub fn new(build_version: &str) -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let build_info = Gauge::with_opts(
            Opts::new(
                "build_info",
                "A metric with a constant '1' value labeled by the build of the binary.",
            )
            .const_label("appname", APP_NAME)
            .const_label("buildVersion", build_version),
        )?;
        registry.register(Box::new(build_info.clone()))?;
        build_info.set(1.0);

        Ok(Self {
            webhook_total: counter(&registry, "webhook_total", "The total number of webhook calls")?,
            webhook_error_total: counter(
                &registry,
                "webhook_error_total",
                "The total number of webhook errors",
            )?,
            api_total: counter(&registry, "api_total", "The total number of device directory calls")?,
            api_error_total: counter(
                &registry,
                "api_error_total",
                "The total number of failed device directory calls",
            )?,
            api_connection_total: counter(
                &registry,
                "api_connection_total",
                "The total number of device directory polling rounds",
            )?,
            api_connection_error_total: counter(
                &registry,
                "api_connection_error_total",
                "The total number of polling rounds without directory connection",
            )?,
            forward_total: counter_vec(
                &registry,
                "forward_total",
                "The total number of forwarded webhooks",
                FORWARD_LABELS,
            )?,
            forward_error_total: counter_vec(
                &registry,
                "forward_error_total",
                "The total number of forwarded webhooks errors",
                FORWARD_LABELS,
            )?,
            device_fcnt: gauge_vec(&registry, "devices_fcnt", "Frame Count of device", DEVICE_LABELS)?,
            device_confirmed: counter_vec(
                &registry,
                "devices_confirmed_count",
                "confirmed count",
                DEVICE_LABELS,
            )?,
            device_unconfirmed: counter_vec(
                &registry,
                "devices_unconfirmed_count",
                "unconfirmed count",
                DEVICE_LABELS,
            )?,
            device_msg_level: counter_vec(
                &registry,
                "devices_msg_level_count",
                "device msg level/type count",
                MSG_LEVEL_LABELS,
            )?,
            device_battery: gauge_vec(
                &registry,
                "devices_battery_percent",
                "Battery level of device",
                DEVICE_LABELS,
            )?,
            device_external_power: gauge_vec(
                &registry,
                "devices_externalpower",
                "External powersource of device",
                DEVICE_LABELS,
            )?,
            device_metric: gauge_vec(
                &registry,
                "devices_metric",
                "metric value of device",
                METRIC_LABELS,
            )?,
            device_metric_geo: gauge_vec(
                &registry,
                "devices_metric_geo",
                "metric value of device with location",
                GEO_METRIC_LABELS,
            )?,
            device_lastseen: gauge_vec(
                &registry,
                "devices_lastseen",
                "last seen value of device",
                GATEWAY_LABELS,
            )?,
            device_rssi: gauge_vec(
                &registry,
                "devices_rxinfo_rssi_db",
                "RSSI of RX from device",
                GATEWAY_LABELS,
            )?,
            device_snr: gauge_vec(
                &registry,
                "devices_rxinfo_snr_db",
                "SNR of RX from device",
                GATEWAY_LABELS,
            )?,
            registry,
        })
    }

    /// Prometheus 文本格式输出。
    pub fn render(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| TelemetryError::Encoding(err.to_string()))
    }

    fn gauge(&self, gauge: DeviceGauge) -> &GaugeVec {
        match gauge {
            DeviceGauge::FrameCount => &self.device_fcnt,
            DeviceGauge::LastSeen => &self.device_lastseen,
            DeviceGauge::RxRssi => &self.device_rssi,
            DeviceGauge::RxSnr => &self.device_snr,
            DeviceGauge::BatteryPercent => &self.device_battery,
            DeviceGauge::ExternalPower => &self.device_external_power,
            DeviceGauge::Metric => &self.device_metric,
            DeviceGauge::GeoMetric => &self.device_metric_geo,
        }
    }

    fn counter(&self, counter: DeviceCounter) -> &CounterVec {
        match counter {
            DeviceCounter::Confirmed => &self.device_confirmed,
            DeviceCounter::Unconfirmed => &self.device_unconfirmed,
            DeviceCounter::MessageLevel => &self.device_msg_level,
        }
    }
}

impl MetricsSink for ExporterMetrics {
    fn set_gauge(&self, gauge: DeviceGauge, labels: &LabelSet, value: f64) {
        match self.gauge(gauge).get_metric_with(&label_values(labels)) {
            Ok(metric) => metric.set(value),
            Err(err) => {
                warn!(target: "lora.telemetry", gauge = ?gauge, error = %err, "gauge_labels_rejected")
            }
        }
    }

    fn inc_counter(&self, counter: DeviceCounter, labels: &LabelSet) {
        match self.counter(counter).get_metric_with(&label_values(labels)) {
            Ok(metric) => metric.inc(),
            Err(err) => {
                warn!(target: "lora.telemetry", counter = ?counter, error = %err, "counter_labels_rejected")
            }
        }
    }

    fn inc_exporter(&self, counter: ExporterCounter) {
        let counter = match counter {
            ExporterCounter::Webhook => &self.webhook_total,
            ExporterCounter::WebhookError => &self.webhook_error_total,
            ExporterCounter::Api => &self.api_total,
            ExporterCounter::ApiError => &self.api_error_total,
            ExporterCounter::ApiConnection => &self.api_connection_total,
            ExporterCounter::ApiConnectionError => &self.api_connection_error_total,
        };
        counter.inc();
    }

    fn inc_forward(&self, counter: ForwardCounter, url: &str) {
        let counter = match counter {
            ForwardCounter::Forwarded => &self.forward_total,
            ForwardCounter::ForwardError => &self.forward_error_total,
        };
        counter.with_label_values(&[url]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{DeviceLabels, GeoPoint};

    fn metrics() -> ExporterMetrics {
        ExporterMetrics::new("test").expect("metrics")
    }

    #[test]
    fn build_info_is_exported() {
        let text = metrics().render().expect("render");
        assert!(text.contains("build_info{appname=\"loraExporter\",buildVersion=\"test\"} 1"));
    }

    #[test]
    fn device_metric_is_rendered_with_labels() {
        let metrics = metrics();
        let device = DeviceLabels::new("tilt-1", "24E124000000000A");
        metrics.set_gauge(DeviceGauge::Metric, &LabelSet::metric(&device, "distance"), 1200.0);
        metrics.set_gauge(
            DeviceGauge::GeoMetric,
            &LabelSet::geo_metric(&device, "distance", &GeoPoint::new(20.0, 10.0)),
            1200.0,
        );
        metrics.inc_counter(DeviceCounter::Confirmed, &LabelSet::device(&device));

        let text = metrics.render().expect("render");
        assert!(text.contains(
            "lora_devices_metric{deviceEui=\"24E124000000000A\",deviceName=\"tilt-1\",type=\"distance\"} 1200"
        ));
        assert!(text.contains(
            "lora_devices_metric_geo{deviceEui=\"24E124000000000A\",deviceName=\"tilt-1\",lat=\"20.0\",lon=\"10.0\",type=\"distance\"} 1200"
        ));
        assert!(text.contains(
            "lora_devices_confirmed_count{deviceEui=\"24E124000000000A\",deviceName=\"tilt-1\"} 1"
        ));
    }

    #[test]
    fn mismatched_labels_are_dropped() {
        let metrics = metrics();
        let device = DeviceLabels::new("tilt-1", "24E124000000000A");
        metrics.set_gauge(DeviceGauge::FrameCount, &LabelSet::metric(&device, "distance"), 3.0);
        let text = metrics.render().expect("render");
        assert!(!text.contains("lora_devices_fcnt{"));
    }

    #[test]
    fn exporter_counters_increment() {
        let metrics = metrics();
        metrics.inc_exporter(ExporterCounter::Webhook);
        metrics.inc_exporter(ExporterCounter::Webhook);
        metrics.inc_exporter(ExporterCounter::ApiConnectionError);
        let text = metrics.render().expect("render");
        assert!(text.contains("lora_webhook_total 2"));
        assert!(text.contains("lora_api_connection_error_total 1"));
        assert!(text.contains("lora_webhook_error_total 0"));
    }

    #[test]
    fn forward_counters_are_labelled_by_url() {
        let metrics = metrics();
        metrics.inc_forward(ForwardCounter::Forwarded, "http://collector:8080/hook");
        metrics.inc_forward(ForwardCounter::Forwarded, "http://collector:8080/hook");
        metrics.inc_forward(ForwardCounter::ForwardError, "http://backup:8080/hook");
        let text = metrics.render().expect("render");
        assert!(text.contains("lora_forward_total{url=\"http://collector:8080/hook\"} 2"));
        assert!(text.contains("lora_forward_error_total{url=\"http://backup:8080/hook\"} 1"));
        assert!(!text.contains("lora_forward_error_total{url=\"http://collector:8080/hook\"}"));
    }
}

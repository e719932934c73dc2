use crate::{DeviceDirectory, DeviceStatus};
use domain::{DeviceGauge, DeviceLabels, ExporterCounter, LabelSet, MetricsSink};
use lora_storage::DeviceRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// 单轮轮询统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub queried: usize,
    pub succeeded: usize,
    pub evicted: usize,
}

/// 设备状态定时轮询。
///
/// 每轮遍历注册表快照；查询失败的设备从注册表移除，待其下一次上行时重新登记。
#[derive(Clone)]
pub struct StatusPoller {
    registry: Arc<DeviceRegistry>,
    directory: Arc<dyn DeviceDirectory>,
    sink: Arc<dyn MetricsSink>,
}

impl StatusPoller {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        directory: Arc<dyn DeviceDirectory>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            registry,
            directory,
            sink,
        }
    }

    pub async fn poll_once(&self) -> PollSummary {
        let ids = self.registry.all_known_ids();
        if ids.is_empty() {
            debug!(target: "lora.directory", "status_poll_no_devices");
            return PollSummary::default();
        }
        self.sink.inc_exporter(ExporterCounter::ApiConnection);

        let mut summary = PollSummary {
            queried: ids.len(),
            ..PollSummary::default()
        };
        let mut unreachable = 0;
        for dev_eui in &ids {
            match self.directory.lookup_status(dev_eui).await {
                Ok(status) => {
                    self.sink.inc_exporter(ExporterCounter::Api);
                    summary.succeeded += 1;
                    // 查询期间设备可能已被移除，此时不再写入指标
                    if let Some(labels) = self.registry.labels_for(dev_eui) {
                        self.record_status(&labels, status);
                    }
                }
                Err(err) => {
                    self.sink.inc_exporter(ExporterCounter::ApiError);
                    if err.is_unreachable() {
                        unreachable += 1;
                    }
                    warn!(target: "lora.directory", dev_eui = %dev_eui, error = %err, "device_lookup_failed");
                    if self.registry.evict(dev_eui) {
                        summary.evicted += 1;
                    }
                }
            }
        }
        if unreachable == ids.len() {
            self.sink.inc_exporter(ExporterCounter::ApiConnectionError);
        }

        debug!(
            target: "lora.directory",
            queried = summary.queried,
            succeeded = summary.succeeded,
            evicted = summary.evicted,
            "status_poll_finished"
        );
        summary
    }

    fn record_status(&self, labels: &DeviceLabels, status: DeviceStatus) {
        let device = LabelSet::device(labels);
        if let Some(battery) = status.battery_level.filter(|level| *level > 0.0) {
            self.sink
                .set_gauge(DeviceGauge::BatteryPercent, &device, battery);
        }
        if let Some(external) = status.external_power {
            let value = if external { 1.0 } else { 0.0 };
            self.sink.set_gauge(DeviceGauge::ExternalPower, &device, value);
        }
    }

    /// 后台定时轮询；上一轮未结束时跳过错过的触发，轮次之间不会重叠。
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        info!(target: "lora.directory", interval_secs = every.as_secs(), "status_poller_started");
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.poll_once().await;
            }
        })
    }
}

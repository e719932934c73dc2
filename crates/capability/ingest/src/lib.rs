//! Webhook 报文处理：标准化 + 原始报文转储策略 + 转发。

pub mod forward;

pub use forward::{
    FORWARD_QUEUE_CAPACITY, ForwardError, ForwardQueue, ForwardSummary, Forwarder,
    HttpWebhookTarget, WebhookTarget,
};

use domain::{ExporterCounter, MetricObservation, MetricsSink};
use lora_normalize::{NormalizeError, Normalizer};
use lora_storage::{RawPayloadStore, StorageError};
use std::sync::Arc;
use tracing::{error, warn};

/// 接入错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 报文无法标准化；原始报文已尽量落盘。
    #[error("{source}")]
    Normalize {
        #[source]
        source: NormalizeError,
        dump_location: Option<String>,
    },
    #[error("dump error: {0}")]
    Dump(#[from] StorageError),
}

impl IngestError {
    pub fn dump_location(&self) -> Option<&str> {
        match self {
            Self::Normalize { dump_location, .. } => dump_location.as_deref(),
            Self::Dump(_) => None,
        }
    }
}

/// 单条 Webhook 报文的处理结果。
#[derive(Debug, Clone, PartialEq)]
pub struct UplinkOutcome {
    pub dev_eui: String,
    pub dump_location: Option<String>,
    pub observations: Vec<MetricObservation>,
}

/// Webhook 报文处理器。
#[derive(Clone)]
pub struct UplinkProcessor {
    normalizer: Normalizer,
    dump_store: Arc<dyn RawPayloadStore>,
    sink: Arc<dyn MetricsSink>,
    /// 调试模式：每条报文都落盘。
    debug: bool,
    /// 配置了 FORWARD 时，解析成功的报文入队转发。
    forward: Option<ForwardQueue>,
}

impl UplinkProcessor {
    pub fn new(
        normalizer: Normalizer,
        dump_store: Arc<dyn RawPayloadStore>,
        sink: Arc<dyn MetricsSink>,
        debug: bool,
    ) -> Self {
        Self {
            normalizer,
            dump_store,
            sink,
            debug,
            forward: None,
        }
    }

    pub fn with_forwarding(mut self, queue: ForwardQueue) -> Self {
        self.forward = Some(queue);
        self
    }

    pub async fn process(&self, body: &[u8]) -> Result<UplinkOutcome, IngestError> {
        self.sink.inc_exporter(ExporterCounter::Webhook);
        let result = self.normalizer.normalize(body);

        let mut dump_location = None;
        let wants_dump =
            self.debug || result.as_ref().is_ok_and(|uplink| uplink.needs_raw_dump);
        if wants_dump {
            dump_location = self.try_dump(body).await;
        }

        match result {
            Ok(uplink) => {
                if let Some(queue) = &self.forward {
                    queue.enqueue(body);
                }
                Ok(UplinkOutcome {
                    dev_eui: uplink.dev_eui,
                    dump_location,
                    observations: uplink.observations,
                })
            }
            Err(source) => {
                self.sink.inc_exporter(ExporterCounter::WebhookError);
                if dump_location.is_none() {
                    dump_location = self.try_dump(body).await;
                }
                error!(
                    target: "lora.ingest",
                    error = %source,
                    dump_location = dump_location.as_deref().unwrap_or_default(),
                    "uplink_rejected"
                );
                Err(IngestError::Normalize {
                    source,
                    dump_location,
                })
            }
        }
    }

    /// 原样落盘（/dump 接口），失败直接返回。
    pub async fn dump_raw(&self, body: &[u8]) -> Result<String, IngestError> {
        self.sink.inc_exporter(ExporterCounter::Webhook);
        match self.dump_store.persist(body).await {
            Ok(location) => Ok(location),
            Err(err) => {
                self.sink.inc_exporter(ExporterCounter::WebhookError);
                Err(err.into())
            }
        }
    }

    /// 转储失败只记录日志，不影响报文处理结果。
    async fn try_dump(&self, body: &[u8]) -> Option<String> {
        match self.dump_store.persist(body).await {
            Ok(location) => Some(location),
            Err(err) => {
                warn!(target: "lora.ingest", error = %err, bytes = body.len(), "raw_payload_dump_failed");
                None
            }
        }
    }
}

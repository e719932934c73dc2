//! LoRaWAN Webhook 接收与 Prometheus 指标导出。

mod handlers;
mod middleware;
mod routes;
mod utils;

use domain::MetricsSink;
use lora_config::AppConfig;
use lora_directory::{ChirpstackDirectory, DirectorySettings, StatusPoller};
use lora_ingest::{FORWARD_QUEUE_CAPACITY, Forwarder, HttpWebhookTarget, UplinkProcessor};
use lora_normalize::{DecoderRegistry, Normalizer, NormalizerConfig};
use lora_storage::{DeviceRegistry, FileDumpStore};
use lora_telemetry::{ExporterMetrics, init_tracing};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 单次转发请求超时。
const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub processor: UplinkProcessor,
    pub metrics: Arc<ExporterMetrics>,
    /// 设置后 Webhook / dump 请求必须携带该密钥。
    pub auth_key: Option<Arc<str>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing(config.debug);
    info!(
        target: "lora.http",
        interval_secs = config.interval.as_secs(),
        build_version = env!("CARGO_PKG_VERSION"),
        "lora_exporter_started"
    );

    let metrics = Arc::new(ExporterMetrics::new(env!("CARGO_PKG_VERSION"))?);
    let sink: Arc<dyn MetricsSink> = metrics.clone();
    let registry = Arc::new(DeviceRegistry::new());

    // 上行报文标准化 + 原始报文转储
    let normalizer = Normalizer::new(
        DecoderRegistry::with_defaults(),
        registry.clone(),
        sink.clone(),
        NormalizerConfig {
            geo_tagging: config.metrics_geo,
        },
    );
    let mut processor = UplinkProcessor::new(
        normalizer,
        Arc::new(FileDumpStore::new(config.dump_folder.clone())),
        sink.clone(),
        config.debug,
    );

    // Webhook 转发（FORWARD）
    if !config.forward.is_empty() {
        let target = HttpWebhookTarget::new(FORWARD_TIMEOUT)?;
        let (queue, _) = Forwarder::new(config.forward.clone(), Arc::new(target), sink.clone())
            .spawn(FORWARD_QUEUE_CAPACITY);
        processor = processor.with_forwarding(queue);
    }

    // 设备状态轮询（需要 APISERVER 与令牌）
    match (config.api_server.clone(), config.resolve_api_key()) {
        (Some(server), Some(api_key)) => {
            info!(target: "lora.directory", server = %server, interval_secs = config.interval.as_secs(), "device_status_polling_enabled");
            let directory = ChirpstackDirectory::new(DirectorySettings::new(server, api_key))?;
            StatusPoller::new(registry.clone(), Arc::new(directory), sink.clone())
                .spawn(config.interval);
        }
        (Some(_), None) => {
            info!(target: "lora.directory", reason = "no api key", "device_status_polling_disabled");
        }
        (None, _) => {
            info!(target: "lora.directory", reason = "no APISERVER defined", "device_status_polling_disabled");
        }
    }

    let state = AppState {
        processor,
        metrics,
        auth_key: config.auth_key.as_deref().map(Arc::from),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!(target: "lora.http", listen = %config.listen, "http_listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

//! Webhook 转发：解析成功的原始报文交给后台任务，逐个 POST 到 FORWARD 目标。
//!
//! 入队使用有界通道的 `try_send`，Webhook 响应不等待转发完成。

use async_trait::async_trait;
use domain::{ForwardCounter, MetricsSink};
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 待转发报文队列容量。
pub const FORWARD_QUEUE_CAPACITY: usize = 256;

/// 转发错误。
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("forward client error: {0}")]
    Client(String),
    #[error("forward request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("forward to {url} got status {status}")]
    Status { url: String, status: u16 },
}

/// 转发目标抽象。
#[async_trait]
pub trait WebhookTarget: Send + Sync {
    async fn post(&self, url: &str, body: &[u8]) -> Result<(), ForwardError>;
}

/// 基于 reqwest 的 HTTP 转发，只有 200 视为成功。
#[derive(Debug, Clone)]
pub struct HttpWebhookTarget {
    client: Client,
}

impl HttpWebhookTarget {
    pub fn new(timeout: Duration) -> Result<Self, ForwardError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ForwardError::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTarget for HttpWebhookTarget {
    async fn post(&self, url: &str, body: &[u8]) -> Result<(), ForwardError> {
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .await
            .map_err(|err| ForwardError::Request {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(ForwardError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

/// 转发队列发送端。
#[derive(Debug, Clone)]
pub struct ForwardQueue {
    sender: mpsc::Sender<Vec<u8>>,
}

impl ForwardQueue {
    /// 新建队列，返回发送端与接收端。
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// 非阻塞入队；队列已满或后台任务已退出时丢弃并返回 false。
    pub fn enqueue(&self, body: &[u8]) -> bool {
        match self.sender.try_send(body.to_vec()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(target: "lora.forward", bytes = body.len(), "forward_queue_full");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(target: "lora.forward", bytes = body.len(), "forward_queue_closed");
                false
            }
        }
    }
}

/// 单条报文的转发统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    pub forwarded: usize,
    pub failed: usize,
}

/// 后台转发任务。
#[derive(Clone)]
pub struct Forwarder {
    urls: Vec<String>,
    target: Arc<dyn WebhookTarget>,
    sink: Arc<dyn MetricsSink>,
}

impl Forwarder {
    pub fn new(
        urls: Vec<String>,
        target: Arc<dyn WebhookTarget>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self { urls, target, sink }
    }

    /// 依次转发到每个目标；某个目标失败不影响其余目标。
    pub async fn forward(&self, body: &[u8]) -> ForwardSummary {
        let mut summary = ForwardSummary::default();
        for url in &self.urls {
            match self.target.post(url, body).await {
                Ok(()) => {
                    debug!(target: "lora.forward", url = %url, bytes = body.len(), "webhook_forwarded");
                    self.sink.inc_forward(ForwardCounter::Forwarded, url);
                    summary.forwarded += 1;
                }
                Err(err) => {
                    error!(target: "lora.forward", url = %url, error = %err, "webhook_forward_failed");
                    self.sink.inc_forward(ForwardCounter::ForwardError, url);
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// 消费队列直到所有发送端关闭。
    pub async fn run(self, mut receiver: mpsc::Receiver<Vec<u8>>) {
        while let Some(body) = receiver.recv().await {
            self.forward(&body).await;
        }
        debug!(target: "lora.forward", "forward_queue_drained");
    }

    pub fn spawn(self, capacity: usize) -> (ForwardQueue, JoinHandle<()>) {
        for url in &self.urls {
            info!(target: "lora.forward", url = %url, "webhook_forwarding_enabled");
        }
        let (queue, receiver) = ForwardQueue::channel(capacity);
        (queue, tokio::spawn(self.run(receiver)))
    }
}

//! 路由定义
//!
//! - Webhook：POST / 与 POST /hook，其他方法 301 重定向到 /metrics；
//!   未匹配的路径按 / 处理
//! - 原始报文转储：POST /dump
//! - 指标导出：GET /metrics
//! - 健康检查：GET /health

use crate::AppState;
use crate::handlers::{dump, health, lost_soul, metrics, webhook};
use crate::middleware::request_context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(webhook).fallback(lost_soul))
        .route("/hook", post(webhook).fallback(lost_soul))
        .route("/dump", post(dump))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .fallback(post(webhook).fallback(lost_soul))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::AppState;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use domain::MetricsSink;
    use http_body_util::BodyExt;
    use lora_ingest::UplinkProcessor;
    use lora_normalize::{DecoderRegistry, Normalizer, NormalizerConfig};
    use lora_storage::{DeviceRegistry, FileDumpStore};
    use lora_telemetry::ExporterMetrics;
    use std::sync::Arc;
    use tower::ServiceExt;

    const UPLINK: &str = r#"{
        "deviceInfo": {"devEui": "24E124000000000A", "deviceName": "tilt-1"},
        "fCnt": 12,
        "rxInfo": [{"gatewayId": "0016c001ff10a235", "rssi": -88, "snr": 9.5}],
        "object": {"distance": 1200, "position": "normal"}
    }"#;

    fn router(dir: &tempfile::TempDir, auth_key: Option<&str>) -> Router {
        let metrics = Arc::new(ExporterMetrics::new("test").expect("metrics"));
        let sink: Arc<dyn MetricsSink> = metrics.clone();
        let normalizer = Normalizer::new(
            DecoderRegistry::with_defaults(),
            Arc::new(DeviceRegistry::new()),
            sink.clone(),
            NormalizerConfig::default(),
        );
        let processor = UplinkProcessor::new(
            normalizer,
            Arc::new(FileDumpStore::new(dir.path())),
            sink,
            false,
        );
        create_router(AppState {
            processor,
            metrics,
            auth_key: auth_key.map(Arc::from),
        })
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn webhook_updates_metrics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router(&dir, None);

        let response = app.clone().oneshot(post("/hook", UPLINK)).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "ok");

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains(
            "lora_devices_metric{deviceEui=\"24E124000000000A\",deviceName=\"tilt-1\",type=\"distance\"} 1200"
        ));
        assert!(text.contains(
            "lora_devices_rxinfo_rssi_db{deviceEui=\"24E124000000000A\",deviceName=\"tilt-1\",gatewayId=\"0016c001ff10a235\"} -88"
        ));
        assert!(text.contains("lora_webhook_total 1"));

        // 首次出现的设备会被转储
        assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 1);
    }

    #[tokio::test]
    async fn malformed_webhook_is_rejected_and_dumped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router(&dir, None);

        let response = app.oneshot(post("/", "{broken")).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("invalid envelope"));
        assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 1);
    }

    #[tokio::test]
    async fn non_post_redirects_to_metrics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router(&dir, None);

        for uri in ["/", "/hook"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
            assert_eq!(
                response.headers().get(header::LOCATION).map(|value| value.as_bytes()),
                Some(&b"/metrics"[..])
            );
        }
    }

    #[tokio::test]
    async fn unknown_paths_behave_like_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router(&dir, None);

        let response = app
            .clone()
            .oneshot(post("/chirpstack/uplink", UPLINK))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");

        let response = app
            .oneshot(Request::get("/favicon.ico").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).map(|value| value.as_bytes()),
            Some(&b"/metrics"[..])
        );
    }

    #[tokio::test]
    async fn dump_reports_location() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router(&dir, None);

        let response = app.clone().oneshot(post("/dump", "anything")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.starts_with("dumped to "));
        let location = text.trim_start_matches("dumped to ").trim_end();
        assert_eq!(std::fs::read_to_string(location).expect("dump"), "anything");

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert!(body_text(response).await.contains("lora_webhook_total 1"));
    }

    #[tokio::test]
    async fn auth_key_is_enforced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = router(&dir, Some("hook-secret"));

        let response = app.clone().oneshot(post("/hook", UPLINK)).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .method("POST")
            .uri("/hook")
            .header(header::AUTHORIZATION, "Bearer hook-secret")
            .body(Body::from(UPLINK))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}

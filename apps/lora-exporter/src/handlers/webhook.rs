//! Webhook 与原始报文转储。
//!
//! - POST / 、POST /hook
//! - POST /dump

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::{error, info};

use crate::AppState;
use crate::middleware::require_auth_key;
use crate::utils::client::ClientInfo;

pub async fn webhook(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client = ClientInfo::from_request(&headers, peer.map(|ConnectInfo(addr)| addr));
    if let Err(response) = require_auth_key(&state, &headers) {
        info!(target: "lora.http", ip = %client.ip, user_agent = %client.user_agent, "webhook_unauthorized");
        return response;
    }

    match state.processor.process(&body).await {
        Ok(outcome) => {
            info!(
                target: "lora.http",
                dev_eui = %outcome.dev_eui,
                dump = outcome.dump_location.as_deref().unwrap_or_default(),
                ip = %client.ip,
                user_agent = %client.user_agent,
                size = body.len(),
                "webhook_received"
            );
            (StatusCode::OK, "ok").into_response()
        }
        Err(err) => {
            error!(
                target: "lora.http",
                error = %err,
                dump = err.dump_location().unwrap_or_default(),
                ip = %client.ip,
                user_agent = %client.user_agent,
                "webhook_parse_failed"
            );
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
    }
}

pub async fn dump(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client = ClientInfo::from_request(&headers, peer.map(|ConnectInfo(addr)| addr));
    if let Err(response) = require_auth_key(&state, &headers) {
        return response;
    }

    match state.processor.dump_raw(&body).await {
        Ok(location) => {
            info!(target: "lora.http", dump = %location, ip = %client.ip, size = body.len(), "raw_payload_received");
            (StatusCode::OK, format!("dumped to {}\n", location)).into_response()
        }
        Err(err) => {
            error!(target: "lora.http", error = %err, ip = %client.ip, "raw_payload_dump_failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// 非 POST 请求重定向到 /metrics。
pub async fn lost_soul(
    method: Method,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let client = ClientInfo::from_request(&headers, peer.map(|ConnectInfo(addr)| addr));
    info!(
        target: "lora.http",
        method = %method,
        ip = %client.ip,
        user_agent = %client.user_agent,
        "request_redirected"
    );
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/metrics")],
    )
        .into_response()
}

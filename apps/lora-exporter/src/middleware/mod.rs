//! 请求中间件与访问校验
//!
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - require_auth_key：校验 Webhook 访问密钥（AUTHKEY）

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use lora_telemetry::new_request_ids;
use subtle::ConstantTimeEq;
use tracing::{Instrument, info_span};

use crate::AppState;

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// Authorization 头中的密钥：`<key>` 或 `Bearer <key>`。
pub fn authorization_key(headers: &HeaderMap) -> Option<&str> {
    let header_value = headers.get(header::AUTHORIZATION)?;
    let auth_str = header_value.to_str().ok()?.trim();
    Some(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str))
}

/// 未配置 AUTHKEY 时放行；否则要求 Authorization 与其一致。
pub fn require_auth_key(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = state.auth_key.as_deref() else {
        return Ok(());
    };
    let provided = authorization_key(headers).unwrap_or_default();
    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "unauthorized").into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::authorization_key;
    use axum::http::{HeaderMap, HeaderValue, header};

    #[test]
    fn authorization_key_accepts_plain_and_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer key-1"));
        assert_eq!(authorization_key(&headers), Some("key-1"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("key-2"));
        assert_eq!(authorization_key(&headers), Some("key-2"));

        assert_eq!(authorization_key(&HeaderMap::new()), None);
    }
}

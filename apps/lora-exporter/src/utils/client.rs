//! 请求来源信息（仅用于日志）。

use axum::http::{HeaderMap, header};
use std::net::SocketAddr;

/// 客户端地址与 User-Agent，已过滤为 ASCII。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

impl ClientInfo {
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            ip: client_ip(headers, peer),
            user_agent: filter_ascii(&header_text(headers, header::USER_AGENT.as_str())),
        }
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// X-Real-Ip，其次 X-Forwarded-For，最后对端地址；去掉端口。
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = ["x-real-ip", "x-forwarded-for"]
        .iter()
        .map(|name| header_text(headers, name))
        .find(|value| !value.trim().is_empty());
    let ip = match forwarded {
        Some(value) => strip_port(value.trim()),
        None => peer.map(|addr| addr.ip().to_string()).unwrap_or_default(),
    };
    filter_ascii(&ip)
}

fn strip_port(value: &str) -> String {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }
    value.to_string()
}

/// 去除非 ASCII 字符。
pub fn filter_ascii(value: &str) -> String {
    value.chars().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.1.2.3:45678".parse().expect("addr"))
    }

    #[test]
    fn real_ip_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.7"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.1"));
        assert_eq!(client_ip(&headers, peer()), "192.0.2.7");
    }

    #[test]
    fn forwarded_for_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.1:8080"));
        assert_eq!(client_ip(&headers, peer()), "198.51.100.1");
        assert_eq!(client_ip(&HeaderMap::new(), peer()), "10.1.2.3");
        assert_eq!(client_ip(&HeaderMap::new(), None), "");
    }

    #[test]
    fn non_ascii_is_removed() {
        assert_eq!(filter_ascii("curl/8.0 ✓ö"), "curl/8.0 ");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_bytes("agent-ü".as_bytes()).expect("header"),
        );
        let client = ClientInfo::from_request(&headers, None);
        assert_eq!(client.user_agent, "agent-");
    }
}

//! 应用运行配置加载。

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP 监听地址（LISTEN）。
    pub listen: String,
    /// 设备状态轮询间隔（INTERVAL，秒）。
    pub interval: Duration,
    /// 原始报文转储目录（DUMP_FOLDER）。
    pub dump_folder: PathBuf,
    /// 调试模式：转储所有报文并输出 debug 日志（DEBUG）。
    pub debug: bool,
    /// 地理关联（METRICS_GEO）。
    pub metrics_geo: bool,
    /// 设备目录地址（APISERVER），未设置时不轮询。
    pub api_server: Option<String>,
    pub api_key: Option<String>,
    /// 未设置 APIKEY 时从该文件首行读取令牌（APIFILE）。
    pub api_file: PathBuf,
    /// Webhook / dump 接口的访问密钥（AUTHKEY）。
    pub auth_key: Option<String>,
    /// 解析成功的 Webhook 原样转发的目标（FORWARD，逗号分隔）。
    pub forward: Vec<String>,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:5672".to_string());
        let interval_secs = read_u64_with_default("INTERVAL", 300)?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "INTERVAL".to_string(),
                interval_secs.to_string(),
            ));
        }
        let dump_folder = read_optional("DUMP_FOLDER").unwrap_or_else(|| ".".to_string());
        let debug = read_bool_with_default("DEBUG", false);
        let metrics_geo = read_bool_with_default("METRICS_GEO", false);
        let api_server = read_optional("APISERVER");
        let api_key = read_optional("APIKEY");
        let api_file = read_optional("APIFILE").unwrap_or_else(|| "apikey.txt".to_string());
        let auth_key = read_optional("AUTHKEY");
        let forward = read_list("FORWARD");

        Ok(Self {
            listen,
            interval: Duration::from_secs(interval_secs),
            dump_folder: PathBuf::from(dump_folder),
            debug,
            metrics_geo,
            api_server,
            api_key,
            api_file: PathBuf::from(api_file),
            auth_key,
            forward,
        })
    }

    /// 设备目录令牌：APIKEY 优先，否则取 APIFILE 首行（去除首尾空白）。
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }
        let content = fs::read_to_string(&self.api_file).ok()?;
        content
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) if value.is_empty() => return Ok(default),
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_list(key: &str) -> Vec<String> {
    read_optional(key)
        .map(|value| parse_list(&value))
        .unwrap_or_default()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}

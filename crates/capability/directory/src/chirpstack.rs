//! ChirpStack REST 设备目录：`GET {server}/api/devices/{devEui}`。

use crate::error::DirectoryError;
use crate::{DeviceDirectory, DeviceStatus};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// 目录连接参数。
#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub server: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl DirectorySettings {
    pub fn new(server: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceResponse {
    #[serde(default)]
    device_status: Option<DeviceStatusBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceStatusBody {
    #[serde(default)]
    battery_level: Option<f64>,
    #[serde(default)]
    external_power_source: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ChirpstackDirectory {
    client: Client,
    settings: DirectorySettings,
}

impl ChirpstackDirectory {
    pub fn new(settings: DirectorySettings) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| DirectoryError::Unreachable(err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn device_url(&self, dev_eui: &str) -> String {
        format!(
            "{}/api/devices/{}",
            self.settings.server.trim_end_matches('/'),
            dev_eui
        )
    }
}

#[async_trait]
impl DeviceDirectory for ChirpstackDirectory {
    async fn lookup_status(&self, dev_eui: &str) -> Result<DeviceStatus, DirectoryError> {
        let response = self
            .client
            .get(self.device_url(dev_eui))
            .bearer_auth(&self.settings.api_key)
            .send()
            .await
            .map_err(|err| DirectoryError::Unreachable(err.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(DirectoryError::NotFound(dev_eui.to_string())),
            status => {
                return Err(DirectoryError::Status {
                    dev_eui: dev_eui.to_string(),
                    status: status.as_u16(),
                });
            }
        }

        let body: DeviceResponse = response
            .json()
            .await
            .map_err(|err| DirectoryError::Decode(err.to_string()))?;
        let status = body.device_status.unwrap_or_default();
        Ok(DeviceStatus {
            battery_level: status.battery_level,
            external_power: status.external_power_source,
        })
    }
}

//! 上行报文标准化：厂商识别 -> 厂商解码 -> 地理关联 -> 设备注册 -> 指标输出。

pub mod decoder;
pub mod error;
pub mod geo;
pub mod normalizer;
mod reading;
pub mod vendor;
pub mod vendors;

pub use decoder::{DecodedBatch, DecoderRegistry, VendorDecoder};
pub use error::NormalizeError;
pub use geo::{LATITUDE, LONGITUDE, correlate};
pub use normalizer::{NormalizedUplink, Normalizer, NormalizerConfig};
pub use vendor::identify;

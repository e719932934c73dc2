//! LoRaWAN 上行报文领域模型：报文信封、指标观测、设备标签与指标输出接口。

pub mod data;
pub mod device;
pub mod sink;
pub mod vendor;

pub use data::{DeliveryError, DeviceInfo, GeoPoint, MetricObservation, ReceptionReport, UplinkEnvelope};
pub use device::{DeviceLabels, DeviceRecord};
pub use sink::{DeviceCounter, DeviceGauge, ExporterCounter, ForwardCounter, LabelSet, MetricsSink};
pub use vendor::VendorKey;

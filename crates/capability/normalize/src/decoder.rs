use crate::error::NormalizeError;
use crate::vendors::{dragino, milesight, rejee, sensecap};
use domain::{MetricObservation, UplinkEnvelope, VendorKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// 单个厂商解码后的观测批次。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    pub observations: Vec<MetricObservation>,
    pub needs_raw_dump: bool,
}

impl DecodedBatch {
    pub fn new(observations: Vec<MetricObservation>) -> Self {
        Self {
            observations,
            needs_raw_dump: false,
        }
    }
}

/// 厂商载荷解码器抽象。
pub trait VendorDecoder: Send + Sync {
    /// 厂商名称（用于日志与错误）。
    fn vendor(&self) -> &'static str;

    fn decode(&self, envelope: &UplinkEnvelope) -> Result<DecodedBatch, NormalizeError>;

    /// 是否对该厂商的批次做经纬度关联。
    fn geo_tagging(&self) -> bool {
        false
    }
}

/// 按厂商键分发的解码器表。
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: HashMap<VendorKey, Arc<dyn VendorDecoder>>,
}

impl DecoderRegistry {
    /// 空表：所有厂商都视为未知。
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// 内置厂商：SenseCAP、Dragino、Rejee、Milesight。
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(VendorKey::new(sensecap::OUI), Arc::new(sensecap::SenseCapDecoder));
        registry.register(VendorKey::new(dragino::OUI), Arc::new(dragino::DraginoDecoder));
        registry.register(VendorKey::new(rejee::OUI), Arc::new(rejee::RejeeDecoder));
        registry.register(VendorKey::new(milesight::OUI), Arc::new(milesight::MilesightDecoder));
        registry
    }

    pub fn register(&mut self, key: VendorKey, decoder: Arc<dyn VendorDecoder>) {
        self.decoders.insert(key, decoder);
    }

    pub fn get(&self, key: &VendorKey) -> Option<&dyn VendorDecoder> {
        self.decoders.get(key).map(|decoder| &**decoder)
    }

    pub fn vendor_name(&self, key: &VendorKey) -> Option<&'static str> {
        self.get(key).map(|decoder| decoder.vendor())
    }

    /// 分发到对应厂商解码器；未知厂商不产生观测，并要求转储原始报文。
    pub fn decode(
        &self,
        envelope: &UplinkEnvelope,
        key: &VendorKey,
    ) -> Result<DecodedBatch, NormalizeError> {
        match self.get(key) {
            Some(decoder) => decoder.decode(envelope).inspect_err(|err| {
                warn!(
                    target: "lora.normalize",
                    dev_eui = %envelope.dev_eui(),
                    vendor = decoder.vendor(),
                    error = %err,
                    "vendor_decode_failed"
                );
            }),
            None => {
                warn!(
                    target: "lora.normalize",
                    dev_eui = %envelope.dev_eui(),
                    oui = %key,
                    "unsupported_vendor"
                );
                Ok(DecodedBatch {
                    observations: Vec::new(),
                    needs_raw_dump: true,
                })
            }
        }
    }

    pub fn geo_tagging(&self, key: &VendorKey) -> bool {
        self.get(key).is_some_and(|decoder| decoder.geo_tagging())
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

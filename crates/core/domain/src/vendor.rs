use std::fmt;

/// 厂商键：设备 EUI 的前 3 字节（OUI），格式 `xx:xx:xx`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VendorKey(String);

impl VendorKey {
    /// 无法识别时使用的零值键，始终解析为未知厂商。
    pub const ZERO: &'static str = "00:00:00";

    pub fn new(oui: impl Into<String>) -> Self {
        Self(oui.into())
    }

    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VendorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

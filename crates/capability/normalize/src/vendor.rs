use domain::VendorKey;

/// 由设备 EUI 推导厂商键（OUI），格式 `xx:xx:xx`，小写。
///
/// 不足 6 个字符（或前缀含非 ASCII 字符）时返回 `00:00:00`。
pub fn identify(dev_eui: &str) -> VendorKey {
    match dev_eui.get(..6).filter(|prefix| prefix.is_ascii()) {
        Some(prefix) => {
            let prefix = prefix.to_ascii_lowercase();
            VendorKey::new(format!("{}:{}:{}", &prefix[0..2], &prefix[2..4], &prefix[4..6]))
        }
        None => VendorKey::zero(),
    }
}

use crate::crc::CRC16;
use pretty_env_logger::formatted_builder;

/// Number of nanotons in one ton
pub const NANO_PER_TON: u128 = 1_000_000_000;

pub fn init_logger() -> Result<(), log::SetLoggerError> {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else {
        builder.parse_filters("info");
    }

    builder.try_init()
}

/// Numeric id of a get-method, as used by `runGetMethod`
pub fn method_name_to_id(name: &str) -> u32 {
    let method_value = CRC16.checksum(name.as_bytes()) as u32;
    (method_value & 0xFFFF) | 0x10000
}

/// Converts a decimal ton amount such as `"1.5"` to nanotons
pub fn to_nano(amount: &str) -> anyhow::Result<u128> {
    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && fraction.is_empty() {
        anyhow::bail!("empty amount");
    }
    if fraction.len() > 9 {
        anyhow::bail!("amount {} has more than 9 decimal places", amount);
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        anyhow::bail!("invalid amount {}", amount);
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse()? };
    let fraction: u128 = format!("{:0<9}", fraction).parse()?;
    whole
        .checked_mul(NANO_PER_TON)
        .and_then(|n| n.checked_add(fraction))
        .ok_or_else(|| anyhow::anyhow!("amount {} is too large", amount))
}

/// Formats nanotons as a decimal ton amount without trailing zeros
pub fn from_nano(amount: u128) -> String {
    let whole = amount / NANO_PER_TON;
    let fraction = amount % NANO_PER_TON;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:09}", fraction);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// NVMe data units are reported in thousands of 512-byte sectors.
pub const DATA_UNIT_BYTES: u128 = 512_000;

const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Renders a byte count on the decimal (1000-based) unit ladder. Exact
/// integer below 1000 bytes, 3 significant digits above; values past the
/// YB rung stay at YB scale.
pub fn format_bytes(value: u128) -> String {
    let mut divisor = 1_u128;
    let mut unit = 0_usize;
    while unit < UNITS.len() - 1 && value >= divisor * 1000 {
        divisor *= 1000;
        unit += 1;
    }

    if unit == 0 {
        return format!("{} B", value);
    }

    let scaled = value as f64 / divisor as f64;
    let decimals = if scaled < 10.0 {
        2
    } else if scaled < 100.0 {
        1
    } else {
        0
    };
    format!("{:.*} {}", decimals, scaled, UNITS[unit])
}

const UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Human readable byte size, truncated to one decimal: `1.5 kB`, `512.0 B`
pub fn format_byte_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    while value > 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let value = (value * 10.0).trunc() / 10.0;

    format!("{:.1} {}", value, UNITS[unit])
}

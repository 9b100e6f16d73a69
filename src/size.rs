//! Conversion between listing size strings and byte counts.
//!
//! Parsing is permissive: listings are not under our control, so anything
//! that does not look like a size becomes `0` instead of an error.

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Parse a size such as `512B`, `1.5K`, `2.0MiB` or `3GB` into bytes.
pub fn parse(text: &str) -> u64 {
    let cleaned: String = text.trim().chars().filter(|c| !matches!(c, 'i' | 'I')).collect();
    let mut value = cleaned.trim();

    if let Some(stripped) = value.strip_suffix(['B', 'b']) {
        value = stripped.trim_end();
    }

    let Some(last) = value.chars().last() else {
        return 0;
    };

    let (number, multiplier) = match unit_multiplier(last) {
        Some(multiplier) => (value[..value.len() - last.len_utf8()].trim(), multiplier),
        None => (value, 1u64),
    };

    match number.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => (n * multiplier as f64) as u64,
        _ => 0,
    }
}

/// Render bytes with binary units and two decimals, capped at TiB.
pub fn format(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in &UNITS[..UNITS.len() - 1] {
        if value < 1024.0 {
            return format!("{value:.2}{unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2}{}", UNITS[UNITS.len() - 1])
}

fn unit_multiplier(unit: char) -> Option<u64> {
    match unit.to_ascii_uppercase() {
        'K' => Some(1 << 10),
        'M' => Some(1 << 20),
        'G' => Some(1 << 30),
        'T' => Some(1 << 40),
        _ => None,
    }
}

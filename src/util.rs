//! Shared utility functions for the Prepress application.

const BYTES_PER_KB: f64 = 1024.0;

/// Format a byte count the way the funnel shows file sizes,
/// e.g. `1536` becomes `"1.5 KB"` and `0` becomes `"0 Bytes"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / BYTES_PER_KB.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / BYTES_PER_KB.powi(exponent as i32);

    // Two decimals max, trailing zeros dropped (1.5 KB, not 1.50 KB)
    let rounded = format!("{:.2}", value);
    let rounded = rounded.trim_end_matches('0').trim_end_matches('.');

    format!("{} {}", rounded, UNITS[exponent])
}

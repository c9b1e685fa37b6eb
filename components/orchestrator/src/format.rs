//! Human-readable numbers for reports

/// Milliseconds with an automatic unit
///
/// ```
/// use orchestrator::format_time;
///
/// assert_eq!(format_time(1500.0), "1.50s");
/// assert_eq!(format_time(0.0042), "4.20µs");
/// ```
pub fn format_time(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else if ms >= 1.0 {
        format!("{:.2}ms", ms)
    } else if ms >= 0.001 {
        format!("{:.2}µs", ms * 1000.0)
    } else {
        format!("{:.2}ns", ms * 1_000_000.0)
    }
}

/// Integer with thousands separators
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Integer abbreviated to `k`/`M`
pub fn format_count_short(value: u64) -> String {
    if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1000 {
        format!("{:.1}k", value as f64 / 1000.0)
    } else {
        value.to_string()
    }
}

/// Operations per second, rounded, with separators
pub fn format_ops(ops: f64) -> String {
    if !ops.is_finite() || ops < 0.0 {
        return "-".to_string();
    }
    format_count(ops.round() as u64)
}

/// Relative margin as `±x.xx%`
pub fn format_margin(margin: f64) -> String {
    format!("±{:.2}%", margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_units() {
        assert_eq!(format_time(2.0), "2.00ms");
        assert_eq!(format_time(0.0000005), "0.50ns");
    }

    #[test]
    fn test_counts() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count_short(1500), "1.5k");
        assert_eq!(format_count_short(2_500_000), "2.5M");
    }

    #[test]
    fn test_ops_and_margin() {
        assert_eq!(format_ops(12345.6), "12,346");
        assert_eq!(format_ops(f64::INFINITY), "-");
        assert_eq!(format_margin(1.234), "±1.23%");
    }
}

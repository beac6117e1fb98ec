//! Value parsers for numeric CLI arguments.
//!
//! These only reject values that can never be valid. Limits that come from
//! the configuration (clip duration bounds) are checked by the commands.

fn parse_seconds(s: &str, name: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if !value.is_finite() {
        return Err(format!("{name} must be a finite number of seconds, got {value}"));
    }
    Ok(value)
}

/// Segment start offset in seconds, zero or later.
pub fn parse_start(s: &str) -> Result<f64, String> {
    let value = parse_seconds(s, "start")?;
    if value < 0.0 {
        return Err(format!("start must not be negative, got {value}"));
    }
    Ok(value)
}

/// Window or segment length in seconds, strictly positive.
pub fn parse_length(s: &str) -> Result<f64, String> {
    let value = parse_seconds(s, "length")?;
    if value <= 0.0 {
        return Err(format!("length must be positive, got {value}"));
    }
    Ok(value)
}

/// Per-species recording count, at least one.
pub fn parse_count(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("count must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{s}' is not a valid count")),
    }
}

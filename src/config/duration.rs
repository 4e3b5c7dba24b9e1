// src/config/duration.rs

use std::time::Duration;

/// Parse durations such as `"250ms"`, `"3s"`, `"1m"` or `"2h"`.
///
/// A bare number without a unit is rejected, as is zero.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;
    let unit = unit_part.trim().to_lowercase();

    let duration = match unit.as_str() {
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        "h" => Duration::from_secs(value.saturating_mul(60 * 60)),
        _ => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ));
        }
    };

    if duration.is_zero() {
        return Err(format!("duration '{s}' must be greater than zero"));
    }

    Ok(duration)
}
